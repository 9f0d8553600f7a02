//! Data layer: populates the registries at startup.
//!
//! This plugin runs in OnEnter(GameState::Loading), fills TextureRegistry
//! and TraderRegistry from the hard-coded data in the submodules, then
//! transitions the game into GameState::Playing.
//!
//! Population only inserts, so a host that registered its own textures or
//! traders beforehand keeps them.

mod textures;
mod traders;

use bevy::prelude::*;
use crate::shared::*;

pub use textures::populate_textures;
pub use traders::populate_traders;

pub struct DataPlugin;

impl Plugin for DataPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<TextureRegistry>()
            .init_resource::<TraderRegistry>()
            .add_systems(OnEnter(GameState::Loading), load_all_data);
    }
}

fn load_all_data(
    mut textures: ResMut<TextureRegistry>,
    mut traders: ResMut<TraderRegistry>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    info!("[Data] Populating registries…");

    populate_textures(&mut textures);
    info!("[Data]   Textures loaded: {}", textures.len());

    populate_traders(&mut traders);
    info!("[Data]   Traders loaded: {}", traders.traders.len());

    next_state.set(GameState::Playing);
}
