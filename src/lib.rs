//! Harvest inventory: the item-management subsystem of a 2D game.
//!
//! Slot containers, the held-item cursor and its click protocol, a 3×3
//! crafting bench and an NPC trade escrow, all driven by events from the
//! host's rendering engine. The host owns the window, input and drawing;
//! this crate owns the data model and the rules.

pub mod shared;
pub mod config;
pub mod inventory;
pub mod crafting;
pub mod trade;
pub mod data;

use bevy::prelude::*;

use shared::*;

/// Everything the subsystem needs, registered in one go.
///
/// The host must already provide bevy's state machinery (`DefaultPlugins`,
/// or `MinimalPlugins` plus `StatesPlugin` when headless).
pub struct ItemManagementPlugin;

impl Plugin for ItemManagementPlugin {
    fn build(&self, app: &mut App) {
        app.init_state::<GameState>()
            // Domain plugins
            .add_plugins(inventory::InventoryPlugin)
            .add_plugins(crafting::CraftingPlugin)
            .add_plugins(trade::TradePlugin)
            // Data loading
            .add_plugins(data::DataPlugin);
    }
}
