//! Crafting bench: a 3×3 grid, a single shaped recipe and a one-slot
//! result that consumes the whole grid when taken.

use bevy::prelude::*;
use crate::shared::*;

mod bench;
pub mod recipe;

pub use bench::{
    CloseCraftingEvent, CraftingResult, ItemCraftedEvent, OpenCraftingEvent,
};
pub use recipe::{matches_recipe, CRAFTED_ITEM_TYPE, PLUS_PATTERN, RESULT_PREFERENCE};

pub struct CraftingPlugin;

impl Plugin for CraftingPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<CraftingResult>()
            .add_event::<OpenCraftingEvent>()
            .add_event::<CloseCraftingEvent>()
            .add_event::<ItemCraftedEvent>()
            // Playing state systems
            .add_systems(
                Update,
                bench::handle_open_crafting.run_if(in_state(GameState::Playing)),
            )
            // Crafting state systems
            .add_systems(
                Update,
                (
                    bench::handle_close_crafting,
                    bench::handle_result_pickup.after(crate::inventory::handle_slot_clicks),
                )
                    .in_set(SlotSystems::Interact)
                    .run_if(in_state(GameState::Crafting)),
            )
            // The grid persists outside the bench, so the recognizer always runs.
            .add_systems(
                Update,
                (
                    bench::evaluate_recipe,
                    bench::render_result_slot.run_if(in_state(GameState::Crafting)),
                )
                    .chain()
                    .in_set(SlotSystems::React),
            )
            .add_systems(OnExit(GameState::Crafting), bench::clear_result_slot);
    }
}
