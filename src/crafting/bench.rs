use bevy::prelude::*;
use crate::shared::*;

use super::recipe::{matches_recipe, CRAFTED_ITEM_TYPE};

// ──────────────────────────────────────────────────────────────────────────────
// RESOURCES & EVENTS
// ──────────────────────────────────────────────────────────────────────────────

/// Output the grid currently makes. Always derived from the grid and the
/// texture registry, never edited directly.
#[derive(Resource, Debug, Clone, Default, PartialEq, Eq)]
pub struct CraftingResult {
    pub result: Option<ItemId>,
}

impl CraftingResult {
    pub fn available(&self) -> bool {
        self.result.is_some()
    }

    /// The stack shown in the result slot. Crafts are always one unit.
    pub fn result_stack(&self) -> Option<ItemStack> {
        self.result
            .as_ref()
            .map(|id| ItemStack::new(id.clone(), CRAFTED_ITEM_TYPE, 1))
    }
}

/// Send to open the crafting bench (transitions to GameState::Crafting).
#[derive(Event, Debug, Clone)]
pub struct OpenCraftingEvent;

/// Send to close the crafting bench and return to Playing.
#[derive(Event, Debug, Clone)]
pub struct CloseCraftingEvent;

/// Fired after the player takes a crafted item into the cursor.
#[derive(Event, Debug, Clone, PartialEq)]
pub struct ItemCraftedEvent {
    pub item_id: ItemId,
}

// ──────────────────────────────────────────────────────────────────────────────
// SYSTEMS
// ──────────────────────────────────────────────────────────────────────────────

/// Runs in Playing: listens for OpenCraftingEvent and transitions to Crafting.
pub fn handle_open_crafting(
    mut events: EventReader<OpenCraftingEvent>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    if events.read().next().is_some() {
        info!("[Crafting] Opening crafting bench");
        next_state.set(GameState::Crafting);
    }
}

/// Runs in Crafting: listens for CloseCraftingEvent and returns to Playing.
pub fn handle_close_crafting(
    mut events: EventReader<CloseCraftingEvent>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    if events.read().next().is_some() {
        info!("[Crafting] Closing crafting bench");
        next_state.set(GameState::Playing);
    }
}

/// Re-runs the recognizer after any grid mutation or texture load.
pub fn evaluate_recipe(
    mut changes: EventReader<SlotChangedEvent>,
    containers: Res<SlotContainers>,
    textures: Res<TextureRegistry>,
    mut crafting: ResMut<CraftingResult>,
) {
    let grid_touched = changes
        .read()
        .fold(false, |hit, ev| hit || ev.slot.container == ContainerKey::CraftingGrid);
    if !grid_touched && !textures.is_changed() {
        return;
    }
    let result = matches_recipe(containers.get(ContainerKey::CraftingGrid), &textures);
    if crafting.result != result {
        debug!("[Crafting] Recipe result is now {:?}", result);
        crafting.result = result;
    }
}

/// Runs in Crafting: keeps the result slot showing the current output.
pub fn render_result_slot(
    crafting: Res<CraftingResult>,
    mut containers: ResMut<SlotContainers>,
    mut slot_events: EventWriter<SlotChangedEvent>,
) {
    let slot = SlotRef::new(ContainerKey::CraftingResult, 0);
    let wanted = crafting.result_stack();
    if containers.stack(slot) == wanted.as_ref() {
        return;
    }
    containers
        .get_mut(ContainerKey::CraftingResult)
        .set(0, wanted.clone());
    slot_events.send(SlotChangedEvent { slot, stack: wanted });
}

/// OnExit(Crafting): the result visual goes away, grid contents persist.
pub fn clear_result_slot(
    mut containers: ResMut<SlotContainers>,
    mut slot_events: EventWriter<SlotChangedEvent>,
) {
    let result = containers.get_mut(ContainerKey::CraftingResult);
    for index in result.clear() {
        slot_events.send(SlotChangedEvent {
            slot: SlotRef::new(ContainerKey::CraftingResult, index),
            stack: None,
        });
    }
}

/// Runs in Crafting, after this frame's grid edits: a primary click on the
/// result slot with an empty cursor takes the crafted item and consumes the
/// entire grid. The grid is re-checked here since `CraftingResult` only
/// catches up in `SlotSystems::React`.
pub fn handle_result_pickup(
    mut clicks: EventReader<SlotClickEvent>,
    textures: Res<TextureRegistry>,
    mut crafting: ResMut<CraftingResult>,
    mut containers: ResMut<SlotContainers>,
    mut held: ResMut<HeldItem>,
    mut slot_events: EventWriter<SlotChangedEvent>,
    mut held_events: EventWriter<HeldItemChangedEvent>,
    mut crafted_events: EventWriter<ItemCraftedEvent>,
) {
    for click in clicks.read() {
        if click.slot.container != ContainerKey::CraftingResult {
            continue;
        }
        if click.button != PointerButton::Primary || !held.is_empty() {
            debug!("[Crafting] Result pickup needs a primary click and an empty hand");
            continue;
        }
        let Some(item_id) = matches_recipe(containers.get(ContainerKey::CraftingGrid), &textures)
        else {
            debug!("[Crafting] Grid no longer makes anything, pickup ignored");
            continue;
        };

        held.replace(Some(ItemStack::new(item_id.clone(), CRAFTED_ITEM_TYPE, 1)));
        crafting.result = None;

        for index in containers.get_mut(ContainerKey::CraftingGrid).clear() {
            slot_events.send(SlotChangedEvent {
                slot: SlotRef::new(ContainerKey::CraftingGrid, index),
                stack: None,
            });
        }
        containers.get_mut(ContainerKey::CraftingResult).clear();
        slot_events.send(SlotChangedEvent {
            slot: SlotRef::new(ContainerKey::CraftingResult, 0),
            stack: None,
        });
        held_events.send(HeldItemChangedEvent {
            stack: held.stack().cloned(),
        });

        info!("[Crafting] Crafted {}", item_id);
        crafted_events.send(ItemCraftedEvent { item_id });
    }
}
