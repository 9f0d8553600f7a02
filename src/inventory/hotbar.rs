use bevy::prelude::*;
use crate::shared::*;

/// Index of the hotbar slot the player has "in hand" for gameplay.
#[derive(Resource, Debug, Clone, Default)]
pub struct HotbarSelection {
    pub active: usize,
}

/// The stack in the active hotbar slot, if any.
pub fn get_selected_item<'a>(
    containers: &'a SlotContainers,
    selection: &HotbarSelection,
) -> Option<&'a ItemStack> {
    containers.get(ContainerKey::Hotbar).get(selection.active)
}

/// Moves the active hotbar index and announces the newly equipped stack.
pub fn handle_select_hotbar_slot(
    mut events: EventReader<SelectHotbarSlotEvent>,
    mut selection: ResMut<HotbarSelection>,
    containers: Res<SlotContainers>,
    mut selected_events: EventWriter<SlotSelectedEvent>,
) {
    for ev in events.read() {
        if ev.index >= HOTBAR_SLOTS {
            warn!("[Inventory] Hotbar index {} out of range, ignoring", ev.index);
            continue;
        }
        if ev.index == selection.active {
            continue;
        }
        selection.active = ev.index;
        let stack = get_selected_item(&containers, &selection).cloned();
        debug!("[Inventory] Hotbar slot {} selected ({:?})", ev.index, stack);
        selected_events.send(SlotSelectedEvent {
            index: ev.index,
            stack,
        });
    }
}

/// Re-announces the equipped stack whenever the active hotbar slot's
/// contents change, whatever changed them.
pub fn notify_active_slot_changes(
    mut changes: EventReader<SlotChangedEvent>,
    selection: Res<HotbarSelection>,
    containers: Res<SlotContainers>,
    mut last_active: Local<usize>,
    mut selected_events: EventWriter<SlotSelectedEvent>,
) {
    let active = SlotRef::new(ContainerKey::Hotbar, selection.active);
    let touched = changes.read().fold(false, |hit, ev| hit || ev.slot == active);
    // A new index was already announced, with its current contents.
    let reselected = *last_active != selection.active;
    *last_active = selection.active;
    if touched && !reselected {
        selected_events.send(SlotSelectedEvent {
            index: selection.active,
            stack: get_selected_item(&containers, &selection).cloned(),
        });
    }
}
