//! The interaction protocol: what a click does, given the button, the
//! cursor, and the target slot.
//!
//! | Cursor      | Target         | Primary     | Secondary    |
//! |-------------|----------------|-------------|--------------|
//! | empty       | stack          | PickUpAll   | PickUpHalf   |
//! | stack       | empty          | PlaceAll    | PlaceOne     |
//! | stack       | same item      | Merge       | SplitMerge   |
//! | stack       | other item     | Swap        | Noop         |
//!
//! Same-item targets already at `MAX_STACK_SIZE` are a `Noop` for both
//! buttons. A primary double-click on a slot runs `collect_same` instead.

use std::time::Duration;

use crate::shared::*;
use super::double_click::{ClickUndo, DoubleClickTracker};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClickAction {
    Noop,
    PickUpAll,
    PickUpHalf,
    PlaceAll,
    PlaceOne,
    Merge,
    SplitMerge,
    Swap,
}

/// Picks the action for a single click. Total over its inputs.
pub fn decide(
    button: PointerButton,
    held: Option<&ItemStack>,
    target: Option<&ItemStack>,
) -> ClickAction {
    use PointerButton::{Primary, Secondary};

    match (button, held, target) {
        (_, None, None) => ClickAction::Noop,
        (Primary, None, Some(_)) => ClickAction::PickUpAll,
        (Secondary, None, Some(_)) => ClickAction::PickUpHalf,
        (Primary, Some(_), None) => ClickAction::PlaceAll,
        (Secondary, Some(_), None) => ClickAction::PlaceOne,
        (_, Some(h), Some(t)) if h.same_item(t) && t.is_full() => ClickAction::Noop,
        (Primary, Some(h), Some(t)) if h.same_item(t) => ClickAction::Merge,
        (Secondary, Some(h), Some(t)) if h.same_item(t) => ClickAction::SplitMerge,
        (Primary, Some(_), Some(_)) => ClickAction::Swap,
        (Secondary, Some(_), Some(_)) => ClickAction::Noop,
    }
}

/// Applies `action` to one slot and the cursor. Returns false for a no-op.
///
/// `action` must come from `decide` on the same slot and cursor; a
/// mismatched action degrades to a no-op rather than breaking invariants.
pub fn apply(action: ClickAction, slot: &mut Option<ItemStack>, held: &mut HeldItem) -> bool {
    match action {
        ClickAction::Noop => false,
        ClickAction::PickUpAll => {
            if !held.is_empty() || slot.is_none() {
                return false;
            }
            held.replace(slot.take());
            true
        }
        ClickAction::PickUpHalf => {
            if !held.is_empty() {
                return false;
            }
            let Some(stack) = slot.as_mut() else {
                return false;
            };
            let half = stack.count.div_ceil(2);
            let picked = if half >= stack.count {
                slot.take()
            } else {
                Some(stack.split_off(half))
            };
            held.replace(picked);
            true
        }
        ClickAction::PlaceAll => {
            if slot.is_some() || held.is_empty() {
                return false;
            }
            *slot = held.take();
            true
        }
        ClickAction::PlaceOne => {
            if slot.is_some() {
                return false;
            }
            match held.take_units(1) {
                Some(unit) => {
                    *slot = Some(unit);
                    true
                }
                None => false,
            }
        }
        ClickAction::Merge => {
            let (Some(target), Some(hand)) = (slot.as_mut(), held.stack()) else {
                return false;
            };
            if !target.same_item(hand) {
                return false;
            }
            let moved = hand.count.min(target.room());
            if moved == 0 {
                return false;
            }
            target.count += moved;
            held.take_units(moved);
            true
        }
        ClickAction::SplitMerge => {
            let (Some(target), Some(hand)) = (slot.as_mut(), held.stack()) else {
                return false;
            };
            if !target.same_item(hand) || target.is_full() {
                return false;
            }
            target.count += 1;
            held.take_units(1);
            true
        }
        ClickAction::Swap => {
            if slot.is_none() || held.is_empty() {
                return false;
            }
            let previous = slot.take();
            *slot = held.replace(previous);
            true
        }
    }
}

/// Pulls every other stack of the target's item in the same container into
/// the target, in slot order, until the target is full. Returns the indices
/// that changed (target last), or nothing when the target is empty.
pub fn collect_same(container: &mut SlotContainer, target: usize) -> Vec<usize> {
    let Some(item_id) = container.get(target).map(|s| s.item_id.clone()) else {
        return Vec::new();
    };

    let mut changed = Vec::new();
    for index in 0..container.capacity() {
        if index == target {
            continue;
        }
        let room = container.get(target).map_or(0, ItemStack::room);
        if room == 0 {
            break;
        }

        let source = container.get_mut(index);
        let moved = match source.as_mut() {
            Some(stack) if stack.item_id == item_id => {
                let moved = room.min(stack.count);
                stack.count -= moved;
                moved
            }
            _ => continue,
        };
        if source.as_ref().is_some_and(|s| s.count == 0) {
            *source = None;
        }
        if let Some(dest) = container.get_mut(target).as_mut() {
            dest.count += moved;
        }
        changed.push(index);
    }

    if !changed.is_empty() {
        changed.push(target);
    }
    changed
}

/// What a click did, for the caller to turn into redraw notifications.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClickReport {
    pub action: Option<ClickAction>,
    pub double_click: bool,
    pub changed: Vec<SlotRef>,
    pub held_changed: bool,
}

/// Runs one pointer click through the double-click detector and the
/// decision table.
///
/// The first click of a double-click pair executes immediately. When the
/// second click lands inside the window, the first click is reverted (only
/// if the slot and cursor are exactly as it left them) and collect-same
/// runs on the slot instead.
pub fn handle_click(
    containers: &mut SlotContainers,
    held: &mut HeldItem,
    tracker: &mut DoubleClickTracker,
    slot: SlotRef,
    button: PointerButton,
    time: Duration,
    window: Duration,
) -> ClickReport {
    let mut report = ClickReport::default();

    if button == PointerButton::Primary {
        if let Some(first) = tracker.complete(slot, time, window) {
            report.double_click = true;
            let container = containers.get_mut(slot.container);
            if let Some(undo) = first.undo {
                if undo.still_applies(container.get(slot.index), held.stack()) {
                    container.set(slot.index, undo.slot_before);
                    held.replace(undo.held_before);
                    report.changed.push(slot);
                    report.held_changed = true;
                }
            }
            for index in collect_same(container, slot.index) {
                let changed = SlotRef::new(slot.container, index);
                if !report.changed.contains(&changed) {
                    report.changed.push(changed);
                }
            }
            return report;
        }
    } else {
        tracker.reset(slot.container);
    }

    let container = containers.get_mut(slot.container);
    let slot_before = container.get(slot.index).cloned();
    let held_before = held.stack().cloned();

    let action = decide(button, held.stack(), slot_before.as_ref());
    let changed = apply(action, container.get_mut(slot.index), held);
    report.action = Some(action);

    let undo = changed.then(|| ClickUndo {
        slot_before,
        held_before,
        slot_after: container.get(slot.index).cloned(),
        held_after: held.stack().cloned(),
    });
    if changed {
        report.changed.push(slot);
        report.held_changed = true;
    }
    if button == PointerButton::Primary {
        tracker.record(slot, time, undo);
    }
    report
}
