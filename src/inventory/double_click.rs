use bevy::prelude::*;
use std::collections::HashMap;
use std::time::Duration;

use crate::shared::*;

/// Enough state to revert a single click's effect on one slot and the cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClickUndo {
    pub slot_before: Option<ItemStack>,
    pub held_before: Option<ItemStack>,
    pub slot_after: Option<ItemStack>,
    pub held_after: Option<ItemStack>,
}

impl ClickUndo {
    /// True when neither location has been touched since the click.
    pub fn still_applies(&self, slot: Option<&ItemStack>, held: Option<&ItemStack>) -> bool {
        slot == self.slot_after.as_ref() && held == self.held_after.as_ref()
    }
}

#[derive(Debug, Clone)]
pub struct PendingClick {
    pub index: usize,
    pub at: Duration,
    pub undo: Option<ClickUndo>,
}

/// Last primary click per container, used to pair clicks into double-clicks.
#[derive(Resource, Debug, Clone, Default)]
pub struct DoubleClickTracker {
    last: HashMap<ContainerKey, PendingClick>,
}

impl DoubleClickTracker {
    /// If a primary click on `slot` at `at` completes a double-click, the
    /// first click of the pair is consumed and returned.
    pub fn complete(&mut self, slot: SlotRef, at: Duration, window: Duration) -> Option<PendingClick> {
        let pending = self.last.get(&slot.container)?;
        let within = at
            .checked_sub(pending.at)
            .is_some_and(|elapsed| elapsed <= window);
        if pending.index == slot.index && within {
            self.last.remove(&slot.container)
        } else {
            None
        }
    }

    /// Remembers a primary click as the possible first half of a pair.
    pub fn record(&mut self, slot: SlotRef, at: Duration, undo: Option<ClickUndo>) {
        self.last.insert(
            slot.container,
            PendingClick {
                index: slot.index,
                at,
                undo,
            },
        );
    }

    pub fn reset(&mut self, container: ContainerKey) {
        self.last.remove(&container);
    }

    pub fn is_pending(&self, slot: SlotRef) -> bool {
        self.last
            .get(&slot.container)
            .is_some_and(|p| p.index == slot.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_millis(300);

    fn hotbar(index: usize) -> SlotRef {
        SlotRef::new(ContainerKey::Hotbar, index)
    }

    #[test]
    fn test_second_click_inside_window_completes_pair() {
        let mut tracker = DoubleClickTracker::default();
        tracker.record(hotbar(0), Duration::from_millis(1_000), None);
        let pair = tracker.complete(hotbar(0), Duration::from_millis(1_250), WINDOW);
        assert!(pair.is_some());
        assert!(!tracker.is_pending(hotbar(0)), "tracker resets after a double-click");
    }

    #[test]
    fn test_window_boundary_is_inclusive() {
        let mut tracker = DoubleClickTracker::default();
        tracker.record(hotbar(0), Duration::from_millis(1_000), None);
        assert!(tracker
            .complete(hotbar(0), Duration::from_millis(1_300), WINDOW)
            .is_some());
    }

    #[test]
    fn test_expired_window_is_not_a_pair() {
        let mut tracker = DoubleClickTracker::default();
        tracker.record(hotbar(0), Duration::from_millis(1_000), None);
        assert!(tracker
            .complete(hotbar(0), Duration::from_millis(1_301), WINDOW)
            .is_none());
    }

    #[test]
    fn test_different_index_is_not_a_pair() {
        let mut tracker = DoubleClickTracker::default();
        tracker.record(hotbar(0), Duration::from_millis(1_000), None);
        assert!(tracker
            .complete(hotbar(1), Duration::from_millis(1_100), WINDOW)
            .is_none());
    }

    #[test]
    fn test_containers_are_tracked_independently() {
        let mut tracker = DoubleClickTracker::default();
        tracker.record(hotbar(0), Duration::from_millis(1_000), None);
        tracker.record(
            SlotRef::new(ContainerKey::Backpack, 0),
            Duration::from_millis(1_050),
            None,
        );
        assert!(tracker
            .complete(hotbar(0), Duration::from_millis(1_100), WINDOW)
            .is_some());
    }

    #[test]
    fn test_clock_going_backwards_is_not_a_pair() {
        let mut tracker = DoubleClickTracker::default();
        tracker.record(hotbar(0), Duration::from_millis(1_000), None);
        assert!(tracker
            .complete(hotbar(0), Duration::from_millis(900), WINDOW)
            .is_none());
    }
}
