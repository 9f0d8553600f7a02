//! Inventory domain: slot containers, the held-item cursor, the click
//! protocol, double-click collection, hotbar selection and external item
//! injection.
//!
//! Pointer events arrive as `SlotClickEvent`s from the rendering engine;
//! every mutation is announced with `SlotChangedEvent` /
//! `HeldItemChangedEvent` so the renderer can redraw.

use bevy::prelude::*;
use crate::config::InventoryConfig;
use crate::shared::*;

pub mod double_click;
pub mod hotbar;
pub mod protocol;

pub use double_click::DoubleClickTracker;
pub use hotbar::{get_selected_item, HotbarSelection};
pub use protocol::{apply, collect_same, decide, handle_click, ClickAction, ClickReport};

// ─────────────────────────────────────────────────────────────────────────────
// Plugin
// ─────────────────────────────────────────────────────────────────────────────

pub struct InventoryPlugin;

impl Plugin for InventoryPlugin {
    fn build(&self, app: &mut App) {
        // ── Resources ──────────────────────────────────────────────────────
        app.init_resource::<InventoryConfig>()
            .init_resource::<SlotContainers>()
            .init_resource::<HeldItem>()
            .init_resource::<ContainerLocks>()
            .init_resource::<DoubleClickTracker>()
            .init_resource::<HotbarSelection>()
            .init_resource::<TextureRegistry>();

        // ── Events ─────────────────────────────────────────────────────────
        app.add_event::<SlotClickEvent>()
            .add_event::<SlotChangedEvent>()
            .add_event::<HeldItemChangedEvent>()
            .add_event::<SlotSelectedEvent>()
            .add_event::<SelectHotbarSlotEvent>()
            .add_event::<AddItemEvent>()
            .add_event::<StowHeldItemEvent>()
            .add_event::<ToastEvent>();

        app.configure_sets(Update, (SlotSystems::Interact, SlotSystems::React).chain());

        app.add_systems(
            Update,
            (
                // External injection lands before this frame's clicks.
                apply_add_item_events,
                handle_slot_clicks,
                stow_held_item,
                hotbar::handle_select_hotbar_slot,
            )
                .chain()
                .in_set(SlotSystems::Interact),
        );
        app.add_systems(
            Update,
            hotbar::notify_active_slot_changes.in_set(SlotSystems::React),
        );
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Systems
// ─────────────────────────────────────────────────────────────────────────────

/// Routes pointer clicks through the interaction protocol. Clicks on
/// containers that never accept the protocol, or that are locked right
/// now, are dropped.
pub fn handle_slot_clicks(
    mut clicks: EventReader<SlotClickEvent>,
    config: Res<InventoryConfig>,
    locks: Res<ContainerLocks>,
    mut containers: ResMut<SlotContainers>,
    mut held: ResMut<HeldItem>,
    mut tracker: ResMut<DoubleClickTracker>,
    mut slot_events: EventWriter<SlotChangedEvent>,
    mut held_events: EventWriter<HeldItemChangedEvent>,
) {
    for click in clicks.read() {
        let key = click.slot.container;
        if !key.accepts_protocol() {
            continue;
        }
        if locks.is_locked(key) {
            debug!("[Inventory] {} is locked, click ignored", click.slot);
            continue;
        }

        let report = handle_click(
            &mut containers,
            &mut held,
            &mut tracker,
            click.slot,
            click.button,
            click.time,
            config.double_click_window(),
        );

        if report.double_click {
            debug!("[Inventory] Collected matching stacks into {}", click.slot);
        } else if let Some(action) = report.action {
            debug!("[Inventory] {:?} on {}", action, click.slot);
        }

        for slot in &report.changed {
            slot_events.send(slot_changed(&containers, *slot));
        }
        if report.held_changed {
            held_events.send(HeldItemChangedEvent {
                stack: held.stack().cloned(),
            });
        }
    }
}

/// Applies `AddItemEvent`s from purchase, reward and mint flows.
pub fn apply_add_item_events(
    mut events: EventReader<AddItemEvent>,
    mut containers: ResMut<SlotContainers>,
    mut slot_events: EventWriter<SlotChangedEvent>,
) {
    for ev in events.read() {
        if ev.index >= ev.container.capacity() {
            warn!(
                "[Inventory] AddItem for {}[{}] is out of range (capacity {})",
                ev.container,
                ev.index,
                ev.container.capacity()
            );
            continue;
        }
        let stack = containers.add_item(ev.container, ev.index, &ev.item_id, &ev.item_type, ev.count);
        let slot = SlotRef::new(ev.container, ev.index);
        match &stack {
            Some(s) => info!("[Inventory] {} set to {}", slot, s),
            None => info!("[Inventory] {} cleared", slot),
        }
        slot_events.send(SlotChangedEvent { slot, stack });
    }
}

/// Puts the held stack into the first empty backpack slot. With a full
/// backpack the stack stays in hand and the player is told.
pub fn stow_held_item(
    mut events: EventReader<StowHeldItemEvent>,
    config: Res<InventoryConfig>,
    mut containers: ResMut<SlotContainers>,
    mut held: ResMut<HeldItem>,
    mut slot_events: EventWriter<SlotChangedEvent>,
    mut held_events: EventWriter<HeldItemChangedEvent>,
    mut toast_events: EventWriter<ToastEvent>,
) {
    for _ in events.read() {
        let Some(stack) = held.take() else {
            continue;
        };
        let backpack = containers.get_mut(ContainerKey::Backpack);
        match backpack.insert_first_empty(stack) {
            InsertResult::Inserted { index } => {
                let slot = SlotRef::new(ContainerKey::Backpack, index);
                slot_events.send(slot_changed(&containers, slot));
                held_events.send(HeldItemChangedEvent { stack: None });
            }
            InsertResult::Overflow(stack) => {
                warn!("[Inventory] Backpack full, keeping {} in hand", stack);
                held.replace(Some(stack));
                toast_events.send(ToastEvent {
                    message: "Backpack is full!".to_string(),
                    duration_secs: config.toast_secs,
                });
            }
        }
    }
}
