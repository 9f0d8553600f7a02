use bevy::prelude::*;
use crate::config::InventoryConfig;
use crate::shared::*;

use super::escrow::EscrowReport;
use super::session::{choose_counter_offer, TradePhase, TradeSession};

// ──────────────────────────────────────────────────────────────────────────────
// EVENTS
// ──────────────────────────────────────────────────────────────────────────────

/// Send to start bartering with an NPC (transitions to GameState::Trading).
#[derive(Event, Debug, Clone)]
pub struct OpenTradeEvent {
    pub npc_id: NpcId,
}

/// The player's lock/unlock button.
#[derive(Event, Debug, Clone)]
pub struct ToggleTradeLockEvent;

/// Send to abandon the trade and close the overlay.
#[derive(Event, Debug, Clone)]
pub struct CancelTradeEvent;

/// Both sides are ready; the UI shows the give/receive summary.
#[derive(Event, Debug, Clone, PartialEq)]
pub struct TradeConfirmPromptEvent {
    pub give: Vec<ItemStack>,
    pub receive: Vec<ItemStack>,
}

/// A trade ended without committing.
#[derive(Event, Debug, Clone, PartialEq)]
pub struct TradeCancelledEvent {
    pub refunded: Vec<ItemStack>,
    /// Stacks that could not be refunded because the backpack was full.
    pub lost: Vec<ItemStack>,
}

// ──────────────────────────────────────────────────────────────────────────────
// SYSTEMS
// ──────────────────────────────────────────────────────────────────────────────

/// Runs in Playing: opens a session with the requested trader.
pub fn handle_open_trade(
    mut events: EventReader<OpenTradeEvent>,
    traders: Res<TraderRegistry>,
    config: Res<InventoryConfig>,
    mut session: ResMut<TradeSession>,
    mut locks: ResMut<ContainerLocks>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    for ev in events.read() {
        if session.phase != TradePhase::Idle {
            warn!("[Trade] A trade is already open, ignoring request for '{}'", ev.npc_id);
            continue;
        }
        let Some(trader) = traders.get(&ev.npc_id) else {
            warn!("[Trade] Unknown trader '{}'", ev.npc_id);
            continue;
        };

        let mut rng = rand::thread_rng();
        let offer = choose_counter_offer(
            &trader.catalog,
            config.counter_offer_min,
            config.counter_offer_max,
            &mut rng,
        );
        info!(
            "[Trade] Opening trade with {} ({} item(s) on offer{})",
            trader.name,
            offer.len(),
            if trader.on_chain { ", on-chain" } else { "" }
        );
        session.open(trader.clone(), offer, config.reveal_stagger());
        session.sync_locks(&mut locks);
        next_state.set(GameState::Trading);
    }
}

/// Runs in Trading: drips the counterparty's offer into its pane.
pub fn reveal_counter_offer(
    time: Res<Time>,
    mut session: ResMut<TradeSession>,
    mut containers: ResMut<SlotContainers>,
    mut slot_events: EventWriter<SlotChangedEvent>,
) {
    if !session.is_revealing() {
        return;
    }
    for slot in session.tick_reveal(time.delta(), &mut containers) {
        slot_events.send(slot_changed(&containers, slot));
    }
}

/// Runs in Trading: lock from Negotiating, or unlock and renegotiate.
pub fn handle_toggle_lock(
    mut events: EventReader<ToggleTradeLockEvent>,
    config: Res<InventoryConfig>,
    mut session: ResMut<TradeSession>,
    mut containers: ResMut<SlotContainers>,
    mut locks: ResMut<ContainerLocks>,
    mut slot_events: EventWriter<SlotChangedEvent>,
    mut toast_events: EventWriter<ToastEvent>,
) {
    for _ in events.read() {
        if session.is_processing() {
            debug!("[Trade] Commit in progress, lock toggle ignored");
            continue;
        }
        match session.phase {
            TradePhase::Negotiating => {
                session.lock();
                info!("[Trade] Player locked their offer");
            }
            TradePhase::PlayerLocked | TradePhase::BothLocked => {
                let catalog = session
                    .trader
                    .as_ref()
                    .map(|t| t.catalog.clone())
                    .unwrap_or_default();
                let offer = choose_counter_offer(
                    &catalog,
                    config.counter_offer_min,
                    config.counter_offer_max,
                    &mut rand::thread_rng(),
                );
                let report = session.unlock(&mut containers, offer, config.reveal_stagger());
                info!("[Trade] Player unlocked, renegotiating");
                announce_escrow(&report, &containers, &config, &mut slot_events, &mut toast_events);
            }
            TradePhase::Idle => {}
        }
        session.sync_locks(&mut locks);
    }
}

/// Runs in Trading: both sides ready opens the confirmation prompt.
pub fn check_counterparty_ready(
    mut session: ResMut<TradeSession>,
    containers: Res<SlotContainers>,
    mut prompt_events: EventWriter<TradeConfirmPromptEvent>,
) {
    if session.phase != TradePhase::PlayerLocked {
        return;
    }
    if session.check_counterparty(&containers) {
        let give = containers.get(ContainerKey::TradeOffer).stacks();
        let receive = containers.get(ContainerKey::TradeCounterOffer).stacks();
        info!(
            "[Trade] Both sides ready: give {} stack(s), receive {} stack(s)",
            give.len(),
            receive.len()
        );
        prompt_events.send(TradeConfirmPromptEvent { give, receive });
    }
}

/// Runs in Trading: explicit cancel refunds and closes the overlay.
pub fn handle_cancel_trade(
    mut events: EventReader<CancelTradeEvent>,
    config: Res<InventoryConfig>,
    mut session: ResMut<TradeSession>,
    mut containers: ResMut<SlotContainers>,
    mut locks: ResMut<ContainerLocks>,
    mut next_state: ResMut<NextState<GameState>>,
    mut slot_events: EventWriter<SlotChangedEvent>,
    mut toast_events: EventWriter<ToastEvent>,
    mut cancelled_events: EventWriter<TradeCancelledEvent>,
) {
    for _ in events.read() {
        if session.is_processing() {
            debug!("[Trade] Commit in progress, cancel ignored");
            continue;
        }
        if session.phase == TradePhase::Idle {
            continue;
        }
        let report = session.cancel(&mut containers);
        session.sync_locks(&mut locks);
        info!("[Trade] Trade cancelled");
        announce_escrow(&report, &containers, &config, &mut slot_events, &mut toast_events);
        cancelled_events.send(TradeCancelledEvent {
            refunded: report.moved,
            lost: report.lost,
        });
        next_state.set(GameState::Playing);
    }
}

/// OnExit(Trading): leaving the overlay any other way still refunds.
pub fn cancel_on_exit(
    config: Res<InventoryConfig>,
    mut session: ResMut<TradeSession>,
    mut containers: ResMut<SlotContainers>,
    mut locks: ResMut<ContainerLocks>,
    mut slot_events: EventWriter<SlotChangedEvent>,
    mut toast_events: EventWriter<ToastEvent>,
    mut cancelled_events: EventWriter<TradeCancelledEvent>,
) {
    if session.phase == TradePhase::Idle {
        return;
    }
    if session.is_processing() {
        warn!("[Trade] Left the trade overlay mid-commit; the pending reply will be ignored");
    }
    let report = session.cancel(&mut containers);
    session.sync_locks(&mut locks);
    announce_escrow(&report, &containers, &config, &mut slot_events, &mut toast_events);
    cancelled_events.send(TradeCancelledEvent {
        refunded: report.moved,
        lost: report.lost,
    });
}

/// Emits change events for an escrow move and reports anything that did
/// not fit in the backpack.
pub(crate) fn announce_escrow(
    report: &EscrowReport,
    containers: &SlotContainers,
    config: &InventoryConfig,
    slot_events: &mut EventWriter<SlotChangedEvent>,
    toast_events: &mut EventWriter<ToastEvent>,
) {
    for slot in &report.changed {
        slot_events.send(slot_changed(containers, *slot));
    }
    if report.lost.is_empty() {
        return;
    }
    for stack in &report.lost {
        warn!("[Trade] Backpack full, {} could not be returned", stack);
    }
    toast_events.send(ToastEvent {
        message: format!("Backpack full! {} item stack(s) lost.", report.lost.len()),
        duration_secs: config.toast_secs,
    });
}
