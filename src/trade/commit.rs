use bevy::prelude::*;
use crate::config::InventoryConfig;
use crate::shared::*;

use super::escrow;
use super::negotiation::announce_escrow;
use super::pipeline::{
    PendingCommit, TransactionError, TransactionRecord, TransactionRequestEvent,
    TransactionResultEvent,
};
use super::session::{TradePhase, TradeSession};

/// The player accepted the confirmation prompt.
#[derive(Event, Debug, Clone)]
pub struct ConfirmTradeEvent;

/// A trade settled. Carries the record for the host's transaction log.
#[derive(Event, Debug, Clone, PartialEq)]
pub struct TradeCommittedEvent {
    pub record: TransactionRecord,
}

/// Runs in Trading: local traders settle at once, on-chain traders start
/// the pipeline sequence.
pub fn handle_confirm_trade(
    mut events: EventReader<ConfirmTradeEvent>,
    config: Res<InventoryConfig>,
    mut session: ResMut<TradeSession>,
    mut containers: ResMut<SlotContainers>,
    mut locks: ResMut<ContainerLocks>,
    mut next_state: ResMut<NextState<GameState>>,
    mut requests: EventWriter<TransactionRequestEvent>,
    mut slot_events: EventWriter<SlotChangedEvent>,
    mut toast_events: EventWriter<ToastEvent>,
    mut committed_events: EventWriter<TradeCommittedEvent>,
) {
    for _ in events.read() {
        if session.is_processing() {
            debug!("[Trade] Commit already in progress");
            continue;
        }
        if session.phase != TradePhase::BothLocked {
            debug!("[Trade] Confirm ignored in {:?}", session.phase);
            continue;
        }
        let Some(trader) = session.trader.clone() else {
            continue;
        };
        let give = containers.get(ContainerKey::TradeOffer).stacks();
        let receive = containers.get(ContainerKey::TradeCounterOffer).stacks();
        session.error = None;

        if trader.on_chain {
            let mut pending = PendingCommit::new(trader.id.clone(), &give, &receive);
            let request_id = session.next_request_id();
            if let Some(call) = pending.next_call(request_id) {
                info!("[Trade] Submitting {} (request {})", call.name(), request_id);
                requests.send(TransactionRequestEvent { request_id, call });
            }
            session.processing = Some(pending);
            session.sync_locks(&mut locks);
            toast_events.send(ToastEvent {
                message: "Submitting trade...".to_string(),
                duration_secs: config.toast_secs,
            });
        } else {
            let record = escrow::local_record(
                &trader.id,
                give,
                receive,
                config.estimated_swap_gas,
                &mut rand::thread_rng(),
            );
            finalize_commit(
                record,
                &config,
                &mut session,
                &mut containers,
                &mut locks,
                &mut next_state,
                &mut slot_events,
                &mut toast_events,
                &mut committed_events,
            );
        }
    }
}

/// Advances an on-chain commit as pipeline replies arrive.
pub fn handle_transaction_results(
    mut events: EventReader<TransactionResultEvent>,
    config: Res<InventoryConfig>,
    mut session: ResMut<TradeSession>,
    mut containers: ResMut<SlotContainers>,
    mut locks: ResMut<ContainerLocks>,
    mut next_state: ResMut<NextState<GameState>>,
    mut requests: EventWriter<TransactionRequestEvent>,
    mut slot_events: EventWriter<SlotChangedEvent>,
    mut toast_events: EventWriter<ToastEvent>,
    mut committed_events: EventWriter<TradeCommittedEvent>,
) {
    for ev in events.read() {
        let Some(mut pending) = session.processing.take() else {
            warn!("[Trade] Stale pipeline reply {} with no commit in flight", ev.request_id);
            continue;
        };
        if pending.request_id != ev.request_id {
            warn!(
                "[Trade] Stale pipeline reply {} (awaiting {})",
                ev.request_id, pending.request_id
            );
            session.processing = Some(pending);
            continue;
        }

        match ev.result.clone().and_then(|reply| pending.absorb(reply)) {
            Ok(None) => {
                let request_id = session.next_request_id();
                match pending.next_call(request_id) {
                    Some(call) => {
                        debug!("[Trade] Submitting {} (request {})", call.name(), request_id);
                        requests.send(TransactionRequestEvent { request_id, call });
                        session.processing = Some(pending);
                    }
                    None => fail_commit(
                        TransactionError::UnexpectedReply { call: "executeSwap" },
                        &config,
                        &mut session,
                        &mut locks,
                        &mut toast_events,
                    ),
                }
            }
            Ok(Some((digest, gas_used))) => {
                let Some(counterparty) = session.counterparty_id().map(str::to_string) else {
                    continue;
                };
                let record = TransactionRecord {
                    hash: digest,
                    gas: gas_used,
                    counterparty,
                    give: containers.get(ContainerKey::TradeOffer).stacks(),
                    receive: containers.get(ContainerKey::TradeCounterOffer).stacks(),
                    on_chain: true,
                };
                finalize_commit(
                    record,
                    &config,
                    &mut session,
                    &mut containers,
                    &mut locks,
                    &mut next_state,
                    &mut slot_events,
                    &mut toast_events,
                    &mut committed_events,
                );
            }
            Err(err) => fail_commit(err, &config, &mut session, &mut locks, &mut toast_events),
        }
    }
}

/// The trade did not happen. The session stays in BothLocked so the
/// player can retry or unlock.
fn fail_commit(
    err: TransactionError,
    config: &InventoryConfig,
    session: &mut TradeSession,
    locks: &mut ContainerLocks,
    toast_events: &mut EventWriter<ToastEvent>,
) {
    warn!("[Trade] Commit failed: {}", err);
    session.processing = None;
    session.error = Some(err.to_string());
    session.sync_locks(locks);
    toast_events.send(ToastEvent {
        message: format!("Trade failed: {}", err),
        duration_secs: config.toast_secs,
    });
}

#[allow(clippy::too_many_arguments)]
fn finalize_commit(
    record: TransactionRecord,
    config: &InventoryConfig,
    session: &mut TradeSession,
    containers: &mut SlotContainers,
    locks: &mut ContainerLocks,
    next_state: &mut NextState<GameState>,
    slot_events: &mut EventWriter<SlotChangedEvent>,
    toast_events: &mut EventWriter<ToastEvent>,
    committed_events: &mut EventWriter<TradeCommittedEvent>,
) {
    let report = escrow::settle(containers);
    announce_escrow(&report, containers, config, slot_events, toast_events);

    info!(
        "[Trade] Committed with {}: gave {} stack(s), received {} stack(s), tx {}",
        record.counterparty,
        record.give.len(),
        record.receive.len(),
        record.hash
    );
    toast_events.send(ToastEvent {
        message: "Trade complete!".to_string(),
        duration_secs: config.toast_secs,
    });
    committed_events.send(TradeCommittedEvent { record });

    session.reset();
    session.sync_locks(locks);
    next_state.set(GameState::Playing);
}
