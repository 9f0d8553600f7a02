use bevy::prelude::*;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::VecDeque;
use std::time::Duration;

use crate::shared::*;

use super::escrow::{self, EscrowReport};
use super::pipeline::PendingCommit;

/// Where a trade currently stands. Commit and cancel are outcomes that
/// land straight back in `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TradePhase {
    #[default]
    Idle,
    Negotiating,
    PlayerLocked,
    /// Both sides ready; the confirmation prompt is open.
    BothLocked,
}

/// Escrow session with one NPC. A fresh value replaces the old one each
/// time a trade ends.
#[derive(Resource, Debug, Default)]
pub struct TradeSession {
    pub phase: TradePhase,
    pub trader: Option<TraderDef>,
    pub player_ready: bool,
    pub counterparty_ready: bool,
    /// In-flight pipeline commit. While set, lock, confirm and cancel input
    /// is refused.
    pub processing: Option<PendingCommit>,
    /// Last pipeline failure, shown until the next attempt.
    pub error: Option<String>,
    reveal_queue: VecDeque<ItemStack>,
    reveal_timer: Timer,
    next_request_id: u64,
}

impl TradeSession {
    pub fn is_processing(&self) -> bool {
        self.processing.is_some()
    }

    pub fn is_revealing(&self) -> bool {
        !self.reveal_queue.is_empty()
    }

    pub fn counterparty_id(&self) -> Option<&str> {
        self.trader.as_ref().map(|t| t.id.as_str())
    }

    pub fn next_request_id(&mut self) -> u64 {
        self.next_request_id += 1;
        self.next_request_id
    }

    /// Idle → Negotiating with `trader`, revealing `offer` one stack per
    /// `stagger`.
    pub fn open(&mut self, trader: TraderDef, offer: Vec<ItemStack>, stagger: Duration) {
        *self = TradeSession {
            phase: TradePhase::Negotiating,
            trader: Some(trader),
            next_request_id: self.next_request_id,
            ..Default::default()
        };
        self.start_reveal(offer, stagger);
    }

    fn start_reveal(&mut self, offer: Vec<ItemStack>, stagger: Duration) {
        self.reveal_queue = offer.into();
        self.reveal_timer = Timer::new(stagger, TimerMode::Repeating);
    }

    /// Places the next counter-offer stacks as the stagger timer elapses.
    pub fn tick_reveal(&mut self, delta: Duration, containers: &mut SlotContainers) -> Vec<SlotRef> {
        let mut revealed = Vec::new();
        if self.reveal_queue.is_empty() {
            return revealed;
        }
        self.reveal_timer.tick(delta);
        let due = if self.reveal_timer.duration().is_zero() {
            self.reveal_queue.len()
        } else {
            self.reveal_timer.times_finished_this_tick() as usize
        };
        let counter = containers.get_mut(ContainerKey::TradeCounterOffer);
        for _ in 0..due {
            let Some(stack) = self.reveal_queue.pop_front() else {
                break;
            };
            if let InsertResult::Inserted { index } = counter.insert_first_empty(stack) {
                revealed.push(SlotRef::new(ContainerKey::TradeCounterOffer, index));
            }
        }
        revealed
    }

    /// Negotiating → PlayerLocked.
    pub fn lock(&mut self) -> bool {
        if self.phase != TradePhase::Negotiating {
            return false;
        }
        self.phase = TradePhase::PlayerLocked;
        self.player_ready = true;
        true
    }

    /// PlayerLocked → BothLocked once the counterparty has laid out a
    /// non-empty offer. Returns true on the transition.
    pub fn check_counterparty(&mut self, containers: &SlotContainers) -> bool {
        if self.phase != TradePhase::PlayerLocked || self.is_revealing() {
            return false;
        }
        if containers.get(ContainerKey::TradeCounterOffer).is_all_empty() {
            return false;
        }
        self.counterparty_ready = true;
        self.phase = TradePhase::BothLocked;
        true
    }

    /// PlayerLocked/BothLocked → Negotiating. Everything is refunded and
    /// the counterparty lays out `new_offer` from scratch.
    pub fn unlock(
        &mut self,
        containers: &mut SlotContainers,
        new_offer: Vec<ItemStack>,
        stagger: Duration,
    ) -> EscrowReport {
        let report = escrow::refund_offer(containers);
        self.phase = TradePhase::Negotiating;
        self.player_ready = false;
        self.counterparty_ready = false;
        self.error = None;
        self.start_reveal(new_offer, stagger);
        report
    }

    /// Any phase → Idle, refunding the player's offer.
    pub fn cancel(&mut self, containers: &mut SlotContainers) -> EscrowReport {
        let report = escrow::refund_offer(containers);
        self.reset();
        report
    }

    /// Back to a fresh Idle session. Request ids keep counting so stale
    /// pipeline replies never match a later commit.
    pub fn reset(&mut self) {
        *self = TradeSession {
            next_request_id: self.next_request_id,
            ..Default::default()
        };
    }

    /// The player's offer may only be edited while negotiating.
    pub fn sync_locks(&self, locks: &mut ContainerLocks) {
        if self.phase == TradePhase::Negotiating && !self.is_processing() {
            locks.unlock(ContainerKey::TradeOffer);
        } else {
            locks.lock(ContainerKey::TradeOffer);
        }
    }
}

/// Random subset of `catalog` sized between `min` and `max` (inclusive),
/// capped at the catalog length.
pub fn choose_counter_offer<R: Rng + ?Sized>(
    catalog: &[ItemStack],
    min: usize,
    max: usize,
    rng: &mut R,
) -> Vec<ItemStack> {
    let (lo, hi) = (min.min(max), min.max(max));
    let size = rng.gen_range(lo..=hi).min(catalog.len()).min(TRADE_OFFER_SLOTS);
    catalog.choose_multiple(rng, size).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn smith() -> TraderDef {
        TraderDef {
            id: "smith".into(),
            name: "Smith".into(),
            catalog: vec![ItemStack::new("sword_01a", "weapon", 1)],
            on_chain: false,
        }
    }

    fn sword() -> ItemStack {
        ItemStack::new("sword_01a", "weapon", 1)
    }

    fn opened(containers: &mut SlotContainers) -> TradeSession {
        let mut session = TradeSession::default();
        session.open(smith(), vec![sword()], Duration::from_millis(100));
        session.tick_reveal(Duration::from_millis(100), containers);
        session
    }

    #[test]
    fn test_reveal_is_staggered() {
        let mut containers = SlotContainers::default();
        let mut session = TradeSession::default();
        let offer = vec![sword(), ItemStack::new("shield_01a", "armor", 1)];
        session.open(smith(), offer, Duration::from_millis(100));

        assert!(session.tick_reveal(Duration::from_millis(50), &mut containers).is_empty());
        assert_eq!(session.tick_reveal(Duration::from_millis(60), &mut containers).len(), 1);
        assert!(session.is_revealing());
        assert_eq!(session.tick_reveal(Duration::from_millis(100), &mut containers).len(), 1);
        assert!(!session.is_revealing());
        assert_eq!(
            containers.get(ContainerKey::TradeCounterOffer).stacks().len(),
            2
        );
    }

    #[test]
    fn test_lock_then_counterparty_ready() {
        let mut containers = SlotContainers::default();
        let mut session = opened(&mut containers);

        assert!(!session.check_counterparty(&containers), "player not locked yet");
        assert!(session.lock());
        assert!(session.check_counterparty(&containers));
        assert_eq!(session.phase, TradePhase::BothLocked);
        assert!(session.player_ready && session.counterparty_ready);
    }

    #[test]
    fn test_counterparty_waits_for_a_non_empty_offer() {
        let mut containers = SlotContainers::default();
        let mut session = TradeSession::default();
        session.open(smith(), Vec::new(), Duration::from_millis(100));
        session.lock();
        assert!(!session.check_counterparty(&containers));
        assert_eq!(session.phase, TradePhase::PlayerLocked);
    }

    #[test]
    fn test_unlock_refunds_and_rerolls() {
        let mut containers = SlotContainers::default();
        let mut session = opened(&mut containers);
        containers.add_item(ContainerKey::TradeOffer, 0, "potion_01a", "potion", 2);
        session.lock();
        session.check_counterparty(&containers);

        let report = session.unlock(&mut containers, vec![sword()], Duration::from_millis(100));
        assert!(report.lost.is_empty());
        assert_eq!(session.phase, TradePhase::Negotiating);
        assert!(!session.player_ready && !session.counterparty_ready);
        assert!(containers.get(ContainerKey::TradeCounterOffer).is_all_empty());
        assert_eq!(containers.get(ContainerKey::Backpack).get(0).map(|s| s.count), Some(2));
        assert!(session.is_revealing());
    }

    #[test]
    fn test_cancel_returns_to_idle_and_keeps_request_counter() {
        let mut containers = SlotContainers::default();
        let mut session = opened(&mut containers);
        let first = session.next_request_id();
        session.cancel(&mut containers);

        assert_eq!(session.phase, TradePhase::Idle);
        assert!(session.trader.is_none());
        assert!(session.next_request_id() > first);
    }

    #[test]
    fn test_offer_locked_outside_negotiation() {
        let mut containers = SlotContainers::default();
        let mut locks = ContainerLocks::default();
        let mut session = opened(&mut containers);

        session.sync_locks(&mut locks);
        assert!(!locks.is_locked(ContainerKey::TradeOffer));
        session.lock();
        session.sync_locks(&mut locks);
        assert!(locks.is_locked(ContainerKey::TradeOffer));
    }

    #[test]
    fn test_counter_offer_size_is_bounded() {
        let catalog: Vec<ItemStack> = ["a", "b", "c", "d", "e", "f"]
            .iter()
            .map(|id| ItemStack::new(*id, "misc", 1))
            .collect();
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..100 {
            let offer = choose_counter_offer(&catalog, 2, 4, &mut rng);
            assert!((2..=4).contains(&offer.len()));
        }
        let small = choose_counter_offer(&catalog[..1], 2, 4, &mut rng);
        assert_eq!(small.len(), 1);
    }
}
