//! Slot bookkeeping around a trade: refunds on cancel, settlement on
//! commit, and the record handed to the host afterwards.

use rand::Rng;

use crate::shared::*;

use super::pipeline::TransactionRecord;

/// What an escrow move touched. `lost` holds stacks that found no empty
/// backpack slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EscrowReport {
    pub changed: Vec<SlotRef>,
    pub moved: Vec<ItemStack>,
    pub lost: Vec<ItemStack>,
}

impl EscrowReport {
    fn merge(&mut self, other: EscrowReport) {
        self.changed.extend(other.changed);
        self.moved.extend(other.moved);
        self.lost.extend(other.lost);
    }
}

fn move_to_backpack(containers: &mut SlotContainers, from: ContainerKey) -> EscrowReport {
    let mut report = EscrowReport::default();
    for index in 0..from.capacity() {
        let Some(stack) = containers.get_mut(from).take(index) else {
            continue;
        };
        report.changed.push(SlotRef::new(from, index));
        match containers
            .get_mut(ContainerKey::Backpack)
            .insert_first_empty(stack.clone())
        {
            InsertResult::Inserted { index } => {
                report.changed.push(SlotRef::new(ContainerKey::Backpack, index));
                report.moved.push(stack);
            }
            InsertResult::Overflow(stack) => report.lost.push(stack),
        }
    }
    report
}

fn discard(containers: &mut SlotContainers, key: ContainerKey) -> EscrowReport {
    let container = containers.get_mut(key);
    let moved = container.stacks();
    let changed = container
        .clear()
        .into_iter()
        .map(|index| SlotRef::new(key, index))
        .collect();
    EscrowReport {
        changed,
        moved,
        lost: Vec::new(),
    }
}

/// Cancel path: the player's offer goes back to the backpack and the
/// counterparty's offer is withdrawn.
pub fn refund_offer(containers: &mut SlotContainers) -> EscrowReport {
    let mut report = move_to_backpack(containers, ContainerKey::TradeOffer);
    let withdrawn = discard(containers, ContainerKey::TradeCounterOffer);
    report.changed.extend(withdrawn.changed);
    report
}

/// Commit path: the player's offer is sent away and the counterparty's
/// offer lands in the backpack.
pub fn settle(containers: &mut SlotContainers) -> EscrowReport {
    let sent = discard(containers, ContainerKey::TradeOffer);
    let mut report = EscrowReport {
        changed: sent.changed,
        ..Default::default()
    };
    report.merge(move_to_backpack(containers, ContainerKey::TradeCounterOffer));
    report
}

/// `0x` followed by 64 lowercase hex digits.
pub fn random_tx_hash<R: Rng + ?Sized>(rng: &mut R) -> String {
    let mut hash = String::with_capacity(66);
    hash.push_str("0x");
    for _ in 0..32 {
        hash.push_str(&format!("{:02x}", rng.gen::<u8>()));
    }
    hash
}

/// Record for a trade that settles without touching the chain.
pub fn local_record<R: Rng + ?Sized>(
    counterparty: &str,
    give: Vec<ItemStack>,
    receive: Vec<ItemStack>,
    estimated_gas: u64,
    rng: &mut R,
) -> TransactionRecord {
    TransactionRecord {
        hash: random_tx_hash(rng),
        gas: estimated_gas,
        counterparty: counterparty.to_string(),
        give,
        receive,
        on_chain: false,
    }
}
