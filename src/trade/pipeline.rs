//! Boundary to the external transaction pipeline used by on-chain traders.
//!
//! The pipeline is request/response over events: the trade domain sends a
//! `TransactionRequestEvent`, the host executes it and answers with a
//! `TransactionResultEvent` carrying the same `request_id`. One commit is
//! a sequence of calls: lock each offered stack, mint each counterpart
//! stack, then execute the swap.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::shared::*;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransactionError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Transaction rejected: {0}")]
    Rejected(String),

    #[error("Insufficient gas: required {required}, available {available}")]
    InsufficientGas { required: u64, available: u64 },

    #[error("Pipeline answered {call} with the wrong reply")]
    UnexpectedReply { call: &'static str },
}

// ============================================================================
// Calls & Replies
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineCall {
    LockItem { object_ref: String },
    MintItemNow { metadata: ItemStack },
    ExecuteSwap {
        locked_item_ids: Vec<String>,
        minted_refs: Vec<String>,
        counterparty: NpcId,
    },
}

impl PipelineCall {
    pub fn name(&self) -> &'static str {
        match self {
            PipelineCall::LockItem { .. } => "lockItem",
            PipelineCall::MintItemNow { .. } => "mintItemNow",
            PipelineCall::ExecuteSwap { .. } => "executeSwap",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineReply {
    Locked { locked_item_id: String },
    Minted { object_ref: String },
    Swapped { digest: String, gas_used: u64 },
}

/// Sent by the trade domain; the host performs the call.
#[derive(Event, Debug, Clone)]
pub struct TransactionRequestEvent {
    pub request_id: u64,
    pub call: PipelineCall,
}

/// Sent by the host when a call finishes.
#[derive(Event, Debug, Clone)]
pub struct TransactionResultEvent {
    pub request_id: u64,
    pub result: Result<PipelineReply, TransactionError>,
}

// ============================================================================
// Record
// ============================================================================

/// Receipt of a committed trade, displayed to the player and kept by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub hash: String,
    pub gas: u64,
    pub counterparty: NpcId,
    pub give: Vec<ItemStack>,
    pub receive: Vec<ItemStack>,
    pub on_chain: bool,
}

impl TransactionRecord {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

// ============================================================================
// Commit sequencing
// ============================================================================

/// Progress of one on-chain commit through its pipeline calls.
#[derive(Debug, Clone)]
pub struct PendingCommit {
    /// Request currently awaiting a reply.
    pub request_id: u64,
    awaiting: &'static str,
    queue: VecDeque<PipelineCall>,
    locked: Vec<String>,
    minted: Vec<String>,
    swap_sent: bool,
    counterparty: NpcId,
}

impl PendingCommit {
    pub fn new(counterparty: NpcId, give: &[ItemStack], receive: &[ItemStack]) -> Self {
        let locks = give.iter().map(|s| PipelineCall::LockItem {
            object_ref: s.item_id.clone(),
        });
        let mints = receive.iter().map(|s| PipelineCall::MintItemNow {
            metadata: s.clone(),
        });
        Self {
            request_id: 0,
            awaiting: "",
            queue: locks.chain(mints).collect(),
            locked: Vec::new(),
            minted: Vec::new(),
            swap_sent: false,
            counterparty,
        }
    }

    /// Next call to issue. The swap goes last, once every lock and mint
    /// has answered.
    pub fn next_call(&mut self, request_id: u64) -> Option<PipelineCall> {
        let call = match self.queue.pop_front() {
            Some(call) => call,
            None if !self.swap_sent => {
                self.swap_sent = true;
                PipelineCall::ExecuteSwap {
                    locked_item_ids: self.locked.clone(),
                    minted_refs: self.minted.clone(),
                    counterparty: self.counterparty.clone(),
                }
            }
            None => return None,
        };
        self.request_id = request_id;
        self.awaiting = call.name();
        Some(call)
    }

    /// Folds a reply into the commit. Returns the swap digest and gas once
    /// the final call answers.
    pub fn absorb(&mut self, reply: PipelineReply) -> Result<Option<(String, u64)>, TransactionError> {
        match (self.awaiting, reply) {
            ("lockItem", PipelineReply::Locked { locked_item_id }) => {
                self.locked.push(locked_item_id);
                Ok(None)
            }
            ("mintItemNow", PipelineReply::Minted { object_ref }) => {
                self.minted.push(object_ref);
                Ok(None)
            }
            ("executeSwap", PipelineReply::Swapped { digest, gas_used }) => {
                Ok(Some((digest, gas_used)))
            }
            (call, _) => Err(TransactionError::UnexpectedReply { call }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn potion(count: u8) -> ItemStack {
        ItemStack::new("potion_01a", "potion", count)
    }

    fn sword() -> ItemStack {
        ItemStack::new("sword_01a", "weapon", 1)
    }

    #[test]
    fn test_commit_sequence_locks_then_mints_then_swaps() {
        let mut commit = PendingCommit::new("smith".into(), &[potion(2)], &[sword()]);

        let first = commit.next_call(1).unwrap();
        assert_eq!(first.name(), "lockItem");
        assert_eq!(
            commit.absorb(PipelineReply::Locked { locked_item_id: "lock-1".into() }),
            Ok(None)
        );

        let second = commit.next_call(2).unwrap();
        assert_eq!(second, PipelineCall::MintItemNow { metadata: sword() });
        commit
            .absorb(PipelineReply::Minted { object_ref: "obj-9".into() })
            .unwrap();

        let third = commit.next_call(3).unwrap();
        assert_eq!(
            third,
            PipelineCall::ExecuteSwap {
                locked_item_ids: vec!["lock-1".into()],
                minted_refs: vec!["obj-9".into()],
                counterparty: "smith".into(),
            }
        );
        let done = commit
            .absorb(PipelineReply::Swapped { digest: "0xabc".into(), gas_used: 4_200 })
            .unwrap();
        assert_eq!(done, Some(("0xabc".to_string(), 4_200)));
        assert!(commit.next_call(4).is_none());
    }

    #[test]
    fn test_mismatched_reply_is_an_error() {
        let mut commit = PendingCommit::new("smith".into(), &[potion(1)], &[]);
        commit.next_call(1);
        let err = commit
            .absorb(PipelineReply::Swapped { digest: "0x0".into(), gas_used: 1 })
            .unwrap_err();
        assert_eq!(err, TransactionError::UnexpectedReply { call: "lockItem" });
    }

    #[test]
    fn test_record_serializes_to_json() {
        let record = TransactionRecord {
            hash: "0x01".into(),
            gas: 30_000,
            counterparty: "smith".into(),
            give: vec![potion(2)],
            receive: vec![sword()],
            on_chain: false,
        };
        let json = record.to_json().unwrap();
        assert!(json.contains("\"potion_01a\""));
        let back: TransactionRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_error_messages_are_readable() {
        let err = TransactionError::InsufficientGas { required: 10, available: 3 };
        assert_eq!(err.to_string(), "Insufficient gas: required 10, available 3");
    }
}
