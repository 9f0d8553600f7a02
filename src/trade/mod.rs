//! NPC trade escrow: both offer panes, the lock/ready handshake, refunds,
//! settlement and the optional on-chain commit through the transaction
//! pipeline.

use bevy::prelude::*;
use crate::shared::*;

mod commit;
pub mod escrow;
mod negotiation;
pub mod pipeline;
pub mod session;

pub use commit::{ConfirmTradeEvent, TradeCommittedEvent};
pub use escrow::EscrowReport;
pub use negotiation::{
    CancelTradeEvent, OpenTradeEvent, ToggleTradeLockEvent, TradeCancelledEvent,
    TradeConfirmPromptEvent,
};
pub use pipeline::{
    PipelineCall, PipelineReply, TransactionError, TransactionRecord, TransactionRequestEvent,
    TransactionResultEvent,
};
pub use session::{choose_counter_offer, TradePhase, TradeSession};

pub struct TradePlugin;

impl Plugin for TradePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<TradeSession>()
            .init_resource::<TraderRegistry>()
            .add_event::<OpenTradeEvent>()
            .add_event::<ToggleTradeLockEvent>()
            .add_event::<CancelTradeEvent>()
            .add_event::<ConfirmTradeEvent>()
            .add_event::<TradeConfirmPromptEvent>()
            .add_event::<TradeCancelledEvent>()
            .add_event::<TradeCommittedEvent>()
            .add_event::<TransactionRequestEvent>()
            .add_event::<TransactionResultEvent>()
            // Playing state systems
            .add_systems(
                Update,
                negotiation::handle_open_trade.run_if(in_state(GameState::Playing)),
            )
            // Trading state systems
            .add_systems(
                Update,
                (
                    negotiation::reveal_counter_offer,
                    negotiation::handle_toggle_lock,
                    negotiation::handle_cancel_trade,
                    commit::handle_confirm_trade,
                )
                    .chain()
                    .in_set(SlotSystems::Interact)
                    .run_if(in_state(GameState::Trading)),
            )
            .add_systems(
                Update,
                negotiation::check_counterparty_ready
                    .in_set(SlotSystems::React)
                    .run_if(in_state(GameState::Trading)),
            )
            // Pipeline replies may arrive after the overlay closed; stale
            // ones are dropped by request id.
            .add_systems(
                Update,
                commit::handle_transaction_results.in_set(SlotSystems::Interact),
            )
            .add_systems(OnExit(GameState::Trading), negotiation::cancel_on_exit);
    }
}
