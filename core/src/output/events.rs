//! Events emitted while a negotiation runs

use crate::negotiation::{NegotiationSummary, Outcome, Role};
use serde::Serialize;
use uuid::Uuid;

/// Fixed facts about a session, sent once when it starts
#[derive(Debug, Clone, Serialize)]
pub struct SessionContext {
    pub session_id: Uuid,
    pub role: Role,
    pub agent_name: String,
    pub product: String,
    pub limit_label: String,
    /// Budget or minimum price, already formatted with the currency
    pub limit: String,
    pub max_rounds: u32,
    pub provider: String,
    pub model: String,
    pub exit_keyword: String,
}

/// Events consumed by output handlers
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum NegotiationEvent {
    SessionStarted {
        context: SessionContext,
    },
    /// The loop is waiting for the next human line
    AwaitingInput {
        prompt: String,
    },
    /// The agent spoke. Round 0 is the seller's opening offer.
    AgentTurn {
        round: u32,
        speaker: String,
        price: u64,
        /// `price` with the currency symbol
        display_price: String,
        message: String,
        accepted: bool,
    },
    /// A model call failed and will be retried
    RecoverableError {
        attempt: u32,
        max_attempts: u32,
        message: String,
    },
    SessionEnded {
        outcome: Outcome,
        summary: Option<NegotiationSummary>,
    },
}
