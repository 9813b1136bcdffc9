//! Explicit per-session state passed through the dialogue loop

use super::transcript::{Speaker, Transcript, Turn};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// How a session ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// The agent accepted a price
    DealReached { price: u64 },
    /// Maximum rounds reached without a deal
    Expired,
    /// The human typed an exit keyword or closed the input
    Withdrawn,
    /// The model could not produce a usable reply
    Aborted { reason: String },
}

impl Outcome {
    /// Whether a summary is worth printing for this outcome
    pub fn has_summary(&self) -> bool {
        matches!(self, Outcome::DealReached { .. } | Outcome::Expired)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::DealReached { price } => write!(f, "deal reached at {}", price),
            Outcome::Expired => write!(f, "negotiation expired"),
            Outcome::Withdrawn => write!(f, "withdrawn"),
            Outcome::Aborted { reason } => write!(f, "aborted: {}", reason),
        }
    }
}

/// State of one negotiation
#[derive(Debug, Clone)]
pub struct SessionState {
    id: Uuid,
    max_rounds: u32,
    rounds: u32,
    transcript: Transcript,
    /// Seller-mode opening offer, spoken before the first round
    opening: Option<Turn>,
    outcome: Option<Outcome>,
}

impl SessionState {
    pub fn new(max_rounds: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            max_rounds,
            rounds: 0,
            transcript: Transcript::new(),
            opening: None,
            outcome: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Completed rounds so far
    pub fn rounds(&self) -> u32 {
        self.rounds
    }

    pub fn max_rounds(&self) -> u32 {
        self.max_rounds
    }

    /// Number of the round currently being played (1-based)
    pub fn current_round(&self) -> u32 {
        self.rounds.saturating_add(1)
    }

    pub fn has_rounds_left(&self) -> bool {
        self.rounds < self.max_rounds
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn opening(&self) -> Option<&Turn> {
        self.opening.as_ref()
    }

    pub fn set_opening(&mut self, turn: Turn) {
        self.opening = Some(turn);
    }

    /// Record the human's line for the current round
    pub fn record_human(&mut self, text: impl Into<String>, offer: Option<u64>) {
        self.transcript.push(Turn::human(text, offer));
    }

    /// Record the agent's reply, completing the current round
    pub fn record_agent(&mut self, text: impl Into<String>, offer: u64) {
        debug_assert!(self.has_rounds_left());
        self.transcript.push(Turn::agent(text, offer));
        self.rounds += 1;
    }

    /// The agent's latest price, counting the opening offer
    pub fn last_agent_offer(&self) -> Option<u64> {
        self.transcript
            .last_offer_by(Speaker::Agent)
            .or_else(|| self.opening.as_ref().and_then(|turn| turn.offer))
    }

    /// The price the human named in the current round, if any
    pub fn pending_human_offer(&self) -> Option<u64> {
        self.transcript
            .last()
            .filter(|turn| turn.speaker == Speaker::Human)
            .and_then(|turn| turn.offer)
    }

    pub fn finish(&mut self, outcome: Outcome) {
        self.outcome = Some(outcome);
    }

    pub fn outcome(&self) -> Option<&Outcome> {
        self.outcome.as_ref()
    }
}
