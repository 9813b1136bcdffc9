//! Append-only record of the exchange

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who said a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    Human,
    Agent,
}

/// One utterance in the negotiation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub speaker: Speaker,
    pub text: String,
    /// Price carried by the turn, if one could be read from it
    pub offer: Option<u64>,
    pub at: DateTime<Utc>,
}

impl Turn {
    pub fn human(text: impl Into<String>, offer: Option<u64>) -> Self {
        Self {
            speaker: Speaker::Human,
            text: text.into(),
            offer,
            at: Utc::now(),
        }
    }

    pub fn agent(text: impl Into<String>, offer: u64) -> Self {
        Self {
            speaker: Speaker::Agent,
            text: text.into(),
            offer: Some(offer),
            at: Utc::now(),
        }
    }
}

/// Ordered turns of one session
#[derive(Debug, Clone, Default, Serialize)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a turn; turns are never removed or reordered
    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// Most recent offer made by the given speaker
    pub fn last_offer_by(&self, speaker: Speaker) -> Option<u64> {
        self.turns
            .iter()
            .rev()
            .filter(|turn| turn.speaker == speaker)
            .find_map(|turn| turn.offer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_offer_by_speaker() {
        let mut transcript = Transcript::new();
        transcript.push(Turn::human("how about 400", Some(400)));
        transcript.push(Turn::agent("I can do 650", 650));
        transcript.push(Turn::human("too much", None));

        assert_eq!(transcript.len(), 3);
        assert_eq!(transcript.last_offer_by(Speaker::Agent), Some(650));
        // a turn without a price does not hide an earlier one
        assert_eq!(transcript.last_offer_by(Speaker::Human), Some(400));
    }

    #[test]
    fn test_turns_keep_chronological_order() {
        let mut transcript = Transcript::new();
        transcript.push(Turn::human("first", None));
        transcript.push(Turn::agent("second", 1));

        let turns = transcript.turns();
        assert_eq!(turns[0].text, "first");
        assert_eq!(turns[1].text, "second");
        assert!(turns[0].at <= turns[1].at);
    }
}
