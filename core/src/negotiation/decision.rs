//! Reading prices and decisions out of free text
//!
//! Agents are asked to finish every reply with a single line
//! `DECISION: ACCEPT` or `DECISION: COUNTER <price>`. Replies without that
//! line fall back to the first number in the text.

use crate::error::NegotiationError;
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

static PRICE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]+(?:\.[0-9]+)?").expect("price pattern is valid"));

static DECISION_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^[ \t*_>]*decision[ \t*_]*:[ \t*_]*(accept|counter)\b([^\n]*)$")
        .expect("decision pattern is valid")
});

/// What the model decided
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Accept,
    Counter(u64),
}

/// Model reply split into the text to show and the decision it carries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedReply {
    /// Reply text with the decision line removed (may be empty)
    pub message: String,
    pub decision: Decision,
    /// Whether the decision came from an explicit decision line
    pub explicit: bool,
}

/// First whole amount in the text, ignoring thousands separators.
/// Decimals are truncated and amounts past `u64::MAX` saturate.
pub fn extract_price(text: &str) -> Option<u64> {
    let cleaned = text.replace(',', "");
    let found = PRICE.find(&cleaned)?;
    let whole = found.as_str().split('.').next()?;
    match whole.parse() {
        Ok(price) => Some(price),
        Err(_) => {
            debug!("Amount {} does not fit, saturating", whole);
            Some(u64::MAX)
        }
    }
}

/// Parse a model completion into a decision
pub fn parse_reply(text: &str) -> Result<ParsedReply, NegotiationError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(NegotiationError::EmptyCompletion);
    }

    let message = DECISION_LINE.replace_all(text, "");
    let message = message
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string();

    if let Some(captures) = DECISION_LINE.captures_iter(text).last() {
        let verb = captures[1].to_ascii_lowercase();
        let decision = if verb == "accept" {
            Decision::Accept
        } else {
            let price = extract_price(&captures[2])
                .or_else(|| extract_price(&message))
                .ok_or_else(|| NegotiationError::MalformedCompletion {
                    reply: text.to_string(),
                })?;
            Decision::Counter(price)
        };

        return Ok(ParsedReply {
            message,
            decision,
            explicit: true,
        });
    }

    match extract_price(text) {
        Some(price) => Ok(ParsedReply {
            message,
            decision: Decision::Counter(price),
            explicit: false,
        }),
        None => Err(NegotiationError::MalformedCompletion {
            reply: text.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_price() {
        assert_eq!(extract_price("I can offer ₹1,250 today"), Some(1250));
        assert_eq!(extract_price("let's say 480.75"), Some(480));
        assert_eq!(extract_price("no numbers here"), None);
        assert_eq!(extract_price("₹450 or ₹500"), Some(450));
        assert_eq!(
            extract_price("I'll pay 99999999999999999999999 for them"),
            Some(u64::MAX)
        );
    }

    #[test]
    fn test_explicit_counter() {
        let reply = parse_reply(
            "These are premium mangoes, I can come down to ₹640.\nDECISION: COUNTER 640",
        )
        .unwrap();
        assert_eq!(reply.decision, Decision::Counter(640));
        assert!(reply.explicit);
        assert_eq!(
            reply.message,
            "These are premium mangoes, I can come down to ₹640."
        );
    }

    #[test]
    fn test_explicit_accept_any_case_and_markdown() {
        let reply = parse_reply("Alright, ₹480 works for me.\n**Decision: accept**").unwrap();
        assert_eq!(reply.decision, Decision::Accept);
        assert_eq!(reply.message, "Alright, ₹480 works for me.");
    }

    #[test]
    fn test_last_decision_line_wins() {
        let reply =
            parse_reply("DECISION: COUNTER 400\nActually, fine.\nDECISION: ACCEPT").unwrap();
        assert_eq!(reply.decision, Decision::Accept);
        assert_eq!(reply.message, "Actually, fine.");
    }

    #[test]
    fn test_counter_price_from_body() {
        let reply = parse_reply("My final word is ₹455.\nDECISION: COUNTER").unwrap();
        assert_eq!(reply.decision, Decision::Counter(455));
    }

    #[test]
    fn test_fallback_to_first_number() {
        let reply = parse_reply("How about ₹420 for the lot?").unwrap();
        assert_eq!(reply.decision, Decision::Counter(420));
        assert!(!reply.explicit);
        assert_eq!(reply.message, "How about ₹420 for the lot?");
    }

    #[test]
    fn test_empty_and_malformed() {
        assert!(matches!(
            parse_reply("   \n "),
            Err(NegotiationError::EmptyCompletion)
        ));
        assert!(matches!(
            parse_reply("Let me think about it."),
            Err(NegotiationError::MalformedCompletion { .. })
        ));
    }
}
