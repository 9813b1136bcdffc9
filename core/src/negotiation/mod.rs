//! Negotiation domain: who is at the table, what they say, and when it ends

pub mod decision;
pub mod dialogue;
pub mod negotiator;
pub mod persona;
pub mod product;
pub mod prompt;
pub mod session;
pub mod summary;
pub mod transcript;

pub use decision::{extract_price, parse_reply, Decision, ParsedReply};
pub use dialogue::DialogueLoop;
pub use negotiator::{AgentReply, Negotiator, ReplyKind};
pub use persona::{BuyerMandate, Mandate, Personality, Role, Scenario, SellerMandate};
pub use product::{Product, QualityGrade};
pub use prompt::PromptBuilder;
pub use session::{Outcome, SessionState};
pub use summary::{NegotiationSummary, SummaryLine, Verdict};
pub use transcript::{Speaker, Transcript, Turn};
