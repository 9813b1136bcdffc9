//! End-of-session summary

use super::persona::{Mandate, Role, Scenario};
use super::session::{Outcome, SessionState};
use super::transcript::Speaker;
use serde::Serialize;
use std::fmt;

/// Who came out ahead, judged against the fair price
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    BuyerWon,
    SellerWon,
    Balanced,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::BuyerWon => write!(f, "Buyer won"),
            Verdict::SellerWon => write!(f, "Seller won"),
            Verdict::Balanced => write!(f, "Balanced deal"),
        }
    }
}

/// One labelled line of the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryLine {
    pub speaker: String,
    pub text: String,
}

/// Numbers and conversation reported when a session ends
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NegotiationSummary {
    pub role: Role,
    pub product: String,
    pub limit_label: String,
    pub limit: u64,
    pub market_price: u64,
    pub fair_price: u64,
    /// Deal price, else the agent's last offer, else zero
    pub final_price: u64,
    pub deal: bool,
    pub rounds: u32,
    pub max_rounds: u32,
    /// Buyer savings against the budget, or seller margin over the minimum
    pub difference: i64,
    pub difference_pct: i64,
    /// Final price minus market price
    pub versus_market: i64,
    pub verdict: Verdict,
    pub currency: String,
    pub conversation: Vec<SummaryLine>,
}

impl NegotiationSummary {
    pub fn new(scenario: &Scenario, state: &SessionState, outcome: &Outcome) -> Self {
        let (final_price, deal) = match outcome {
            Outcome::DealReached { price } => (*price, true),
            _ => (state.last_agent_offer().unwrap_or(0), false),
        };

        // Prices span all of u64, so the signed figures are worked out in i128
        let limit = scenario.mandate.limit();
        let difference = match scenario.mandate {
            Mandate::Buyer(_) => i128::from(limit) - i128::from(final_price),
            Mandate::Seller(_) => i128::from(final_price) - i128::from(limit),
        };
        let difference_pct = if limit == 0 {
            0
        } else {
            difference * 100 / i128::from(limit)
        };
        let market_price = scenario.product.base_market_price;
        let versus_market = i128::from(final_price) - i128::from(market_price);

        let fair_price = scenario.fair_price();
        let verdict = match final_price.cmp(&fair_price) {
            std::cmp::Ordering::Less => Verdict::BuyerWon,
            std::cmp::Ordering::Greater => Verdict::SellerWon,
            std::cmp::Ordering::Equal => Verdict::Balanced,
        };

        let role = scenario.role();
        let label = |speaker: Speaker| match speaker {
            Speaker::Agent => role.label().to_string(),
            Speaker::Human => role.counterpart().label().to_string(),
        };
        let conversation = state
            .opening()
            .into_iter()
            .chain(state.transcript().turns())
            .map(|turn| SummaryLine {
                speaker: label(turn.speaker),
                text: turn.text.clone(),
            })
            .collect();

        Self {
            role,
            product: scenario.product.describe(),
            limit_label: scenario.mandate.limit_label().to_string(),
            limit,
            market_price,
            fair_price,
            final_price,
            deal,
            rounds: state.rounds(),
            max_rounds: state.max_rounds(),
            difference: clamp_to_i64(difference),
            difference_pct: clamp_to_i64(difference_pct),
            versus_market: clamp_to_i64(versus_market),
            verdict,
            currency: scenario.currency.clone(),
            conversation,
        }
    }

    fn money(&self, amount: u64) -> String {
        format!("{}{}", self.currency, amount)
    }

    fn signed_money(&self, amount: i64) -> String {
        let sign = if amount < 0 { "-" } else { "+" };
        format!("{}{}{}", sign, self.currency, amount.unsigned_abs())
    }
}

fn clamp_to_i64(value: i128) -> i64 {
    i64::try_from(value).unwrap_or(if value < 0 { i64::MIN } else { i64::MAX })
}

impl fmt::Display for NegotiationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Negotiation Summary ===")?;
        writeln!(f, "Product: {}", self.product)?;
        writeln!(f, "{}: {}", self.limit_label, self.money(self.limit))?;
        writeln!(f, "Fair price: {}", self.money(self.fair_price))?;
        let status = if self.deal { "deal reached" } else { "no deal" };
        writeln!(f, "Final price: {} ({})", self.money(self.final_price), status)?;
        writeln!(f, "Rounds: {} of {}", self.rounds, self.max_rounds)?;

        let difference_label = match self.role {
            Role::Buyer => "Savings vs budget",
            Role::Seller => "Margin over minimum",
        };
        writeln!(
            f,
            "{}: {} ({}%)",
            difference_label,
            self.signed_money(self.difference),
            self.difference_pct
        )?;
        writeln!(f, "Versus market: {}", self.signed_money(self.versus_market))?;
        writeln!(f, "Verdict: {}", self.verdict)?;

        if !self.conversation.is_empty() {
            writeln!(f)?;
            writeln!(f, "Conversation:")?;
            for line in &self.conversation {
                writeln!(f, "{}: {}", line.speaker, line.text)?;
            }
        }

        Ok(())
    }
}
