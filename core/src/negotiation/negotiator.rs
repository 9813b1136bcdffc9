//! Negotiator: asks the model for a reply and keeps it inside the mandate

use super::decision::{parse_reply, Decision};
use super::persona::{BuyerMandate, Mandate, Scenario, SellerMandate};
use super::product::percent_of;
use super::prompt::PromptBuilder;
use super::session::SessionState;
use super::transcript::Turn;
use crate::error::Result;
use crate::llm::{ChatOptions, LlmClient};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Kind of move the agent makes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyKind {
    Accept,
    Counter,
}

/// Final agent reply for a round
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentReply {
    pub kind: ReplyKind,
    /// Accepted price or counter-offer
    pub price: u64,
    pub message: String,
}

impl AgentReply {
    fn accept(price: u64, message: String) -> Self {
        Self {
            kind: ReplyKind::Accept,
            price,
            message,
        }
    }

    fn counter(price: u64, message: String) -> Self {
        Self {
            kind: ReplyKind::Counter,
            price,
            message,
        }
    }

    pub fn is_acceptance(&self) -> bool {
        self.kind == ReplyKind::Accept
    }
}

/// Drives one side of the negotiation
pub struct Negotiator {
    client: Arc<dyn LlmClient>,
    scenario: Scenario,
    prompt: PromptBuilder,
    options: ChatOptions,
    timeout: Duration,
    closing_tactics: bool,
}

impl Negotiator {
    /// Create a negotiator for a scenario
    pub fn new(client: Arc<dyn LlmClient>, scenario: Scenario) -> Result<Self> {
        Ok(Self {
            client,
            scenario,
            prompt: PromptBuilder::new()?,
            options: ChatOptions::default(),
            timeout: Duration::from_secs(crate::config::DEFAULT_TIMEOUT_SECS),
            closing_tactics: false,
        })
    }

    /// Set chat options sent with every request
    pub fn with_options(mut self, options: ChatOptions) -> Self {
        self.options = options;
        self
    }

    /// Set the per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Ask for a 10% move on the penultimate round and settle on the last
    pub fn with_closing_tactics(mut self, enabled: bool) -> Self {
        self.closing_tactics = enabled;
        self
    }

    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    pub fn model_name(&self) -> &str {
        self.client.model_name()
    }

    pub fn provider_name(&self) -> &str {
        self.client.provider_name()
    }

    /// Seller agents open the negotiation before the human speaks
    pub fn opening_offer(&self) -> Option<Turn> {
        match &self.scenario.mandate {
            Mandate::Buyer(_) => None,
            Mandate::Seller(m) => {
                let price = percent_of(
                    self.scenario.product.base_market_price,
                    m.opening_markup_pct.saturating_add(100),
                );
                let message = format!(
                    "These are premium {}. I can offer them for {}.",
                    self.scenario.product.name,
                    self.scenario.money(price)
                );
                Some(Turn::agent(message, price))
            }
        }
    }

    /// Produce the agent's reply to the human turn that opened the current round.
    ///
    /// One model call at most; retrying is up to the caller.
    pub async fn respond(&self, state: &SessionState) -> Result<AgentReply> {
        let round = state.current_round();
        let human_price = self.human_price(state);

        if let Some(reply) = self.closing_move(round, state.max_rounds(), human_price) {
            debug!("Round {}: closing move {:?}", round, reply.kind);
            return Ok(reply);
        }

        let messages = self.prompt.messages(&self.scenario, state)?;
        let response = tokio::time::timeout(
            self.timeout,
            self.client
                .chat_completion(messages, Some(self.options.clone())),
        )
        .await??;

        let text = response.message.text();
        debug!(
            "Round {}: {} replied with {} chars",
            round,
            response.model,
            text.len()
        );

        let parsed = parse_reply(text)?;
        if !parsed.explicit {
            debug!("Round {}: no decision line, reading {:?}", round, parsed.decision);
        }
        let reply = match &self.scenario.mandate {
            Mandate::Buyer(m) => self.guard_buyer(m, state, human_price, parsed.decision, parsed.message),
            Mandate::Seller(m) => {
                self.guard_seller(m, state, human_price, parsed.decision, parsed.message)
            }
        };

        Ok(reply)
    }

    /// Price named by the human this round, with the original defaults for silence
    fn human_price(&self, state: &SessionState) -> u64 {
        state.pending_human_offer().unwrap_or(match self.scenario.mandate {
            Mandate::Buyer(_) => self.scenario.product.base_market_price,
            Mandate::Seller(_) => 0,
        })
    }

    fn closing_move(&self, round: u32, max_rounds: u32, human_price: u64) -> Option<AgentReply> {
        if !self.closing_tactics || max_rounds < 2 {
            return None;
        }
        let money = |p| self.scenario.money(p);

        let rounds_left = max_rounds.saturating_sub(round);

        match &self.scenario.mandate {
            Mandate::Buyer(m) => {
                let (floor, ceiling) = self.buyer_band(m);
                if rounds_left == 1 {
                    let target = percent_of(human_price, 90).clamp(floor, ceiling);
                    Some(AgentReply::counter(
                        target,
                        format!("If you can reduce by 10% to {}, we have a deal.", money(target)),
                    ))
                } else if rounds_left == 0 {
                    Some(if human_price <= m.budget {
                        AgentReply::accept(human_price, format!("Alright, I accept {}.", money(human_price)))
                    } else {
                        AgentReply::counter(
                            m.budget,
                            format!("My budget stops at {}. That is my final offer.", money(m.budget)),
                        )
                    })
                } else {
                    None
                }
            }
            Mandate::Seller(m) => {
                let floor = self.seller_floor(m);
                if rounds_left == 1 {
                    let target = percent_of(human_price, 110).max(floor);
                    Some(AgentReply::counter(
                        target,
                        format!("If you can raise it by 10% to {}, we have a deal.", money(target)),
                    ))
                } else if rounds_left == 0 {
                    Some(if human_price >= floor {
                        AgentReply::accept(human_price, format!("Alright, deal at {}!", money(human_price)))
                    } else {
                        AgentReply::counter(
                            floor,
                            format!("I cannot go below {}. That is my final price.", money(floor)),
                        )
                    })
                } else {
                    None
                }
            }
        }
    }

    /// Lowest and highest price a buyer will ever offer
    fn buyer_band(&self, m: &BuyerMandate) -> (u64, u64) {
        let fair = self.scenario.fair_price();
        let floor = percent_of(fair, m.floor_pct).max(1);
        (floor.min(m.budget), m.budget)
    }

    /// Lowest price a seller will ever counter with
    fn seller_floor(&self, m: &SellerMandate) -> u64 {
        self.scenario
            .product
            .base_market_price
            .saturating_add(1)
            .max(m.minimum_price)
    }

    fn guard_buyer(
        &self,
        m: &BuyerMandate,
        state: &SessionState,
        seller_price: u64,
        decision: Decision,
        message: String,
    ) -> AgentReply {
        let money = |p| self.scenario.money(p);
        let fair = self.scenario.fair_price();
        let (floor, ceiling) = self.buyer_band(m);
        let tolerance = percent_of(fair, m.tolerance_pct);
        let accept_line = || format!("Alright, I accept {}.", money(seller_price));

        if seller_price <= m.budget && seller_price <= fair.saturating_add(tolerance) {
            return AgentReply::accept(seller_price, non_empty(message, accept_line));
        }

        let counter = match decision {
            Decision::Accept if seller_price <= m.budget => {
                return AgentReply::accept(seller_price, non_empty(message, accept_line));
            }
            Decision::Accept => {
                return AgentReply::counter(
                    m.budget,
                    format!(
                        "{} is beyond my budget. I can go up to {}.",
                        money(seller_price),
                        money(m.budget)
                    ),
                );
            }
            Decision::Counter(price) => price,
        };

        let anchor = state
            .last_agent_offer()
            .unwrap_or(percent_of(fair, m.opening_pct));
        debug!("Buyer counter {} (last offer {})", counter, anchor);

        if counter > ceiling {
            AgentReply::counter(
                ceiling,
                format!(
                    "Considering my budget and the value, I can only go up to {}.",
                    money(ceiling)
                ),
            )
        } else if counter < floor {
            AgentReply::counter(
                floor,
                format!(
                    "This is my best and final offer given the market reality: {}.",
                    money(floor)
                ),
            )
        } else {
            AgentReply::counter(
                counter,
                non_empty(message, || format!("I can offer {}.", money(counter))),
            )
        }
    }

    fn guard_seller(
        &self,
        m: &SellerMandate,
        state: &SessionState,
        buyer_price: u64,
        decision: Decision,
        message: String,
    ) -> AgentReply {
        let money = |p| self.scenario.money(p);
        let market = self.scenario.product.base_market_price;
        let floor = self.seller_floor(m);
        let last_offer = state
            .last_agent_offer()
            .unwrap_or(self.scenario.fair_price().saturating_add(m.fallback_margin));

        if buyer_price >= market && buyer_price >= last_offer {
            return AgentReply::accept(
                buyer_price,
                format!("Deal at {}! You're getting unmatched value.", money(buyer_price)),
            );
        }

        let counter = match decision {
            Decision::Accept if buyer_price >= floor => {
                return AgentReply::accept(
                    buyer_price,
                    non_empty(message, || format!("Alright, deal at {}!", money(buyer_price))),
                );
            }
            Decision::Accept => {
                return AgentReply::counter(
                    last_offer,
                    format!(
                        "{} is too low for these {}. My price stays at {}.",
                        money(buyer_price),
                        self.scenario.product.name,
                        money(last_offer)
                    ),
                );
            }
            Decision::Counter(price) => price,
        };

        // Never climb back above an earlier offer
        let capped = counter.min(last_offer);
        if capped < floor {
            AgentReply::counter(
                floor,
                format!(
                    "Considering the quality of these {}, the best I can do is {}.",
                    self.scenario.product.name,
                    money(floor)
                ),
            )
        } else if capped != counter {
            AgentReply::counter(
                capped,
                format!("I'll hold at {}, and that is already a fair price.", money(capped)),
            )
        } else {
            AgentReply::counter(
                counter,
                non_empty(message, || format!("I can do {}.", money(counter))),
            )
        }
    }
}

fn non_empty(message: String, fallback: impl FnOnce() -> String) -> String {
    if message.trim().is_empty() {
        fallback()
    } else {
        message
    }
}
