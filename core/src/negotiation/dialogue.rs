//! Dialogue loop: read a line, ask the agent, print, repeat

use super::decision::extract_price;
use super::negotiator::{AgentReply, Negotiator};
use super::session::{Outcome, SessionState};
use super::summary::NegotiationSummary;
use crate::config::NegotiationSettings;
use crate::error::Result;
use crate::output::{NegotiationEvent, NegotiationOutput, SessionContext};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, error, info, info_span, warn, Instrument};

/// Runs one negotiation session against a line-oriented input
pub struct DialogueLoop {
    negotiator: Negotiator,
    output: Arc<dyn NegotiationOutput>,
    settings: NegotiationSettings,
}

impl DialogueLoop {
    pub fn new(
        negotiator: Negotiator,
        output: Arc<dyn NegotiationOutput>,
        settings: NegotiationSettings,
    ) -> Self {
        Self {
            negotiator,
            output,
            settings,
        }
    }

    /// A fresh session state sized for these settings
    pub fn new_session(&self) -> SessionState {
        SessionState::new(self.settings.max_rounds)
    }

    /// Run the session to completion and return how it ended.
    ///
    /// Model failures never surface as `Err`; they end the session as
    /// [`Outcome::Aborted`]. Only input errors are returned.
    pub async fn run<R>(&self, input: &mut R, state: &mut SessionState) -> Result<Outcome>
    where
        R: AsyncBufRead + Unpin,
    {
        let span = info_span!(
            "session",
            id = %state.id(),
            role = %self.negotiator.scenario().role()
        );
        self.drive(input, state).instrument(span).await
    }

    async fn drive<R>(&self, input: &mut R, state: &mut SessionState) -> Result<Outcome>
    where
        R: AsyncBufRead + Unpin,
    {
        let scenario = self.negotiator.scenario();
        info!("Starting negotiation for {}", scenario.product.describe());

        self.emit(NegotiationEvent::SessionStarted {
            context: self.context(state),
        })
        .await;

        if let Some(opening) = self.negotiator.opening_offer() {
            let price = opening.offer.unwrap_or_default();
            self.emit_agent_turn(0, price, &opening.text, false).await;
            state.set_opening(opening);
        }

        let outcome = loop {
            if !state.has_rounds_left() {
                break Outcome::Expired;
            }

            let line = match self.read_line(input).await? {
                Some(line) => line,
                None => {
                    debug!("Input closed");
                    break Outcome::Withdrawn;
                }
            };

            if self.settings.is_exit(&line) {
                break Outcome::Withdrawn;
            }

            let offer = extract_price(&line);
            state.record_human(line, offer);

            let round = state.current_round();
            match self.respond_with_retries(state).await {
                Ok(reply) => {
                    state.record_agent(reply.message.clone(), reply.price);
                    self.emit_agent_turn(round, reply.price, &reply.message, reply.is_acceptance())
                        .await;
                    if reply.is_acceptance() {
                        break Outcome::DealReached { price: reply.price };
                    }
                }
                Err(e) => {
                    error!("Round {} aborted: {}", round, e);
                    break Outcome::Aborted {
                        reason: e.to_string(),
                    };
                }
            }
        };

        info!("Session ended: {}", outcome);
        state.finish(outcome.clone());

        let summary = outcome
            .has_summary()
            .then(|| NegotiationSummary::new(scenario, state, &outcome));
        self.emit(NegotiationEvent::SessionEnded {
            outcome: outcome.clone(),
            summary,
        })
        .await;

        Ok(outcome)
    }

    /// Next non-blank line, or `None` at end of input
    async fn read_line<R>(&self, input: &mut R) -> Result<Option<String>>
    where
        R: AsyncBufRead + Unpin,
    {
        let prompt = format!(
            "You ({})",
            self.negotiator.scenario().role().counterpart().label()
        );
        let mut buf = String::new();

        loop {
            self.emit(NegotiationEvent::AwaitingInput {
                prompt: prompt.clone(),
            })
            .await;

            buf.clear();
            if input.read_line(&mut buf).await? == 0 {
                return Ok(None);
            }

            let line = buf.trim();
            if !line.is_empty() {
                return Ok(Some(line.to_string()));
            }
        }
    }

    async fn respond_with_retries(&self, state: &SessionState) -> Result<AgentReply> {
        let max_attempts = self.settings.retries.saturating_add(1);
        let mut attempt = 1;

        loop {
            match self.negotiator.respond(state).await {
                Ok(reply) => return Ok(reply),
                Err(e) if e.is_recoverable() && attempt < max_attempts => {
                    warn!("Attempt {}/{} failed: {}", attempt, max_attempts, e);
                    self.emit(NegotiationEvent::RecoverableError {
                        attempt,
                        max_attempts,
                        message: e.to_string(),
                    })
                    .await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn emit_agent_turn(&self, round: u32, price: u64, message: &str, accepted: bool) {
        let scenario = self.negotiator.scenario();
        self.emit(NegotiationEvent::AgentTurn {
            round,
            speaker: format!("AI {}", scenario.role().label()),
            price,
            display_price: scenario.money(price),
            message: message.to_string(),
            accepted,
        })
        .await;
    }

    async fn emit(&self, event: NegotiationEvent) {
        if let Err(e) = self.output.emit_event(event).await {
            warn!("Failed to emit event: {}", e);
        }
    }

    fn context(&self, state: &SessionState) -> SessionContext {
        let scenario = self.negotiator.scenario();
        SessionContext {
            session_id: state.id(),
            role: scenario.role(),
            agent_name: scenario.personality.name.clone(),
            product: scenario.product.describe(),
            limit_label: scenario.mandate.limit_label().to_string(),
            limit: scenario.money(scenario.mandate.limit()),
            max_rounds: state.max_rounds(),
            provider: self.negotiator.provider_name().to_string(),
            model: self.negotiator.model_name().to_string(),
            exit_keyword: self.settings.primary_exit_keyword().to_string(),
        }
    }
}
