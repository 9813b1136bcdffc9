//! Console output handler implementation

use async_trait::async_trait;
use colored::Colorize;
use haggle_core::negotiation::{NegotiationSummary, Outcome};
use haggle_core::output::{NegotiationEvent, NegotiationOutput, OutputResult, SessionContext};
use std::io::Write;
use tracing::debug;

/// Renders negotiation events as a plain terminal chat
pub struct ConsoleOutput;

impl ConsoleOutput {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ConsoleOutput {
    fn default() -> Self {
        Self::new()
    }
}

/// Banner shown when a session starts
pub fn format_banner(context: &SessionContext) -> String {
    let counterpart = context.role.counterpart();
    format!(
        "{}\n{}\nMaximum Rounds: {}\nYou are the {}. Type your offer or message. Type '{}' to quit.\n",
        format!(
            "=== Chat with {} ({}) ===",
            context.agent_name, context.model
        )
        .bold(),
        format!("Negotiating: {}", context.product).dimmed(),
        context.max_rounds,
        counterpart,
        context.exit_keyword
    )
}

/// One agent line: `AI Buyer [₹450]: message`
pub fn format_agent_turn(speaker: &str, display_price: &str, message: &str) -> String {
    format!(
        "{} {}: {}",
        speaker.cyan().bold(),
        format!("[{}]", display_price).yellow(),
        message
    )
}

/// Closing lines for a finished session
pub fn format_outcome(outcome: &Outcome, summary: Option<&NegotiationSummary>) -> String {
    let mut text = match outcome {
        Outcome::DealReached { .. } => String::new(),
        Outcome::Expired => format!(
            "\n{}\n",
            "--- MAX ROUNDS REACHED, negotiation ended without a deal. ---".yellow()
        ),
        Outcome::Withdrawn => "Exiting chat...\n".to_string(),
        Outcome::Aborted { reason } => {
            format!("{}\n", format!("Negotiation aborted: {}", reason).red())
        }
    };

    if let Some(summary) = summary {
        text.push('\n');
        text.push_str(&summary.to_string());
    }

    text
}

#[async_trait]
impl NegotiationOutput for ConsoleOutput {
    async fn emit_event(&self, event: NegotiationEvent) -> OutputResult {
        match event {
            NegotiationEvent::SessionStarted { context } => {
                debug!(
                    "Session {} using {} ({}), {} {}",
                    context.session_id,
                    context.provider,
                    context.model,
                    context.limit_label,
                    context.limit
                );
                println!("{}", format_banner(&context));
            }

            NegotiationEvent::AwaitingInput { prompt } => {
                print!("{}: ", prompt.green().bold());
                std::io::stdout().flush()?;
            }

            NegotiationEvent::AgentTurn {
                speaker,
                display_price,
                message,
                accepted,
                ..
            } => {
                println!("{}", format_agent_turn(&speaker, &display_price, &message));
                if accepted {
                    println!(
                        "\n{}",
                        format!("--- DEAL MADE at {}! ---", display_price)
                            .green()
                            .bold()
                    );
                }
            }

            NegotiationEvent::RecoverableError {
                attempt,
                max_attempts,
                message,
            } => {
                eprintln!(
                    "{}",
                    format!(
                        "⚠️  Model call failed (attempt {}/{}): {}. Retrying...",
                        attempt, max_attempts, message
                    )
                    .yellow()
                );
            }

            NegotiationEvent::SessionEnded { outcome, summary } => {
                print!("{}", format_outcome(&outcome, summary.as_ref()));
                std::io::stdout().flush()?;
            }
        }

        Ok(())
    }
}
