//! Buyer and seller chat sessions

use crate::config::{CliConfigLoader, LoadedConfig};
use crate::output::ConsoleOutput;
use anyhow::{Context, Result};
use haggle_core::llm::ChatOptions;
use haggle_core::negotiation::{DialogueLoop, Negotiator, Role, Scenario};
use haggle_core::output::NegotiationOutput;
use haggle_core::create_client;
use std::sync::Arc;
use tokio::io::BufReader;
use tracing::{debug, info};

/// Run one negotiation with the agent playing `role`.
///
/// `limit` overrides the budget (buyer) or minimum price (seller).
pub async fn negotiate_command(
    role: Role,
    limit: Option<u64>,
    config_loader: CliConfigLoader,
) -> Result<()> {
    let LoadedConfig {
        llm,
        mut negotiation,
        source,
    } = config_loader.load()?;

    if let Some(path) = &source {
        info!("📁 Using config file: {}", path.display());
    }
    info!("🤖 Using protocol: {}", llm.protocol.as_str());
    info!("🤖 Using model: {}", llm.model);

    if let Some(limit) = limit {
        match role {
            Role::Buyer => negotiation.buyer.limit = Some(limit),
            Role::Seller => negotiation.seller.limit = Some(limit),
        }
    }

    let client = create_client(&llm).context("Failed to create model client")?;
    let scenario = Scenario::for_role(role, &negotiation);
    debug!(
        "{} mandate: {} {}",
        role,
        scenario.mandate.limit_label(),
        scenario.money(scenario.mandate.limit())
    );

    let negotiator = Negotiator::new(client, scenario)?
        .with_options(ChatOptions::from(&llm.params))
        .with_timeout(llm.timeout())
        .with_closing_tactics(negotiation.closing_tactics);

    let output: Arc<dyn NegotiationOutput> = Arc::new(ConsoleOutput::new());
    let dialogue = DialogueLoop::new(negotiator, output, negotiation);

    let mut state = dialogue.new_session();
    let mut input = BufReader::new(tokio::io::stdin());
    let outcome = dialogue
        .run(&mut input, &mut state)
        .await
        .context("Failed to read from stdin")?;

    debug!(
        "Session {} finished after {} rounds: {}",
        state.id(),
        state.rounds(),
        outcome
    );

    Ok(())
}
