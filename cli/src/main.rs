//! # haggle CLI
//!
//! Command-line interface for haggle - chat with a local LLM that plays the
//! other side of a price negotiation.
//!
//! ## Usage
//!
//! - `haggle buyer` - The AI buys, you sell
//! - `haggle seller` - The AI sells, you buy
//!
//! Type `exit` at the prompt to leave the chat.

use anyhow::Result;
use clap::{Parser, Subcommand};
use haggle_core::negotiation::Role;
use std::path::PathBuf;

mod commands;
mod config;
mod output;

use commands::negotiate_command;
use config::CliConfigLoader;

/// haggle - Negotiate prices with a local LLM
#[derive(Parser)]
#[command(name = "haggle")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Chat with a local LLM playing buyer or seller in a price negotiation")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file or directory path
    #[arg(short, long, global = true, env = "HAGGLE_CONFIG")]
    config: Option<PathBuf>,

    /// Protocol to use (ollama, openai, anthropic)
    #[arg(long, global = true)]
    protocol: Option<String>,

    /// API key override
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Base URL override
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Model name override
    #[arg(long, global = true)]
    model: Option<String>,

    /// Model request timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Maximum number of negotiation rounds
    #[arg(long, global = true, value_parser = clap::value_parser!(u32).range(1..))]
    max_rounds: Option<u32>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// The AI is the buyer; you are the seller
    Buyer {
        /// The buyer's budget
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        budget: Option<u64>,
    },

    /// The AI is the seller; you are the buyer
    Seller {
        /// The lowest price the seller will take
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        minimum_price: Option<u64>,
    },
}

/// Build a configuration loader from CLI arguments
fn build_config_loader(cli: &Cli) -> CliConfigLoader {
    let mut loader = CliConfigLoader::new();

    if let Some(config_path) = &cli.config {
        loader = loader.with_config_override(config_path.clone());
    }

    if let Some(protocol) = &cli.protocol {
        loader = loader.with_protocol_override(protocol.clone());
    }

    if let Some(api_key) = &cli.api_key {
        loader = loader.with_api_key_override(api_key.clone());
    }

    if let Some(base_url) = &cli.base_url {
        loader = loader.with_base_url_override(base_url.clone());
    }

    if let Some(model) = &cli.model {
        loader = loader.with_model_override(model.clone());
    }

    if let Some(timeout) = cli.timeout {
        loader = loader.with_timeout_override(timeout);
    }

    if let Some(max_rounds) = cli.max_rounds {
        loader = loader.with_max_rounds_override(max_rounds);
    }

    loader
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; RUST_LOG wins over --verbose
    if std::env::var_os("RUST_LOG").is_some() {
        haggle_core::init_tracing();
    } else {
        haggle_core::init_tracing_with_debug(cli.verbose);
    }

    let config_loader = build_config_loader(&cli);

    match cli.command {
        Commands::Buyer { budget } => negotiate_command(Role::Buyer, budget, config_loader).await,
        Commands::Seller { minimum_price } => {
            negotiate_command(Role::Seller, minimum_price, config_loader).await
        }
    }
}
