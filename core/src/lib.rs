//! # haggle Core
//!
//! Core library for haggle - a local LLM playing buyer or seller in a
//! price negotiation with a human.
//!
//! The crate provides the model clients, the negotiation domain (scenario,
//! prompt, reply parsing, guardrails and the dialogue loop) and the event
//! abstraction front-ends render.

// Core modules
pub mod config;
pub mod error;
pub mod llm;
pub mod negotiation;
pub mod output;

// Re-export commonly used types
pub use config::{ModelParams, NegotiationSettings, Protocol, ResolvedLlmConfig};
pub use error::{Error, Result};
pub use llm::{create_client, LlmClient};
pub use negotiation::{DialogueLoop, Negotiator, Outcome, Role, Scenario, SessionState};
pub use output::{NegotiationEvent, NegotiationOutput};

/// Current version of the haggle-core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize tracing for the library
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
}

/// Initialize tracing with a specific debug mode
pub fn init_tracing_with_debug(debug: bool) {
    let filter = if debug { "debug" } else { "warn" };

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();
}
