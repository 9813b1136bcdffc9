//! Output abstraction
//!
//! The dialogue loop reports everything it does as [`NegotiationEvent`]s.
//! Front-ends decide how to render them.

pub mod events;

pub use events::{NegotiationEvent, SessionContext};

use async_trait::async_trait;
use tokio::sync::Mutex;

/// Result type for output handlers
pub type OutputResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Receiver of negotiation events
#[async_trait]
pub trait NegotiationOutput: Send + Sync {
    /// Handle one event
    async fn emit_event(&self, event: NegotiationEvent) -> OutputResult;
}

/// Keeps every event in memory
#[derive(Default)]
pub struct RecordingOutput {
    events: Mutex<Vec<NegotiationEvent>>,
}

impl RecordingOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events received so far
    pub async fn events(&self) -> Vec<NegotiationEvent> {
        self.events.lock().await.clone()
    }
}

#[async_trait]
impl NegotiationOutput for RecordingOutput {
    async fn emit_event(&self, event: NegotiationEvent) -> OutputResult {
        self.events.lock().await.push(event);
        Ok(())
    }
}
