//! Configuration types for haggle core
//!
//! Only exports resolved data types. All loading logic is in CLI layer.

pub mod settings;
pub mod types;

pub use settings::{NegotiationSettings, ScenarioOverrides};
pub use types::{ModelParams, Protocol, ResolvedLlmConfig, DEFAULT_TIMEOUT_SECS};
