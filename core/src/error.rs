//! Error types and handling for haggle core

use thiserror::Error;

/// Result type alias for haggle operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for haggle core
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// LLM client errors
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    /// Negotiation session errors
    #[error("Negotiation error: {0}")]
    Negotiation(#[from] NegotiationError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Timeout errors
    #[error("Timeout error: {0}")]
    Timeout(#[from] tokio::time::error::Elapsed),

    /// Prompt template registration errors
    #[error("Template error: {0}")]
    Template(#[from] Box<handlebars::TemplateError>),

    /// Prompt rendering errors
    #[error("Render error: {0}")]
    Render(#[from] handlebars::RenderError),
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid value for field '{field}': {value}")]
    InvalidValue { field: String, value: String },

    #[error("Unsupported protocol: {name}")]
    UnsupportedProtocol { name: String },
}

/// LLM client errors
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    #[error("Model not found: {model}")]
    ModelNotFound { model: String },

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Network error: {message}")]
    Network { message: String },

    #[error("Script exhausted after {calls} completions")]
    ScriptExhausted { calls: usize },
}

/// Negotiation session errors
#[derive(Error, Debug)]
pub enum NegotiationError {
    #[error("Model returned an empty completion")]
    EmptyCompletion,

    #[error("Model reply carries neither a decision nor a price: {reply}")]
    MalformedCompletion { reply: String },
}

impl Error {
    /// Whether the dialogue loop may retry the model call after this error
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::Llm(_) | Error::Negotiation(_) | Error::Http(_) | Error::Timeout(_)
        )
    }
}

impl From<handlebars::TemplateError> for Error {
    fn from(err: handlebars::TemplateError) -> Self {
        Error::Template(Box::new(err))
    }
}
