//! Negotiation session settings

use crate::error::ConfigError;
use crate::negotiation::{Personality, Product};
use serde::{Deserialize, Serialize};

/// Per-role scenario overrides
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioOverrides {
    /// Goods on the table
    pub product: Option<Product>,
    /// Budget (buyer mode) or minimum price (seller mode)
    pub limit: Option<u64>,
    /// Replacement personality
    pub personality: Option<Personality>,
}

/// Settings for a negotiation session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NegotiationSettings {
    /// Maximum number of rounds before the negotiation expires
    pub max_rounds: u32,
    /// Extra model attempts after a failed or malformed completion
    pub retries: u32,
    /// Words that end the session (case-insensitive)
    pub exit_keywords: Vec<String>,
    /// Ask for a 10% move on the penultimate round and accept on the last
    pub closing_tactics: bool,
    /// Currency symbol used in prompts and output
    pub currency: String,
    pub buyer: ScenarioOverrides,
    pub seller: ScenarioOverrides,
}

impl Default for NegotiationSettings {
    fn default() -> Self {
        Self {
            max_rounds: 10,
            retries: 1,
            exit_keywords: vec!["exit".to_string(), "quit".to_string()],
            closing_tactics: false,
            currency: "₹".to_string(),
            buyer: ScenarioOverrides::default(),
            seller: ScenarioOverrides::default(),
        }
    }
}

impl NegotiationSettings {
    /// Validate the settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_rounds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "negotiation.max_rounds".to_string(),
                value: "0".to_string(),
            });
        }

        if self.exit_keywords.iter().all(|k| k.trim().is_empty()) {
            return Err(ConfigError::MissingField {
                field: "negotiation.exit_keywords".to_string(),
            });
        }

        Ok(())
    }

    /// Whether a line of human input is an exit keyword
    pub fn is_exit(&self, input: &str) -> bool {
        let input = input.trim();
        self.exit_keywords
            .iter()
            .any(|keyword| !keyword.is_empty() && keyword.eq_ignore_ascii_case(input))
    }

    /// The keyword advertised to the user
    pub fn primary_exit_keyword(&self) -> &str {
        self.exit_keywords
            .first()
            .map(String::as_str)
            .unwrap_or("exit")
    }
}
