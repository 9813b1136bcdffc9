//! CLI configuration loader for haggle
//!
//! Implements single-source priority loading with flag overrides:
//! 1. --config file/dir (highest priority)
//! 2. Current working directory: ./haggle.json or ./.haggle/config.json
//! 3. Git repository root: <repo_root>/.haggle/config.json
//! 4. User config dir: <config_dir>/haggle/config.json
//! 5. No file: built-in defaults (local Ollama)
//!
//! Whichever file is found is merged with `HAGGLE_*` environment variables
//! (`HAGGLE_MODEL`, `HAGGLE_NEGOTIATION__MAX_ROUNDS`, ...) before flags apply.

use anyhow::{anyhow, Context, Result};
use config::{Config, Environment, File, FileFormat};
use haggle_core::config::DEFAULT_TIMEOUT_SECS;
use haggle_core::{ModelParams, NegotiationSettings, Protocol, ResolvedLlmConfig};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

const ENV_PREFIX: &str = "HAGGLE";

/// Raw configuration file format
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawConfig {
    /// Protocol to use (defaults to ollama)
    pub protocol: Option<String>,
    /// API key (can be "env:VAR_NAME" for environment variable)
    pub api_key: Option<String>,
    /// Base URL (uses protocol default if not specified)
    pub base_url: Option<String>,
    /// Model name (uses protocol default if not specified)
    pub model: Option<String>,
    pub params: ModelParams,
    pub headers: HashMap<String, String>,
    pub timeout_secs: Option<u64>,
    pub negotiation: NegotiationSettings,
}

/// Everything the negotiate command needs
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub llm: ResolvedLlmConfig,
    pub negotiation: NegotiationSettings,
    /// File the configuration came from, if any
    pub source: Option<PathBuf>,
}

/// CLI configuration loader
#[derive(Default)]
pub struct CliConfigLoader {
    /// Override config file/directory path
    config_override: Option<PathBuf>,
    /// Flag overrides
    protocol_override: Option<String>,
    api_key_override: Option<String>,
    base_url_override: Option<String>,
    model_override: Option<String>,
    timeout_override: Option<u64>,
    max_rounds_override: Option<u32>,
}

impl CliConfigLoader {
    /// Create a new loader
    pub fn new() -> Self {
        Self::default()
    }

    /// Set config file/directory override; `~` is expanded
    pub fn with_config_override(mut self, path: PathBuf) -> Self {
        let expanded = shellexpand::tilde(&path.to_string_lossy()).into_owned();
        self.config_override = Some(PathBuf::from(expanded));
        self
    }

    pub fn with_protocol_override(mut self, protocol: String) -> Self {
        self.protocol_override = Some(protocol);
        self
    }

    pub fn with_api_key_override(mut self, api_key: String) -> Self {
        self.api_key_override = Some(api_key);
        self
    }

    pub fn with_base_url_override(mut self, base_url: String) -> Self {
        self.base_url_override = Some(base_url);
        self
    }

    pub fn with_model_override(mut self, model: String) -> Self {
        self.model_override = Some(model);
        self
    }

    pub fn with_timeout_override(mut self, timeout_secs: u64) -> Self {
        self.timeout_override = Some(timeout_secs);
        self
    }

    pub fn with_max_rounds_override(mut self, max_rounds: u32) -> Self {
        self.max_rounds_override = Some(max_rounds);
        self
    }

    /// Load and resolve configuration
    pub fn load(&self) -> Result<LoadedConfig> {
        // Step 1: Find the config file
        let source = match &self.config_override {
            Some(path) => Some(resolve_path(path).with_context(|| {
                format!(
                    "Failed to load config from override path: {}",
                    path.display()
                )
            })?),
            None => self.search()?,
        };
        debug!("Config source: {:?}", source);

        // Step 2: Merge it with the environment
        let mut raw = merge_sources(source.as_deref(), Some(env_source()))?;

        // Step 3: Apply flag overrides
        if let Some(protocol) = &self.protocol_override {
            raw.protocol = Some(protocol.clone());
        }
        if let Some(api_key) = &self.api_key_override {
            raw.api_key = Some(api_key.clone());
        }
        if let Some(base_url) = &self.base_url_override {
            raw.base_url = Some(base_url.clone());
        }
        if let Some(model) = &self.model_override {
            raw.model = Some(model.clone());
        }
        if let Some(timeout) = self.timeout_override {
            raw.timeout_secs = Some(timeout);
        }
        if let Some(max_rounds) = self.max_rounds_override {
            raw.negotiation.max_rounds = max_rounds;
        }

        // Step 4: Resolve to final config
        let (llm, negotiation) = resolve_config(raw)?;
        Ok(LoadedConfig {
            llm,
            negotiation,
            source,
        })
    }

    /// Search for a config file in priority order
    fn search(&self) -> Result<Option<PathBuf>> {
        let cwd = std::env::current_dir()?;

        // 1. Current working directory
        for candidate in [
            cwd.join("haggle.json"),
            cwd.join(".haggle").join("config.json"),
        ] {
            if candidate.is_file() {
                return Ok(Some(candidate));
            }
        }

        // 2. Git repository root
        if let Some(git_root) = find_git_root(&cwd) {
            let candidate = git_root.join(".haggle").join("config.json");
            if candidate.is_file() {
                return Ok(Some(candidate));
            }
        }

        // 3. User config directory
        if let Some(config_dir) = dirs::config_dir() {
            let candidate = config_dir.join("haggle").join("config.json");
            if candidate.is_file() {
                return Ok(Some(candidate));
            }
        }

        Ok(None)
    }
}

/// Turn an explicit file or directory into the file to read
fn resolve_path(path: &Path) -> Result<PathBuf> {
    if path.is_file() {
        Ok(path.to_path_buf())
    } else if path.is_dir() {
        let config_file = path.join("config.json");
        if config_file.is_file() {
            Ok(config_file)
        } else {
            Err(anyhow!(
                "No config.json found in directory: {}",
                path.display()
            ))
        }
    } else {
        Err(anyhow!("Config path does not exist: {}", path.display()))
    }
}

fn env_source() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

/// Layer the config file under the environment and deserialize the result
fn merge_sources(file: Option<&Path>, env: Option<Environment>) -> Result<RawConfig> {
    let mut builder = Config::builder();

    if let Some(path) = file {
        builder = builder.add_source(File::from(path).format(FileFormat::Json));
    }
    if let Some(env) = env {
        builder = builder.add_source(env);
    }

    let merged = builder.build().with_context(|| match file {
        Some(path) => format!("Failed to parse config file: {}", path.display()),
        None => "Failed to read configuration from the environment".to_string(),
    })?;

    merged
        .try_deserialize()
        .context("Invalid configuration values")
}

/// Find git repository root
fn find_git_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(".git").exists())
        .map(Path::to_path_buf)
}

/// Resolve an `env:VAR` reference, or fall back to the protocol's standard variable
fn resolve_api_key(api_key: Option<String>, protocol: &Protocol) -> Result<String> {
    match api_key {
        Some(key) if key.starts_with("env:") => {
            let var_name = &key[4..];
            std::env::var(var_name)
                .with_context(|| format!("Environment variable not found: {}", var_name))
        }
        Some(key) if !key.is_empty() => Ok(key),
        _ => Ok(protocol
            .api_key_env()
            .and_then(|var| std::env::var(var).ok())
            .unwrap_or_default()),
    }
}

/// Resolve raw config to the settings core expects
fn resolve_config(raw: RawConfig) -> Result<(ResolvedLlmConfig, NegotiationSettings)> {
    let protocol: Protocol = match raw.protocol.as_deref() {
        Some(name) => name.parse()?,
        None => Protocol::Ollama,
    };

    let api_key = resolve_api_key(raw.api_key, &protocol)?;
    let base_url = raw
        .base_url
        .unwrap_or_else(|| protocol.default_base_url().to_string());
    let model = raw
        .model
        .unwrap_or_else(|| protocol.default_model().to_string());

    let resolved = ResolvedLlmConfig::new(protocol, base_url, api_key, model)
        .with_params(raw.params)
        .with_headers(raw.headers)
        .with_timeout_secs(raw.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS));

    resolved
        .validate()
        .map_err(|e| anyhow!("Configuration validation failed: {}", e))?;
    raw.negotiation
        .validate()
        .map_err(|e| anyhow!("Configuration validation failed: {}", e))?;

    Ok((resolved, raw.negotiation))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, name: &str, json: &str) -> PathBuf {
        let path = dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, json).unwrap();
        path
    }

    #[test]
    fn test_defaults_to_local_ollama() {
        let (llm, negotiation) = resolve_config(RawConfig::default()).unwrap();
        assert_eq!(llm.protocol, Protocol::Ollama);
        assert_eq!(llm.base_url, "http://localhost:11434");
        assert_eq!(llm.model, "llama3.1:8b");
        assert!(llm.api_key.is_empty());
        assert_eq!(llm.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(negotiation.max_rounds, 10);
    }

    #[test]
    fn test_file_values_are_read() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            "haggle.json",
            r#"{
                "model": "mistral:7b",
                "timeout_secs": 30,
                "params": { "temperature": 0.4 },
                "negotiation": {
                    "max_rounds": 4,
                    "currency": "$",
                    "seller": { "limit": 500 }
                }
            }"#,
        );

        let raw = merge_sources(Some(&path), None).unwrap();
        let (llm, negotiation) = resolve_config(raw).unwrap();
        assert_eq!(llm.model, "mistral:7b");
        assert_eq!(llm.timeout_secs, 30);
        assert_eq!(llm.params.temperature, Some(0.4));
        assert_eq!(negotiation.max_rounds, 4);
        assert_eq!(negotiation.currency, "$");
        assert_eq!(negotiation.seller.limit, Some(500));
        assert_eq!(negotiation.retries, 1);
    }

    #[test]
    fn test_directory_override_uses_config_json() {
        let dir = TempDir::new().unwrap();
        let file = write_config(&dir, "config.json", r#"{ "model": "qwen2" }"#);

        assert_eq!(resolve_path(dir.path()).unwrap(), file);
        assert!(resolve_path(&dir.path().join("missing")).is_err());

        let empty = TempDir::new().unwrap();
        let err = resolve_path(empty.path()).unwrap_err();
        assert!(err.to_string().contains("No config.json found"));
    }

    #[test]
    fn test_hosted_protocol_requires_key() {
        let raw = RawConfig {
            protocol: Some("anthropic".to_string()),
            api_key: Some(String::new()),
            ..Default::default()
        };
        // only meaningful when the standard variable is not set
        if std::env::var("ANTHROPIC_API_KEY").is_err() {
            let err = resolve_config(raw).unwrap_err();
            assert!(err.to_string().contains("api_key"));
        }
    }

    #[test]
    fn test_env_prefixed_api_key() {
        std::env::set_var("NEGOTIATION_LOADER_TEST_KEY", "sk-from-env");
        let key = resolve_api_key(
            Some("env:NEGOTIATION_LOADER_TEST_KEY".to_string()),
            &Protocol::OpenAICompat,
        )
        .unwrap();
        assert_eq!(key, "sk-from-env");

        assert!(resolve_api_key(
            Some("env:NEGOTIATION_LOADER_TEST_MISSING".to_string()),
            &Protocol::OpenAICompat
        )
        .is_err());
    }

    #[test]
    fn test_unknown_protocol_is_rejected() {
        let raw = RawConfig {
            protocol: Some("carrier-pigeon".to_string()),
            ..Default::default()
        };
        let err = resolve_config(raw).unwrap_err();
        assert!(err.to_string().contains("Unsupported protocol"));
    }

    #[test]
    fn test_zero_rounds_is_rejected() {
        let mut raw = RawConfig::default();
        raw.negotiation.max_rounds = 0;
        assert!(resolve_config(raw).is_err());
    }

    #[test]
    fn test_git_root_search() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        let nested = dir.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();

        assert_eq!(find_git_root(&nested).as_deref(), Some(dir.path()));
    }
}
