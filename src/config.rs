//! Configuration System
//!
//! Layered configuration for completion-provider settings, chat limits, and
//! logging: an optional TOML file, then `QUILL_*` environment overrides
//! (e.g. `QUILL_PROVIDER__API_KEY`).

use crate::chat::ChatConfig;
use crate::error::QuillError;
use crate::logging::LoggingConfig;
use crate::provider::{GroqClient, ModelConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Completion-provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSettings {
    /// API key for the completion service. Required to create a client.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Backend model identifier
    #[serde(default = "default_model")]
    pub model: String,

    /// Override for the service base URL (e.g. a local proxy)
    #[serde(default)]
    pub base_url: Option<String>,

    /// Sampling temperature in [0, 1]
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Token budget for completions
    #[serde(default = "default_max_context")]
    pub max_context: u32,
}

fn default_model() -> String {
    "llama3-70b-8192".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_context() -> u32 {
    4096
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            base_url: None,
            temperature: default_temperature(),
            max_context: default_max_context(),
        }
    }
}

impl ProviderSettings {
    pub fn validate(&self) -> Result<(), QuillError> {
        if self.model.trim().is_empty() {
            return Err(QuillError::Config("Model cannot be empty".to_string()));
        }
        if !(0.0..=1.0).contains(&self.temperature) {
            return Err(QuillError::Config(format!(
                "Temperature must be in [0, 1], got {}",
                self.temperature
            )));
        }
        Ok(())
    }

    pub fn model_config(&self) -> ModelConfig {
        ModelConfig {
            model_name: self.model.clone(),
            temperature: self.temperature,
            max_context: self.max_context,
        }
    }

    /// Create the Groq client from these settings.
    pub fn create_client(&self) -> Result<GroqClient, QuillError> {
        self.validate()?;
        let api_key = self
            .api_key
            .clone()
            .ok_or_else(|| QuillError::Config("API key is not configured".to_string()))?;
        GroqClient::new(api_key, self.base_url.clone())
    }
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuillConfig {
    /// Completion-provider settings
    #[serde(default)]
    pub provider: ProviderSettings,

    /// Chat prompt-construction limits
    #[serde(default)]
    pub chat: ChatConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl QuillConfig {
    /// Load configuration from an optional TOML file plus `QUILL_*`
    /// environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, QuillError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path.to_path_buf()).required(true));
        }
        builder = builder.add_source(
            config::Environment::with_prefix("QUILL")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .map_err(|e| QuillError::Config(e.to_string()))?;
        let loaded: QuillConfig = settings
            .try_deserialize()
            .map_err(|e| QuillError::Config(e.to_string()))?;
        loaded.provider.validate()?;
        Ok(loaded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = QuillConfig::default();
        assert_eq!(config.provider.model, "llama3-70b-8192");
        assert!(config.provider.api_key.is_none());
        assert_eq!(config.chat.reference_char_budget, 8000);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        writeln!(
            file,
            "[provider]\napi_key = \"gsk-test\"\nmodel = \"llama-3.3-70b-versatile\"\ntemperature = 0.4\n\n[chat]\nmax_history_turns = 10\n"
        )
        .unwrap();

        let config = QuillConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.provider.api_key.as_deref(), Some("gsk-test"));
        assert_eq!(config.provider.model, "llama-3.3-70b-versatile");
        assert_eq!(config.chat.max_history_turns, 10);
        // Unspecified sections keep defaults.
        assert_eq!(config.chat.reference_char_budget, 8000);
    }

    #[test]
    fn test_validate_rejects_bad_temperature() {
        let settings = ProviderSettings {
            temperature: 1.5,
            ..ProviderSettings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_create_client_requires_api_key() {
        let settings = ProviderSettings::default();
        let err = settings.create_client().unwrap_err();
        assert_eq!(
            err,
            QuillError::Config("API key is not configured".to_string())
        );
    }

    #[test]
    fn test_model_config_conversion() {
        let settings = ProviderSettings {
            model: "gemma-7b-it".to_string(),
            ..ProviderSettings::default()
        };
        let model = settings.model_config();
        assert_eq!(model.model_name, "gemma-7b-it");
        assert_eq!(model.max_context, 4096);
    }
}
