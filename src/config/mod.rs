//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `PROBE_ENGINE` prefix and nested values are separated by double underscores.
//!
//! # Example
//!
//! ```no_run
//! use probe_engine::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Rewrites enabled: {}", config.guardrail.rewrite_enabled);
//! ```

mod ai;
mod error;
mod guardrail;
mod logging;
mod probing;

pub use ai::AiConfig;
pub use error::{ConfigError, ValidationError};
pub use guardrail::GuardrailConfig;
pub use logging::LoggingConfig;
pub use probing::ProbingConfig;

use serde::Deserialize;

/// Root application configuration
///
/// Every section has defaults, so an empty environment yields a working
/// offline configuration. Load using [`AppConfig::load()`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Text-generation provider (Anthropic)
    #[serde(default)]
    pub ai: AiConfig,

    /// Pack loading and extraction switches
    #[serde(default)]
    pub probing: ProbingConfig,

    /// Question guardrail
    #[serde(default)]
    pub guardrail: GuardrailConfig,

    /// Log filter and format
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `PROBE_ENGINE` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `PROBE_ENGINE__AI__ANTHROPIC_API_KEY=...` -> `ai.anthropic_api_key = ...`
    /// - `PROBE_ENGINE__GUARDRAIL__MAX_QUESTION_LENGTH=200` -> `guardrail.max_question_length = 200`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("PROBE_ENGINE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// Rejects zero timeouts and lengths, a missing pack file, a malformed
    /// log filter, and generative extraction without an API key.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.ai.validate()?;
        self.probing.validate()?;
        self.guardrail.validate()?;
        self.logging.validate()?;

        if self.probing.generative_extraction && !self.ai.has_anthropic() {
            return Err(ValidationError::MissingRequired("AI__ANTHROPIC_API_KEY"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Mutex to ensure tests don't run in parallel (env vars are global)
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: &[&str] = &[
        "PROBE_ENGINE__AI__ANTHROPIC_API_KEY",
        "PROBE_ENGINE__AI__TIMEOUT_SECS",
        "PROBE_ENGINE__PROBING__GENERATIVE_EXTRACTION",
        "PROBE_ENGINE__GUARDRAIL__MAX_QUESTION_LENGTH",
        "PROBE_ENGINE__GUARDRAIL__REWRITE_ENABLED",
        "PROBE_ENGINE__LOGGING__FILTER",
        "PROBE_ENGINE__LOGGING__JSON",
    ];

    /// Helper to clear environment variables after testing
    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_empty_environment_uses_defaults() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        let result = AppConfig::load();

        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());
        let config = result.unwrap();
        assert!(!config.ai.has_anthropic());
        assert_eq!(config.guardrail.max_question_length, 300);
        assert_eq!(config.logging.filter, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_nested_values() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("PROBE_ENGINE__AI__ANTHROPIC_API_KEY", "sk-ant-xxx");
        env::set_var("PROBE_ENGINE__AI__TIMEOUT_SECS", "10");
        env::set_var("PROBE_ENGINE__GUARDRAIL__MAX_QUESTION_LENGTH", "200");
        env::set_var("PROBE_ENGINE__LOGGING__JSON", "true");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert!(config.ai.has_anthropic());
        assert_eq!(config.ai.timeout_secs, 10);
        assert_eq!(config.guardrail.max_question_length, 200);
        assert!(config.logging.json);
    }

    #[test]
    fn test_generative_extraction_requires_key() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("PROBE_ENGINE__PROBING__GENERATIVE_EXTRACTION", "true");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(
            config.validate(),
            Err(ValidationError::MissingRequired("AI__ANTHROPIC_API_KEY"))
        );
    }

    #[test]
    fn test_zero_question_length_fails_validation() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("PROBE_ENGINE__GUARDRAIL__MAX_QUESTION_LENGTH", "0");
        let result = AppConfig::load();
        clear_env();

        assert_eq!(
            result.unwrap().validate(),
            Err(ValidationError::InvalidQuestionLength)
        );
    }
}
