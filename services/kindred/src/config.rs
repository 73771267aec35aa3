//! Application Configuration Module
//!
//! Centralizes the configuration for the kindred service. Settings are loaded
//! from environment variables into a single shareable struct.

use std::env;
use tracing::Level;

/// Holds all configuration loaded from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub openai_api_key: String,
    pub chat_model: String,
    pub timing_model: String,
    pub log_level: Level,
}

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid log level provided for RUST_LOG: {0}")]
    InvalidLogLevel(String),
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    // *   `OPENAI_API_KEY`: Your secret key for the OpenAI API. Required.
    // *   `CHAT_MODEL`: (Optional) The model used for analysis, question
    //     generation and summarization. Defaults to "gpt-4-turbo-preview".
    // *   `TIMING_MODEL`: (Optional) The model used for the yes/no timing
    //     judgment. Defaults to "gpt-3.5-turbo".
    // *   `RUST_LOG`: (Optional) The logging level. Defaults to "INFO".
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file. Useful for local development, ignored if absent.
        dotenvy::dotenv().ok();

        let openai_api_key = env::var("OPENAI_API_KEY")
            .map_err(|_| ConfigError::MissingVar("OPENAI_API_KEY".to_string()))?;

        let chat_model =
            env::var("CHAT_MODEL").unwrap_or_else(|_| "gpt-4-turbo-preview".to_string());
        let timing_model =
            env::var("TIMING_MODEL").unwrap_or_else(|_| "gpt-3.5-turbo".to_string());

        let log_level_str = env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str
            .parse::<Level>()
            .map_err(|_| ConfigError::InvalidLogLevel(log_level_str))?;

        Ok(Self {
            openai_api_key,
            chat_model,
            timing_model,
            log_level,
        })
    }
}
