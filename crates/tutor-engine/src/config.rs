//! Configuration types for the tutor backend.
//!
//! Controls where static content is read from, how the language-model
//! question generator is reached, and the default assessment length.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TutorError};

/// The default config file name.
const CONFIG_FILE_NAME: &str = "tutor.json";

/// Default directory holding `domains.json`, `topics.json` and `questions.json`.
fn default_data_dir() -> String {
    "data".to_string()
}

/// Default chat-completion endpoint.
fn default_api_url() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

/// Default model used for question generation.
fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

/// Default sampling temperature.
const fn default_temperature() -> f32 {
    0.7
}

/// Default environment variable holding the API key.
fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

/// Default request timeout in seconds.
const fn default_timeout_seconds() -> u64 {
    60
}

/// Main configuration for the tutor backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Directory containing the static JSON content documents.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Language-model settings for question generation.
    #[serde(default)]
    pub llm: LlmSettings,

    /// Assessment defaults.
    #[serde(default)]
    pub assessment: AssessmentSettings,
}

/// Settings for the chat-completion question generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmSettings {
    /// Full URL of the chat-completion endpoint.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Model name sent with every request.
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Name of the environment variable that holds the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            model: default_model(),
            temperature: default_temperature(),
            api_key_env: default_api_key_env(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

/// Assessment defaults applied when a request does not override them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentSettings {
    /// Length of an assessment once generated questions are involved.
    ///
    /// `None` keeps generating indefinitely.
    #[serde(default)]
    pub max_questions: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            llm: LlmSettings::default(),
            assessment: AssessmentSettings::default(),
        }
    }
}

impl Config {
    /// Loads configuration from the current working directory.
    ///
    /// Looks for `tutor.json` in the current directory and falls back to
    /// defaults when it is absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but contains invalid JSON.
    pub fn load() -> Result<Self> {
        let current_dir = std::env::current_dir().map_err(|e| {
            TutorError::config_parse(
                "<current directory>",
                format!("cannot determine current directory: {e}"),
            )
        })?;
        Self::load_from_dir(&current_dir)
    }

    /// Loads configuration from `tutor.json` in a specific directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but contains invalid JSON.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        Self::load_from_file(&dir.join(CONFIG_FILE_NAME))
    }

    /// Loads configuration from a specific file path.
    ///
    /// If the file does not exist, returns default configuration.
    ///
    /// # Errors
    ///
    /// Returns `TutorError::ConfigParseError` if the file cannot be read or
    /// contains invalid JSON, and `TutorError::ConfigValidationError` if the
    /// values are out of range.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let config = Self::default();
                config.validate()?;
                return Ok(config);
            }
            Err(e) => {
                return Err(TutorError::config_parse(
                    path,
                    format!("failed to read file: {e}"),
                ));
            }
        };

        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| TutorError::config_parse(path, e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `TutorError::ConfigValidationError` if any check fails.
    pub fn validate(&self) -> Result<()> {
        if self.data_dir.trim().is_empty() {
            return Err(TutorError::config_validation(
                "dataDir must not be empty",
                "Set dataDir to the directory holding domains.json in your tutor.json",
            ));
        }

        if self.llm.api_url.trim().is_empty() {
            return Err(TutorError::config_validation(
                "llm.apiUrl must not be empty",
                "Set llm.apiUrl to a chat-completion endpoint in your tutor.json",
            ));
        }

        if self.llm.model.trim().is_empty() {
            return Err(TutorError::config_validation(
                "llm.model must not be empty",
                "Set llm.model (e.g. \"gpt-4o-mini\") in your tutor.json",
            ));
        }

        if self.llm.api_key_env.trim().is_empty() {
            return Err(TutorError::config_validation(
                "llm.apiKeyEnv must not be empty",
                "Set llm.apiKeyEnv to the environment variable holding your API key",
            ));
        }

        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(TutorError::config_validation(
                format!(
                    "llm.temperature must be between 0.0 and 2.0 (got {})",
                    self.llm.temperature
                ),
                "Set llm.temperature to a value between 0.0 and 2.0 in your tutor.json",
            ));
        }

        if self.llm.timeout_seconds == 0 {
            return Err(TutorError::config_validation(
                "llm.timeoutSeconds must be greater than 0",
                "Set llm.timeoutSeconds to at least 1 second in your tutor.json",
            ));
        }

        if self.assessment.max_questions == Some(0) {
            return Err(TutorError::config_validation(
                "assessment.maxQuestions must be greater than 0",
                "Remove assessment.maxQuestions or set it to at least 1 in your tutor.json",
            ));
        }

        Ok(())
    }

    /// Reads the API key from the configured environment variable.
    ///
    /// Returns `None` when the variable is unset or blank.
    #[must_use]
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.llm.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}
