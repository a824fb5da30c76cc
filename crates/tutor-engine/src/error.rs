//! Error types for the tutor engine.
//!
//! This module defines the error hierarchy for configuration loading,
//! static content access, request validation and question generation.
//! A hint table miss is not represented here: it always resolves to the
//! table's default hint.

use std::path::PathBuf;

/// A specialized `Result` type for tutor engine operations.
pub type Result<T> = std::result::Result<T, TutorError>;

/// Errors that can occur while serving the tutor.
///
/// Variants are grouped by subsystem and carry actionable suggestions
/// where the operator can do something about them.
#[derive(Debug, thiserror::Error)]
pub enum TutorError {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Invalid JSON syntax in the configuration file.
    #[error("Invalid JSON in config file '{path}': {message}\n\nSuggestion: Validate your tutor.json with a JSON linter")]
    ConfigParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Description of the parse error.
        message: String,
    },

    /// Configuration validation failed.
    #[error("Invalid configuration: {message}\n\nSuggestion: {suggestion}")]
    ConfigValidationError {
        /// Description of the validation failure.
        message: String,
        /// Actionable suggestion for the operator.
        suggestion: String,
    },

    // ========================================================================
    // Static Content Errors
    // ========================================================================
    /// A named content document or record does not exist.
    #[error("Content not found: '{name}'")]
    ContentNotFound {
        /// Document file name or record identifier.
        name: String,
    },

    /// A content document exists but is not valid JSON of the expected shape.
    #[error("Malformed content document '{name}': {message}\n\nSuggestion: Check the file against the expected JSON shape")]
    ContentParseError {
        /// Document file name.
        name: String,
        /// Description of the parse failure.
        message: String,
    },

    // ========================================================================
    // Request Errors
    // ========================================================================
    /// A required request field was missing or invalid.
    #[error("{message}")]
    Validation {
        /// Description of what is missing.
        message: String,
    },

    // ========================================================================
    // Question Generation Errors
    // ========================================================================
    /// The language-model question generator failed or produced unusable output.
    #[error("Question generation failed ({kind}): {message}\n\nSuggestion: {suggestion}")]
    GenerationFailed {
        /// What went wrong.
        kind: GenerationErrorKind,
        /// Detailed error message.
        message: String,
        /// Actionable suggestion for the operator.
        suggestion: String,
    },

    // ========================================================================
    // General I/O Errors
    // ========================================================================
    /// General I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A value could not be converted to or from JSON, such as a generated
    /// question turned into its response payload.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Categories of question generation failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationErrorKind {
    /// Authentication failure (missing or invalid API key).
    Authentication,
    /// Rate limit exceeded.
    RateLimit,
    /// Server error (5xx responses).
    Server,
    /// Network connectivity issues or timeouts.
    Network,
    /// The model returned no content, or no questions.
    EmptyResponse,
    /// The model content was not the requested JSON shape.
    MalformedOutput,
    /// Other unclassified errors.
    Other,
}

impl std::fmt::Display for GenerationErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Authentication => write!(f, "authentication"),
            Self::RateLimit => write!(f, "rate_limit"),
            Self::Server => write!(f, "server"),
            Self::Network => write!(f, "network"),
            Self::EmptyResponse => write!(f, "empty_response"),
            Self::MalformedOutput => write!(f, "malformed_output"),
            Self::Other => write!(f, "other"),
        }
    }
}

impl GenerationErrorKind {
    /// Returns a suggestion message for this error kind.
    #[must_use]
    pub const fn suggestion(&self) -> &'static str {
        match self {
            Self::Authentication => "Check that the API key environment variable is set and valid",
            Self::RateLimit => "Wait and retry, or reduce request frequency",
            Self::Server => "Retry later; the model provider may be experiencing issues",
            Self::Network => "Check your network connection and the configured apiUrl",
            Self::EmptyResponse => "Retry the request; the model returned nothing usable",
            Self::MalformedOutput => {
                "Retry the request or lower the temperature; the model ignored the JSON format"
            }
            Self::Other => "Check the model provider's status page",
        }
    }
}

impl TutorError {
    /// Creates a new `ConfigParseError` with the given path and message.
    #[must_use]
    pub fn config_parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ConfigParseError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new `ConfigValidationError` with the given message and suggestion.
    #[must_use]
    pub fn config_validation(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::ConfigValidationError {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Creates a new `ContentNotFound` error.
    #[must_use]
    pub fn content_not_found(name: impl Into<String>) -> Self {
        Self::ContentNotFound { name: name.into() }
    }

    /// Creates a new `ContentParseError`.
    #[must_use]
    pub fn content_parse(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ContentParseError {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Creates a new `Validation` error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Creates a new `GenerationFailed` error with the suggestion for its kind.
    #[must_use]
    pub fn generation_failed(kind: GenerationErrorKind, message: impl Into<String>) -> Self {
        let suggestion = kind.suggestion().to_string();
        Self::GenerationFailed {
            kind,
            message: message.into(),
            suggestion,
        }
    }

    /// Returns the generation failure kind, if this is a generation error.
    #[must_use]
    pub const fn generation_kind(&self) -> Option<GenerationErrorKind> {
        match self {
            Self::GenerationFailed { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Returns `true` if this error is transient and the caller may retry.
    ///
    /// The engine itself never retries.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::GenerationFailed {
                kind: GenerationErrorKind::RateLimit
                    | GenerationErrorKind::Server
                    | GenerationErrorKind::Network,
                ..
            }
        )
    }
}
