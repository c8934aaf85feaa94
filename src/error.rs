//! Error types for session configuration and vocabulary loading.

use thiserror::Error;

/// Result alias used by configuration-time operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Rejected session configuration. No partial session is created.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("token count must be positive")]
    ZeroTokenCount,

    #[error("unknown vocabulary kind '{0}' (expected 'words' or 'sentences')")]
    UnknownVocabulary(String),

    #[error("unknown session mode '{0}' (expected 'fixed' or 'timed')")]
    UnknownMode(String),

    #[error("unsupported time limit {0}s (expected one of 15, 30, 60, 120)")]
    UnsupportedTimeLimit(u64),

    #[error("vocabulary '{0}' has no entries")]
    EmptyVocabulary(String),

    #[error("failed to load vocabulary '{name}': {message}")]
    VocabularyLoad { name: String, message: String },
}
