//! Error types for Leetscribe.
//!
//! Library crates use [`LeetscribeError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all Leetscribe operations.
#[derive(Debug, thiserror::Error)]
pub enum LeetscribeError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Browser driver error (session, navigation, script execution).
    #[error("browser error: {0}")]
    Browser(String),

    /// No element matched a locator.
    #[error("element not found: {locator}")]
    ElementNotFound { locator: String },

    /// A bounded wait gave up.
    #[error("timed out after {waited_ms}ms waiting for {what}")]
    Timeout { what: String, waited_ms: u128 },

    /// An element handle no longer belongs to the current page.
    #[error("stale element: {0}")]
    StaleElement(String),

    /// The backend cannot perform the requested operation.
    #[error("unsupported operation: {0}")]
    Unsupported(String),

    /// Network/HTTP error talking to the generation service.
    #[error("network error: {0}")]
    Network(String),

    /// LLM enrichment error (API status, response shape).
    #[error("enrichment error: {0}")]
    Enrichment(String),

    /// Login did not produce an authenticated session.
    #[error("authentication error: {message}")]
    Authentication { message: String },

    /// Filesystem or terminal I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error.
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, LeetscribeError>;

impl LeetscribeError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Create an authentication error from any displayable message.
    pub fn authentication(msg: impl Into<String>) -> Self {
        Self::Authentication {
            message: msg.into(),
        }
    }

    /// Create an element-not-found error for a locator description.
    pub fn not_found(locator: impl Into<String>) -> Self {
        Self::ElementNotFound {
            locator: locator.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error came from a bounded wait expiring.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
