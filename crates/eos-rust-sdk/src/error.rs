//! Error types for the EOS SDK.
//!
//! This module provides a unified error type [`EosError`] that encompasses
//! all possible errors that can occur when using the SDK.

use std::fmt;
use thiserror::Error;

/// A specialized Result type for EOS SDK operations.
pub type EosResult<T> = Result<T, EosError>;

/// The main error type for the EOS SDK.
///
/// Batch closures pick their own error type; anything the SDK raises while
/// the closure runs converts into it through `From<EosError>`, so a caller's
/// own rollback reason comes back unchanged.
#[derive(Error, Debug)]
pub enum EosError {
    /// No key or signature source is available for signing.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// An operation was used in a way the SDK does not allow.
    #[error("Invalid usage: {0}")]
    InvalidUsage(String),

    /// The ABI lookup for a contract came back empty.
    #[error("unknown key: contract '{0}' has no abi")]
    UnknownContract(String),

    /// A batch was rolled back by its closure.
    #[error("{0}")]
    Rollback(String),

    /// The node rejected the signed transaction.
    #[error("Broadcast failed: {0}")]
    Broadcast(String),

    /// Error occurred during HTTP communication
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Error occurred during JSON serialization/deserialization
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error occurred while encoding a payload or transaction
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Error occurred during URL parsing
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Error occurred during hex encoding/decoding
    #[error("Hex error: {0}")]
    Hex(#[from] hex::FromHexError),

    /// Invalid account, action or permission name
    #[error("Invalid name: {0}")]
    InvalidName(String),

    /// Invalid private or public key
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Invalid signature
    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    /// API returned an error response
    #[error("API error ({status_code}): {message}")]
    Api {
        /// HTTP status code
        status_code: u16,
        /// Error message from the node
        message: String,
        /// Optional numeric error code from the node
        code: Option<i64>,
    },

    /// Any other error
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Maximum length for error messages to prevent excessive memory usage in logs.
const MAX_ERROR_MESSAGE_LENGTH: usize = 1000;

/// Patterns that might indicate sensitive information in error messages.
const SENSITIVE_PATTERNS: &[&str] = &["private_key", "secret", "wif", "password", "bearer"];

impl EosError {
    /// Creates a new configuration error
    pub fn configuration<S: Into<String>>(msg: S) -> Self {
        Self::Configuration(msg.into())
    }

    /// Creates a new invalid usage error
    pub fn invalid_usage<S: Into<String>>(msg: S) -> Self {
        Self::InvalidUsage(msg.into())
    }

    /// Creates a rollback reason for a batch closure.
    pub fn rollback<S: Into<String>>(reason: S) -> Self {
        Self::Rollback(reason.into())
    }

    /// Creates a new serialization error
    pub fn serialization<E: fmt::Display>(err: E) -> Self {
        Self::Serialization(err.to_string())
    }

    /// Wraps a push failure into a broadcast error, keeping the node's message.
    pub fn broadcast(err: EosError) -> Self {
        match err {
            Self::Api { message, .. } => Self::Broadcast(message),
            Self::Broadcast(message) => Self::Broadcast(message),
            other => Self::Broadcast(other.to_string()),
        }
    }

    /// Creates a new API error from response details
    pub fn api(status_code: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status_code,
            message: message.into(),
            code: None,
        }
    }

    /// Creates a new API error with the node's numeric code
    pub fn api_with_code(status_code: u16, message: impl Into<String>, code: Option<i64>) -> Self {
        Self::Api {
            status_code,
            message: message.into(),
            code,
        }
    }

    /// Returns true if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::UnknownContract(_)
                | Self::Api {
                    status_code: 404,
                    ..
                }
        )
    }

    /// Returns a sanitized version of the error message safe for logging.
    ///
    /// Control characters are stripped, very long messages are truncated and
    /// messages that look like they carry key material are redacted.
    pub fn sanitized_message(&self) -> String {
        Self::sanitize_string(&self.to_string())
    }

    fn sanitize_string(s: &str) -> String {
        let cleaned: String = s
            .chars()
            .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
            .collect();

        let lower = cleaned.to_lowercase();
        for pattern in SENSITIVE_PATTERNS {
            if lower.contains(pattern) {
                return format!("[REDACTED: message contained sensitive pattern '{pattern}']");
            }
        }

        if cleaned.len() > MAX_ERROR_MESSAGE_LENGTH {
            let cut = cleaned
                .char_indices()
                .map(|(i, _)| i)
                .take_while(|i| *i <= MAX_ERROR_MESSAGE_LENGTH)
                .last()
                .unwrap_or(0);
            format!(
                "{}... [truncated, total length: {}]",
                &cleaned[..cut],
                cleaned.len()
            )
        } else {
            cleaned
        }
    }
}
