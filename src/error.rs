//! Error handling and custom error types
//!
//! Provides unified error handling across the crate using thiserror. Provider
//! failures are carried as a classified [`ProviderError`] so callers can pick a
//! remediation without re-parsing messages.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success response from the provider, before classification.
    #[error("Gemini API error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("{0}")]
    Provider(#[from] ProviderError),

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Capture error: {0}")]
    Capture(String),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] dotenvy::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Prompt must contain text or an image")]
    EmptyPrompt,

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Invariant violation: {0}")]
    Invariant(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Remediation class of a provider failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    /// The credential lacks billing-enabled access; credential selection must be reopened.
    AuthorizationRequired,
    /// The requested model or entity does not exist for this credential.
    NotFound,
    Generic,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub message: String,
}

impl ProviderError {
    pub fn new(kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn generic(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Generic, message)
    }

    pub fn requires_credential(&self) -> bool {
        self.kind == ProviderErrorKind::AuthorizationRequired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_error_displays_message_only() {
        let err = Error::from(ProviderError::generic("quota exceeded"));
        assert_eq!(err.to_string(), "quota exceeded");
    }

    #[test]
    fn test_api_error_display_includes_status() {
        let err = Error::Api {
            status: 429,
            body: "slow down".to_string(),
        };
        assert_eq!(err.to_string(), "Gemini API error (status 429): slow down");
    }

    #[test]
    fn test_requires_credential() {
        assert!(
            ProviderError::new(ProviderErrorKind::AuthorizationRequired, "x").requires_credential()
        );
        assert!(!ProviderError::generic("x").requires_credential());
    }
}
