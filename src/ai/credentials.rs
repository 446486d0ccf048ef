//! Credential-selection side channel.
//!
//! The host environment decides which provider credential is active. Clients
//! receive this capability at construction instead of looking it up globally.

use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait CredentialSelector: Send + Sync {
    /// Whether the user has picked a credential for billed capabilities.
    async fn has_selected_credential(&self) -> bool;

    /// Prompt the user to (re)select a credential.
    async fn open_selection(&self) -> Result<()>;
}

/// Selector backed by process configuration. There is no interactive picker,
/// so opening selection tells the operator which variable to change.
pub struct EnvCredentialSelector {
    configured: bool,
}

impl EnvCredentialSelector {
    pub fn new(api_key: &str) -> Self {
        Self {
            configured: !api_key.trim().is_empty(),
        }
    }
}

#[async_trait]
impl CredentialSelector for EnvCredentialSelector {
    async fn has_selected_credential(&self) -> bool {
        self.configured
    }

    async fn open_selection(&self) -> Result<()> {
        tracing::warn!(
            "Video generation needs an API key from a Google Cloud project with billing enabled. \
             Set GEMINI_API_KEY to such a key and retry."
        );
        Ok(())
    }
}
