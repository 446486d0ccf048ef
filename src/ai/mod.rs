//! Generative AI integration
//!
//! Capability traits for each panel-facing operation, the Gemini REST
//! implementations, and the shared poller, normalizer and error classifier.

pub mod classify;
pub mod credentials;
pub mod gemini;
pub mod mock;
pub mod normalize;
pub mod poller;

pub use credentials::{CredentialSelector, EnvCredentialSelector};
pub use gemini::{
    GeminiChatClient, GeminiImageClient, GeminiMapsClient, GeminiNamingClient, GeminiVideoClient,
};
pub use mock::{
    MockChatClient, MockCredentialSelector, MockImageClient, MockMapsClient, MockNamingClient,
    MockVideoClient,
};
pub use poller::{OperationPoller, OperationSource};

use crate::models::{BusinessIdea, ImageAttachment, PlaceSearch, VideoHandle};
use crate::Result;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Persona chat. Infallible by contract: failures become a fallback reply.
#[async_trait]
pub trait ChatService: Send + Sync {
    async fn chat(&self, text: &str, image: Option<&ImageAttachment>) -> String;
}

/// Image generation and editing. `Ok(None)` means the provider produced no image.
#[async_trait]
pub trait ImageGenerationService: Send + Sync {
    async fn generate_image(&self, prompt: &str) -> Result<Option<String>>;
    async fn edit_image(&self, image: &ImageAttachment, style: &str) -> Result<Option<String>>;
}

#[async_trait]
pub trait VideoGenerationService: Send + Sync {
    async fn generate_video(&self, prompt: &str, cancel: &CancellationToken)
        -> Result<VideoHandle>;
}

#[async_trait]
pub trait LocationSearchService: Send + Sync {
    async fn search_locations(&self, prompt: &str) -> Result<PlaceSearch>;
}

#[async_trait]
pub trait NamingService: Send + Sync {
    async fn generate_business_ideas(&self, topic: &str) -> Result<Vec<BusinessIdea>>;
}
