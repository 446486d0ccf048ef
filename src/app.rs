//! Panel-level flows over the provider services.
//!
//! Each method covers one user interaction: it validates input, calls the
//! matching service, and turns the result into the state a panel renders.

use crate::ai::{
    ChatService, CredentialSelector, EnvCredentialSelector, GeminiChatClient, GeminiImageClient,
    GeminiMapsClient, GeminiNamingClient, GeminiVideoClient, ImageGenerationService,
    LocationSearchService, NamingService, VideoGenerationService,
};
use crate::models::{
    BusinessIdea, ChatMessage, ChatSession, Config, GenerationResult, ImageAttachment,
    PlaceSearch, Prompt, Role,
};
use crate::{prompts, Error, Result};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Text recorded for a chat message that only carries an image.
pub const IMAGE_ONLY_MESSAGE: &str = "Analyze this image";
pub const BILLING_REQUIRED_MESSAGE: &str = "Billing Required: To use the 3D Video Maker, you must select an API Key linked to a Google Cloud Project with billing enabled.";
pub const UNEXPECTED_ERROR_MESSAGE: &str = "An unexpected error occurred. Please try again.";
pub const HAIRSTYLE_NO_RESULT_MESSAGE: &str =
    "Could not generate image. Please try a different prompt.";
pub const HAIRSTYLE_FAILED_MESSAGE: &str = "Something went wrong with the image generation.";

/// What a media panel shows once a generation attempt settles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaOutcome {
    Ready(GenerationResult),
    /// The provider answered without producing media.
    NoResult { message: String },
    Failed {
        message: String,
        /// The panel should offer credential re-selection.
        needs_credential: bool,
    },
}

impl MediaOutcome {
    fn no_result(kind: &str) -> Self {
        Self::NoResult {
            message: format!("Failed to generate {}. Please try a different prompt.", kind),
        }
    }

    fn from_error(error: Error) -> Self {
        match error {
            Error::Provider(p) if p.requires_credential() => Self::Failed {
                message: BILLING_REQUIRED_MESSAGE.to_string(),
                needs_credential: true,
            },
            other => {
                let message = other.to_string();
                Self::Failed {
                    message: if message.trim().is_empty() {
                        UNEXPECTED_ERROR_MESSAGE.to_string()
                    } else {
                        message
                    },
                    needs_credential: false,
                }
            }
        }
    }
}

/// Routes panel interactions to the provider services.
pub struct App {
    chat: Box<dyn ChatService>,
    image_gen: Box<dyn ImageGenerationService>,
    video: Box<dyn VideoGenerationService>,
    maps: Box<dyn LocationSearchService>,
    naming: Box<dyn NamingService>,
    map_city: String,
}

/// Injectable service bundle used to construct [`App`] in tests/harnesses.
pub struct AppServices {
    pub chat: Box<dyn ChatService>,
    pub image_gen: Box<dyn ImageGenerationService>,
    pub video: Box<dyn VideoGenerationService>,
    pub maps: Box<dyn LocationSearchService>,
    pub naming: Box<dyn NamingService>,
}

impl App {
    /// Build an app from concrete service dependencies.
    ///
    /// This is primarily useful for integration tests and local harnesses that
    /// need to inject mocks.
    pub fn with_services(services: AppServices, map_city: String) -> Self {
        Self {
            chat: services.chat,
            image_gen: services.image_gen,
            video: services.video,
            maps: services.maps,
            naming: services.naming,
            map_city,
        }
    }

    /// Construct the Gemini-backed app from configuration.
    pub fn new(config: &Config) -> Self {
        // Reuse one HTTP connection pool across provider clients.
        let http_client = reqwest::Client::new();
        let credentials: Arc<dyn CredentialSelector> =
            Arc::new(EnvCredentialSelector::new(&config.api_key));

        info!("Chat provider: Gemini (model: {})", config.chat_model);
        info!("Image provider: Gemini (model: {})", config.image_model);
        info!(
            "Video provider: Gemini (model: {}, poll every {:?})",
            config.video_model, config.video_poll_interval
        );

        let video = GeminiVideoClient::new_with_client(
            config.api_key.clone(),
            config.video_model.clone(),
            http_client.clone(),
            credentials,
            config.output_dir.clone(),
        )
        .with_poll_interval(config.video_poll_interval);

        Self::with_services(
            AppServices {
                chat: Box::new(GeminiChatClient::new_with_client(
                    config.api_key.clone(),
                    config.chat_model.clone(),
                    http_client.clone(),
                )),
                image_gen: Box::new(GeminiImageClient::new_with_client(
                    config.api_key.clone(),
                    config.image_model.clone(),
                    http_client.clone(),
                )),
                video: Box::new(video),
                maps: Box::new(GeminiMapsClient::new_with_client(
                    config.api_key.clone(),
                    config.chat_model.clone(),
                    http_client.clone(),
                )),
                naming: Box::new(GeminiNamingClient::new_with_client(
                    config.api_key.clone(),
                    config.chat_model.clone(),
                    http_client,
                )),
            },
            config.map_city.clone(),
        )
    }

    /// Append the user's message and the assistant's reply to `session`.
    ///
    /// Returns the reply. Only an empty prompt is an error; provider trouble
    /// shows up as fallback text in the reply.
    pub async fn send_chat<'a>(
        &self,
        session: &'a mut ChatSession,
        prompt: Prompt,
    ) -> Result<&'a ChatMessage> {
        prompt.validate()?;

        let text = match prompt.text.trim() {
            "" => IMAGE_ONLY_MESSAGE.to_string(),
            trimmed => trimmed.to_string(),
        };

        // The user's turn is recorded before the reply arrives.
        let reply = {
            let user = session.push(ChatMessage::new(Role::User, text, prompt.image));
            self.chat.chat(&user.text, user.image.as_ref()).await
        };
        Ok(session.push(ChatMessage::new(Role::Model, reply, None)))
    }

    /// Stylist read of a captured face: face shape, texture and cut suggestions.
    pub async fn analyze_hairstyle(&self, image: &ImageAttachment) -> String {
        self.chat.chat(prompts::HAIR_ANALYSIS, Some(image)).await
    }

    /// Render the captured face with a new hairstyle.
    pub async fn try_hairstyle(&self, image: &ImageAttachment, style: &str) -> Result<MediaOutcome> {
        let style = non_empty(style)?;

        Ok(match self.image_gen.edit_image(image, style).await {
            Ok(Some(data_uri)) => MediaOutcome::Ready(GenerationResult::Image { data_uri }),
            Ok(None) => MediaOutcome::NoResult {
                message: HAIRSTYLE_NO_RESULT_MESSAGE.to_string(),
            },
            Err(e) => {
                error!("Hairstyle edit failed: {}", e);
                MediaOutcome::Failed {
                    message: HAIRSTYLE_FAILED_MESSAGE.to_string(),
                    needs_credential: false,
                }
            }
        })
    }

    pub async fn generate_image(&self, prompt: &str) -> Result<MediaOutcome> {
        let prompt = non_empty(prompt)?;

        Ok(match self.image_gen.generate_image(prompt).await {
            Ok(Some(data_uri)) => MediaOutcome::Ready(GenerationResult::Image { data_uri }),
            Ok(None) => MediaOutcome::no_result("image"),
            Err(e) => {
                warn!("Image generation failed: {}", e);
                MediaOutcome::from_error(e)
            }
        })
    }

    /// Generate a video. Cancellation is returned as `Error::Cancelled`
    /// rather than as a panel state.
    pub async fn generate_video(
        &self,
        prompt: &str,
        cancel: &CancellationToken,
    ) -> Result<MediaOutcome> {
        let prompt = non_empty(prompt)?;

        match self.video.generate_video(prompt, cancel).await {
            Ok(handle) => Ok(MediaOutcome::Ready(GenerationResult::Video(handle))),
            Err(Error::Cancelled) => Err(Error::Cancelled),
            Err(e) => {
                warn!("Video generation failed: {}", e);
                Ok(MediaOutcome::from_error(e))
            }
        }
    }

    /// Bias a place query towards the configured city unless it already names it.
    pub fn bias_query(&self, query: &str) -> String {
        let query = query.trim();
        if query
            .to_lowercase()
            .contains(&self.map_city.to_lowercase())
        {
            query.to_string()
        } else {
            format!("{} in {}", query, self.map_city)
        }
    }

    pub async fn search_places(&self, query: &str) -> Result<PlaceSearch> {
        let query = non_empty(query)?;
        let prompt = self.bias_query(query);
        info!("Searching places: {}", prompt);
        self.maps.search_locations(&prompt).await
    }

    pub async fn generate_names(&self, topic: &str) -> Result<Vec<BusinessIdea>> {
        let topic = non_empty(topic)?;
        let ideas = self.naming.generate_business_ideas(topic).await?;
        info!("Generated {} business ideas for '{}'", ideas.len(), topic);
        Ok(ideas)
    }
}

fn non_empty(input: &str) -> Result<&str> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        Err(Error::EmptyPrompt)
    } else {
        Ok(trimmed)
    }
}
