use super::client::GeminiHttpClient;
use super::types::{Content, GenerateContentResponse, Part};
use crate::ai::classify::{self, CallPath};
use crate::ai::{normalize, ImageGenerationService};
use crate::models::ImageAttachment;
use crate::{prompts, Error, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Serialize)]
struct ImageRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: ImageGenerationConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageGenerationConfig {
    response_modalities: Vec<String>,
}

impl ImageRequest {
    fn new(parts: Vec<Part>) -> Self {
        Self {
            contents: vec![Content::user(parts)],
            generation_config: ImageGenerationConfig {
                response_modalities: vec!["TEXT".to_string(), "IMAGE".to_string()],
            },
        }
    }
}

pub struct GeminiImageClient {
    http: GeminiHttpClient,
}

impl GeminiImageClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self::new_with_client(api_key, model, reqwest::Client::new())
    }

    pub fn new_with_client(api_key: String, model: String, client: reqwest::Client) -> Self {
        Self {
            http: GeminiHttpClient::new_with_client(
                api_key,
                model,
                Duration::from_secs(120),
                client,
            ),
        }
    }

    async fn request_image(&self, request: ImageRequest, action: &str) -> Result<Option<String>> {
        let response: GenerateContentResponse = self
            .http
            .generate_content(&request)
            .await
            .map_err(|e| Error::Provider(classify::classify(&e, CallPath::Content)))?;

        let image = normalize::first_inline_image(&response);
        if image.is_none() {
            tracing::warn!("Gemini {} response contained no image data", action);
        }
        Ok(image)
    }
}

#[cfg(test)]
super::impl_with_gemini_base_url!(GeminiImageClient);

#[async_trait]
impl ImageGenerationService for GeminiImageClient {
    async fn generate_image(&self, prompt: &str) -> Result<Option<String>> {
        tracing::debug!("Requesting image generation from {}", self.http.model());
        self.request_image(ImageRequest::new(vec![Part::text(prompt)]), "image")
            .await
    }

    async fn edit_image(&self, image: &ImageAttachment, style: &str) -> Result<Option<String>> {
        tracing::debug!("Requesting hairstyle edit from {}", self.http.model());
        let instruction = prompts::render(prompts::HAIR_EDIT, &[("style", style)]);
        let request = ImageRequest::new(vec![
            Part::inline(&image.mime_type, &image.data),
            Part::text(instruction),
        ]);
        self.request_image(request, "edit").await
    }
}
