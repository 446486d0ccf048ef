use super::client::GeminiHttpClient;
use super::types::{Content, GenerateContentResponse, Part};
use crate::ai::{normalize, ChatService};
use crate::models::ImageAttachment;
use crate::{prompts, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

/// Reply used when the provider answered without any text.
pub const EMPTY_REPLY_FALLBACK: &str =
    "I apologize, but I couldn't generate a response at this time.";
/// Reply used when the provider call failed.
pub const FAILURE_REPLY_FALLBACK: &str =
    "Sorry, I am having trouble connecting to the server right now. Please try again later.";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ChatRequest {
    system_instruction: Content,
    contents: Vec<Content>,
}

pub struct GeminiChatClient {
    http: GeminiHttpClient,
}

impl GeminiChatClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self::new_with_client(api_key, model, reqwest::Client::new())
    }

    pub fn new_with_client(api_key: String, model: String, client: reqwest::Client) -> Self {
        Self {
            http: GeminiHttpClient::new_with_client(
                api_key,
                model,
                Duration::from_secs(30),
                client,
            ),
        }
    }

    fn build_request(text: &str, image: Option<&ImageAttachment>) -> ChatRequest {
        let parts = match image {
            Some(image) => {
                let text = if text.trim().is_empty() {
                    prompts::IMAGE_ONLY_CHAT
                } else {
                    text
                };
                vec![
                    Part::inline(&image.mime_type, &image.data),
                    Part::text(text),
                ]
            }
            None => vec![Part::text(text)],
        };

        ChatRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part::text(prompts::CHAT_SYSTEM)],
            },
            contents: vec![Content::user(parts)],
        }
    }

    async fn complete(&self, text: &str, image: Option<&ImageAttachment>) -> Result<Option<String>> {
        let request = Self::build_request(text, image);
        let response: GenerateContentResponse = self.http.generate_content(&request).await?;
        Ok(normalize::response_text(&response))
    }
}

#[cfg(test)]
super::impl_with_gemini_base_url!(GeminiChatClient);

#[async_trait]
impl ChatService for GeminiChatClient {
    async fn chat(&self, text: &str, image: Option<&ImageAttachment>) -> String {
        tracing::debug!(
            "Sending chat request ({} chars, image: {})",
            text.len(),
            image.is_some()
        );

        match self.complete(text, image).await {
            Ok(Some(reply)) => reply,
            Ok(None) => {
                tracing::warn!("Gemini chat returned no text");
                EMPTY_REPLY_FALLBACK.to_string()
            }
            Err(e) => {
                tracing::error!("Error communicating with Gemini: {}", e);
                FAILURE_REPLY_FALLBACK.to_string()
            }
        }
    }
}
