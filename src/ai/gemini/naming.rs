use super::client::GeminiHttpClient;
use super::types::{Content, GenerateContentResponse, Part};
use crate::ai::classify::{self, CallPath};
use crate::ai::{normalize, NamingService};
use crate::models::BusinessIdea;
use crate::{prompts, Error, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Serialize)]
struct NamingRequest {
    contents: Vec<Content>,
}

/// Business name and slogan brainstorming.
pub struct GeminiNamingClient {
    http: GeminiHttpClient,
}

impl GeminiNamingClient {
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
}

#[cfg(test)]
super::impl_with_gemini_base_url!(GeminiNamingClient);

#[async_trait]
impl NamingService for GeminiNamingClient {
    async fn generate_business_ideas(&self, topic: &str) -> Result<Vec<BusinessIdea>> {
        let request = NamingRequest {
            contents: vec![Content::user(vec![Part::text(prompts::render(
                prompts::BUSINESS_NAMES,
                &[("topic", topic)],
            ))])],
        };

        let response: GenerateContentResponse = self
            .http
            .generate_content(&request)
            .await
            .map_err(|e| Error::Provider(classify::classify(&e, CallPath::Content)))?;

        let text = normalize::response_text(&response).unwrap_or_else(|| "[]".to_string());
        Ok(normalize::parse_business_ideas(&text))
    }
}
