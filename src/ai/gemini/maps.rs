use super::client::GeminiHttpClient;
use super::types::{Content, GenerateContentResponse, Part};
use crate::ai::classify::{self, CallPath};
use crate::ai::{normalize, LocationSearchService};
use crate::error::ProviderError;
use crate::models::PlaceSearch;
use crate::Result;
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

pub const SEARCH_FAILED: &str = "Failed to search locations.";
const DEFAULT_SEARCH_TEXT: &str = "Found some locations for you.";

#[derive(Debug, Serialize)]
struct SearchRequest {
    contents: Vec<Content>,
    tools: Vec<Tool>,
}

#[derive(Debug, Serialize)]
struct Tool {
    #[serde(rename = "googleMaps")]
    google_maps: GoogleMaps,
}

#[derive(Debug, Serialize)]
struct GoogleMaps {}

/// Location search grounded with the Google Maps tool.
pub struct GeminiMapsClient {
    http: GeminiHttpClient,
}

impl GeminiMapsClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self::new_with_client(api_key, model, reqwest::Client::new())
    }

    pub fn new_with_client(api_key: String, model: String, client: reqwest::Client) -> Self {
        Self {
            http: GeminiHttpClient::new_with_client(
                api_key,
                model,
                Duration::from_secs(60),
                client,
            ),
        }
    }
}

#[cfg(test)]
super::impl_with_gemini_base_url!(GeminiMapsClient);

#[async_trait]
impl LocationSearchService for GeminiMapsClient {
    async fn search_locations(&self, prompt: &str) -> Result<PlaceSearch> {
        let request = SearchRequest {
            contents: vec![Content::user(vec![Part::text(prompt)])],
            tools: vec![Tool {
                google_maps: GoogleMaps {},
            }],
        };

        let response: GenerateContentResponse =
            self.http.generate_content(&request).await.map_err(|e| {
                let classified = classify::classify(&e, CallPath::Content);
                tracing::error!("Error searching maps: {}", classified.message);
                ProviderError::new(classified.kind, SEARCH_FAILED)
            })?;

        let locations = normalize::map_locations(&response);
        tracing::debug!("Maps search returned {} locations", locations.len());

        Ok(PlaceSearch {
            text: normalize::response_text(&response)
                .unwrap_or_else(|| DEFAULT_SEARCH_TEXT.to_string()),
            locations,
        })
    }
}
