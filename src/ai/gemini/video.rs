//! Veo video generation.
//!
//! Submission returns an operation handle, the [`OperationPoller`] drives it to
//! completion, and the finished file is downloaded into the output directory.
//! Authorization failures reopen credential selection once per failure.

use super::client::GeminiHttpClient;
use super::types::Operation;
use crate::ai::classify::{self, CallPath};
use crate::ai::{CredentialSelector, OperationPoller, OperationSource, VideoGenerationService};
use crate::models::VideoHandle;
use crate::{prompts, Error, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Serialize)]
struct PredictRequest {
    instances: Vec<VideoInstance>,
    parameters: VideoParameters,
}

#[derive(Debug, Serialize)]
struct VideoInstance {
    prompt: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VideoParameters {
    sample_count: u32,
    resolution: String,
    aspect_ratio: String,
}

pub struct GeminiVideoClient {
    http: GeminiHttpClient,
    credentials: Arc<dyn CredentialSelector>,
    poller: OperationPoller,
    output_dir: PathBuf,
}

impl GeminiVideoClient {
    pub fn new(
        api_key: String,
        model: String,
        credentials: Arc<dyn CredentialSelector>,
        output_dir: PathBuf,
    ) -> Self {
        Self::new_with_client(
            api_key,
            model,
            reqwest::Client::new(),
            credentials,
            output_dir,
        )
    }

    pub fn new_with_client(
        api_key: String,
        model: String,
        client: reqwest::Client,
        credentials: Arc<dyn CredentialSelector>,
        output_dir: PathBuf,
    ) -> Self {
        Self {
            http: GeminiHttpClient::new_with_client(
                api_key,
                model,
                Duration::from_secs(60),
                client,
            ),
            credentials,
            poller: OperationPoller::default(),
            output_dir,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poller = OperationPoller::new(interval);
        self
    }

    async fn render(&self, prompt: &str, cancel: &CancellationToken) -> Result<VideoHandle> {
        let request = PredictRequest {
            instances: vec![VideoInstance {
                prompt: prompts::render(prompts::VIDEO, &[("prompt", prompt)]),
            }],
            parameters: VideoParameters {
                sample_count: 1,
                resolution: "720p".to_string(),
                aspect_ratio: "16:9".to_string(),
            },
        };

        let operation = self.http.predict_long_running(&request).await?;
        info!(
            "Submitted video job {} to {}",
            operation.name,
            self.http.model()
        );

        let locator = self.poller.wait_for_video(self, operation, cancel).await?;
        let bytes = self.http.download(&locator).await?;
        self.materialize(locator, bytes).await
    }

    async fn materialize(&self, source_uri: String, bytes: Vec<u8>) -> Result<VideoHandle> {
        tokio::fs::create_dir_all(&self.output_dir).await?;
        let path = self.output_dir.join(format!("video_{}.mp4", Uuid::new_v4()));
        tokio::fs::write(&path, &bytes).await?;
        info!("Saved video ({} bytes) to {}", bytes.len(), path.display());

        Ok(VideoHandle {
            source_uri,
            path,
            size_bytes: bytes.len(),
        })
    }

    async fn reopen_credentials(&self) {
        if let Err(e) = self.credentials.open_selection().await {
            warn!("Failed to open credential selection: {}", e);
        }
    }
}

#[cfg(test)]
super::impl_with_gemini_base_url!(GeminiVideoClient);

#[async_trait]
impl OperationSource for GeminiVideoClient {
    async fn fetch_operation(&self, operation: &Operation) -> Result<Operation> {
        self.http.get_operation(&operation.name).await
    }
}

#[async_trait]
impl VideoGenerationService for GeminiVideoClient {
    async fn generate_video(
        &self,
        prompt: &str,
        cancel: &CancellationToken,
    ) -> Result<VideoHandle> {
        if !self.credentials.has_selected_credential().await {
            info!("No credential selected for video generation; opening selection");
            self.reopen_credentials().await;
        }

        match self.render(prompt, cancel).await {
            Ok(handle) => Ok(handle),
            Err(Error::Cancelled) => Err(Error::Cancelled),
            Err(e) => {
                let classified = classify::classify(&e, CallPath::Video);
                if classified.requires_credential() {
                    warn!(
                        "Veo authorization/model access issue detected: {}",
                        classified.message
                    );
                    self.reopen_credentials().await;
                } else {
                    tracing::error!("Veo request failed: {}", classified.message);
                }
                Err(Error::Provider(classified))
            }
        }
    }
}
