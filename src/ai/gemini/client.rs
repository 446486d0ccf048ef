use super::types::Operation;
use crate::{Error, Result};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Lightweight Gemini REST client shared by the content, search and video modules.
pub struct GeminiHttpClient {
    pub(crate) client: Client,
    pub(crate) api_key: String,
    model: String,
    pub(crate) base_url: String,
    timeout: Duration,
}

impl GeminiHttpClient {
    /// Construct a Gemini client.
    ///
    /// `model` should be the bare model ID (for example `gemini-2.5-flash`),
    /// not a `models/...`-prefixed path segment.
    pub fn new(api_key: String, model: String, timeout: Duration) -> Self {
        Self::new_with_client(api_key, model, timeout, Client::new())
    }

    pub fn new_with_client(
        api_key: String,
        model: String,
        timeout: Duration,
        client: Client,
    ) -> Self {
        let model = model.strip_prefix("models/").unwrap_or(&model).to_string();

        Self {
            client,
            api_key,
            model,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout,
        }
    }

    #[cfg(test)]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    /// Returns the configured model ID without the `models/` prefix.
    pub fn model(&self) -> &str {
        &self.model
    }

    async fn read_response<Resp: DeserializeOwned>(response: reqwest::Response) -> Result<Resp> {
        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.map_err(reqwest::Error::without_url)?;
            tracing::error!("Gemini API error (status {}): {}", status, error_text);
            return Err(Error::Api {
                status: status.as_u16(),
                body: error_text,
            });
        }

        let body = response.text().await.map_err(reqwest::Error::without_url)?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!("Failed to parse Gemini response: {}\nBody: {}", e, body);
            e.into()
        })
    }

    async fn post_to_url<Req: Serialize, Resp: DeserializeOwned>(
        &self,
        url: String,
        request: &Req,
    ) -> Result<Resp> {
        let response = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| {
                let e = e.without_url();
                tracing::error!("Failed to send request to Gemini: {}", e);
                e
            })?;

        Self::read_response(response).await
    }

    /// Calls Gemini's `generateContent` endpoint for chat, image, search and naming requests.
    pub async fn generate_content<Req: Serialize, Resp: DeserializeOwned>(
        &self,
        request: &Req,
    ) -> Result<Resp> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );
        self.post_to_url(url, request).await
    }

    /// Submits a long-running job (video generation) and returns its operation handle.
    pub async fn predict_long_running<Req: Serialize>(&self, request: &Req) -> Result<Operation> {
        let url = format!(
            "{}/v1beta/models/{}:predictLongRunning",
            self.base_url, self.model
        );
        self.post_to_url(url, request).await
    }

    /// Re-fetches an operation by its handle.
    pub async fn get_operation(&self, name: &str) -> Result<Operation> {
        let url = format!("{}/v1beta/{}", self.base_url, name.trim_start_matches('/'));
        let response = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await
            .map_err(|e| {
                let e = e.without_url();
                tracing::error!("Failed to poll Gemini operation {}: {}", name, e);
                e
            })?;

        Self::read_response(response).await
    }

    /// Downloads a generated file. The credential travels as a `key` query parameter,
    /// so the keyed URL is stripped from every error before it is logged or returned.
    pub async fn download(&self, uri: &str) -> Result<Vec<u8>> {
        let url = with_key_param(uri, &self.api_key);
        let response = self.client.get(&url).send().await.map_err(|e| {
            let e = e.without_url();
            tracing::error!("Failed to download generated file from {}: {}", uri, e);
            e
        })?;

        if !response.status().is_success() {
            let status = response.status();
            tracing::error!("Generated file download failed (status {})", status);
            return Err(Error::Api {
                status: status.as_u16(),
                body: format!(
                    "Failed to download video: {} - Requested entity was not found.",
                    status
                ),
            });
        }

        Ok(response
            .bytes()
            .await
            .map_err(reqwest::Error::without_url)?
            .to_vec())
    }
}

fn with_key_param(uri: &str, api_key: &str) -> String {
    let separator = if uri.contains('?') { '&' } else { '?' };
    format!("{}{}key={}", uri, separator, api_key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_with_key_param_picks_separator() {
        assert_eq!(
            with_key_param("https://x/video", "k"),
            "https://x/video?key=k"
        );
        assert_eq!(
            with_key_param("https://x/video?alt=media", "k"),
            "https://x/video?alt=media&key=k"
        );
    }

    #[test]
    fn test_model_prefix_is_stripped() {
        let client = GeminiHttpClient::new(
            "k".to_string(),
            "models/gemini-2.5-flash".to_string(),
            Duration::from_secs(1),
        );
        assert_eq!(client.model(), "gemini-2.5-flash");
    }

    #[tokio::test]
    async fn test_get_operation_sends_api_key_header() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1beta/models/veo/operations/op-1"))
            .and(header("x-goog-api-key", "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "name": "models/veo/operations/op-1",
                "done": true
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = GeminiHttpClient::new(
            "secret".to_string(),
            "veo".to_string(),
            Duration::from_secs(5),
        )
        .with_base_url(server.uri());

        let op = client
            .get_operation("models/veo/operations/op-1")
            .await
            .unwrap();
        assert!(op.done);
    }

    #[tokio::test]
    async fn test_error_status_is_preserved() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1beta/operations/gone"))
            .respond_with(ResponseTemplate::new(404).set_body_string("missing"))
            .mount(&server)
            .await;

        let client = GeminiHttpClient::new("k".to_string(), "veo".to_string(), Duration::from_secs(5))
            .with_base_url(server.uri());

        let err = client.get_operation("operations/gone").await.unwrap_err();
        assert!(matches!(err, Error::Api { status: 404, ref body } if body == "missing"));
    }

    #[tokio::test]
    async fn test_download_appends_key_query_param() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/files/video.mp4"))
            .and(query_param("key", "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1u8, 2, 3]))
            .expect(1)
            .mount(&server)
            .await;

        let client = GeminiHttpClient::new(
            "secret".to_string(),
            "veo".to_string(),
            Duration::from_secs(5),
        );

        let bytes = client
            .download(&format!("{}/files/video.mp4", server.uri()))
            .await
            .unwrap();
        assert_eq!(bytes, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_download_failure_is_api_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/files/video.mp4"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let client =
            GeminiHttpClient::new("k".to_string(), "veo".to_string(), Duration::from_secs(5));

        let err = client
            .download(&format!("{}/files/video.mp4", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Api { status: 403, .. }));
    }

    #[tokio::test]
    async fn test_download_transport_error_hides_key() {
        let client = GeminiHttpClient::new(
            "SUPERSECRETKEY".to_string(),
            "veo".to_string(),
            Duration::from_secs(5),
        );

        let err = client
            .download("http://127.0.0.1:1/files/video")
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Http(_)));
        let text = format!("{} {:?}", err, err);
        assert!(!text.contains("SUPERSECRETKEY"), "key leaked: {}", text);
    }
}
