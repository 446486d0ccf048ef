use super::{
    ChatService, CredentialSelector, ImageGenerationService, LocationSearchService, NamingService,
    VideoGenerationService,
};
use crate::error::ProviderError;
use crate::models::{BusinessIdea, ImageAttachment, MapLocation, PlaceSearch, VideoHandle};
use crate::{Error, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

/// A 1x1 PNG, base64 encoded.
pub const MOCK_PNG_BASE64: &str =
    "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAIAAACQd1PeAAAADElEQVR4nGP4z8AAAAMBAQDJ/pLvAAAAAElFTkSuQmCC";

fn next_scripted<T: Clone>(responses: &[T], count: usize) -> Option<T> {
    if responses.is_empty() {
        None
    } else {
        Some(responses[(count - 1) % responses.len()].clone())
    }
}

#[derive(Clone)]
pub struct MockChatClient {
    responses: Arc<Mutex<Vec<String>>>,
    requests: Arc<Mutex<Vec<(String, bool)>>>,
    call_count: Arc<Mutex<usize>>,
}

impl MockChatClient {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
            call_count: Arc::new(Mutex::new(0)),
        }
    }

    pub fn with_response(self, response: impl Into<String>) -> Self {
        self.responses.lock().unwrap().push(response.into());
        self
    }

    pub fn get_call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    /// Text of each request plus whether an image was attached.
    pub fn requests(&self) -> Vec<(String, bool)> {
        self.requests.lock().unwrap().clone()
    }
}

impl Default for MockChatClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatService for MockChatClient {
    async fn chat(&self, text: &str, image: Option<&ImageAttachment>) -> String {
        let mut count = self.call_count.lock().unwrap();
        *count += 1;
        self.requests
            .lock()
            .unwrap()
            .push((text.to_string(), image.is_some()));

        let responses = self.responses.lock().unwrap();
        next_scripted(&responses, *count).unwrap_or_else(|| format!("You said: {}", text))
    }
}

type ImageResponse = std::result::Result<Option<String>, ProviderError>;

#[derive(Clone)]
pub struct MockImageClient {
    responses: Arc<Mutex<Vec<ImageResponse>>>,
    styles: Arc<Mutex<Vec<String>>>,
    call_count: Arc<Mutex<usize>>,
}

impl MockImageClient {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            styles: Arc::new(Mutex::new(Vec::new())),
            call_count: Arc::new(Mutex::new(0)),
        }
    }

    pub fn with_image_response(self, data_uri: impl Into<String>) -> Self {
        self.responses.lock().unwrap().push(Ok(Some(data_uri.into())));
        self
    }

    /// The provider answered but produced no image.
    pub fn with_empty_response(self) -> Self {
        self.responses.lock().unwrap().push(Ok(None));
        self
    }

    pub fn with_error(self, error: ProviderError) -> Self {
        self.responses.lock().unwrap().push(Err(error));
        self
    }

    pub fn get_call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    /// Styles requested through `edit_image`, in call order.
    pub fn edited_styles(&self) -> Vec<String> {
        self.styles.lock().unwrap().clone()
    }

    fn respond(&self) -> Result<Option<String>> {
        let mut count = self.call_count.lock().unwrap();
        *count += 1;

        let responses = self.responses.lock().unwrap();
        match next_scripted(&responses, *count) {
            Some(response) => response.map_err(Error::Provider),
            None => Ok(Some(format!("data:image/png;base64,{}", MOCK_PNG_BASE64))),
        }
    }
}

impl Default for MockImageClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageGenerationService for MockImageClient {
    async fn generate_image(&self, _prompt: &str) -> Result<Option<String>> {
        self.respond()
    }

    async fn edit_image(&self, _image: &ImageAttachment, style: &str) -> Result<Option<String>> {
        self.styles.lock().unwrap().push(style.to_string());
        self.respond()
    }
}

#[derive(Clone)]
pub struct MockVideoClient {
    error: Arc<Mutex<Option<ProviderError>>>,
    credentials: Option<Arc<dyn CredentialSelector>>,
    call_count: Arc<Mutex<usize>>,
}

impl MockVideoClient {
    pub fn new() -> Self {
        Self {
            error: Arc::new(Mutex::new(None)),
            credentials: None,
            call_count: Arc::new(Mutex::new(0)),
        }
    }

    pub fn with_error(self, error: ProviderError) -> Self {
        *self.error.lock().unwrap() = Some(error);
        self
    }

    /// Reopen selection on authorization failures, like the real client.
    pub fn with_credentials(mut self, credentials: Arc<dyn CredentialSelector>) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn get_call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }
}

impl Default for MockVideoClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VideoGenerationService for MockVideoClient {
    async fn generate_video(
        &self,
        prompt: &str,
        cancel: &CancellationToken,
    ) -> Result<VideoHandle> {
        *self.call_count.lock().unwrap() += 1;

        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let error = self.error.lock().unwrap().clone();
        if let Some(error) = error {
            if error.requires_credential() {
                if let Some(credentials) = &self.credentials {
                    credentials.open_selection().await?;
                }
            }
            return Err(Error::Provider(error));
        }

        Ok(VideoHandle {
            source_uri: format!("mock://video/{}", prompt.len()),
            path: PathBuf::from("mock_video.mp4"),
            size_bytes: 0,
        })
    }
}

#[derive(Clone)]
pub struct MockMapsClient {
    response: Arc<Mutex<PlaceSearch>>,
    error: Arc<Mutex<Option<ProviderError>>>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl MockMapsClient {
    pub fn new() -> Self {
        Self {
            response: Arc::new(Mutex::new(PlaceSearch {
                text: "Found some locations for you.".to_string(),
                locations: Vec::new(),
            })),
            error: Arc::new(Mutex::new(None)),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_location(self, title: &str, uri: &str) -> Self {
        self.response.lock().unwrap().locations.push(MapLocation {
            title: title.to_string(),
            uri: uri.to_string(),
        });
        self
    }

    pub fn with_text(self, text: &str) -> Self {
        self.response.lock().unwrap().text = text.to_string();
        self
    }

    pub fn with_error(self, error: ProviderError) -> Self {
        *self.error.lock().unwrap() = Some(error);
        self
    }

    /// Prompts received so far, after any query biasing.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn get_call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

impl Default for MockMapsClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LocationSearchService for MockMapsClient {
    async fn search_locations(&self, prompt: &str) -> Result<PlaceSearch> {
        self.prompts.lock().unwrap().push(prompt.to_string());

        if let Some(error) = self.error.lock().unwrap().clone() {
            return Err(Error::Provider(error));
        }
        Ok(self.response.lock().unwrap().clone())
    }
}

#[derive(Clone)]
pub struct MockNamingClient {
    ideas: Arc<Mutex<Vec<BusinessIdea>>>,
    error: Arc<Mutex<Option<ProviderError>>>,
    call_count: Arc<Mutex<usize>>,
}

impl MockNamingClient {
    pub fn new() -> Self {
        Self {
            ideas: Arc::new(Mutex::new(Vec::new())),
            error: Arc::new(Mutex::new(None)),
            call_count: Arc::new(Mutex::new(0)),
        }
    }

    pub fn with_idea(self, name: &str, slogan: &str) -> Self {
        self.ideas.lock().unwrap().push(BusinessIdea {
            name: name.to_string(),
            slogan: slogan.to_string(),
        });
        self
    }

    pub fn with_error(self, error: ProviderError) -> Self {
        *self.error.lock().unwrap() = Some(error);
        self
    }

    pub fn get_call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }
}

impl Default for MockNamingClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NamingService for MockNamingClient {
    async fn generate_business_ideas(&self, _topic: &str) -> Result<Vec<BusinessIdea>> {
        *self.call_count.lock().unwrap() += 1;

        if let Some(error) = self.error.lock().unwrap().clone() {
            return Err(Error::Provider(error));
        }
        Ok(self.ideas.lock().unwrap().clone())
    }
}

#[derive(Clone)]
pub struct MockCredentialSelector {
    selected: Arc<Mutex<bool>>,
    open_count: Arc<Mutex<usize>>,
}

impl MockCredentialSelector {
    pub fn new() -> Self {
        Self {
            selected: Arc::new(Mutex::new(true)),
            open_count: Arc::new(Mutex::new(0)),
        }
    }

    pub fn with_selected(self, selected: bool) -> Self {
        *self.selected.lock().unwrap() = selected;
        self
    }

    /// How many times credential selection was opened.
    pub fn get_open_count(&self) -> usize {
        *self.open_count.lock().unwrap()
    }
}

impl Default for MockCredentialSelector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CredentialSelector for MockCredentialSelector {
    async fn has_selected_credential(&self) -> bool {
        *self.selected.lock().unwrap()
    }

    async fn open_selection(&self) -> Result<()> {
        *self.open_count.lock().unwrap() += 1;
        // Selecting a key is the user's next step; model it as done.
        *self.selected.lock().unwrap() = true;
        Ok(())
    }
}
