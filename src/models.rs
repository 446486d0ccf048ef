//! Data models and structures
//!
//! Defines prompts, chat sessions, generation results and the process-wide
//! configuration shared by the provider clients.

use crate::{Error, Result};
use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use uuid::Uuid;

const DATA_URI_MARKER: &str = "base64,";
const DEFAULT_ATTACHMENT_MIME: &str = "image/jpeg";

/// Base64-encoded image payload attached to a prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageAttachment {
    pub mime_type: String,
    pub data: String,
}

impl ImageAttachment {
    pub fn from_bytes(mime_type: &str, bytes: &[u8]) -> Self {
        Self {
            mime_type: mime_type.to_string(),
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
        }
    }

    /// Parse either a `data:<mime>;base64,<payload>` URI or a bare base64 string.
    ///
    /// Bare payloads are assumed to be JPEG, which is what the capture adapters produce.
    pub fn from_data_uri(value: &str) -> Self {
        match value.split_once(DATA_URI_MARKER) {
            Some((prefix, payload)) => {
                let mime_type = prefix
                    .strip_prefix("data:")
                    .map(|rest| rest.trim_end_matches(';'))
                    .filter(|mime| !mime.is_empty())
                    .unwrap_or(DEFAULT_ATTACHMENT_MIME);
                Self {
                    mime_type: mime_type.to_string(),
                    data: payload.to_string(),
                }
            }
            None => Self {
                mime_type: DEFAULT_ATTACHMENT_MIME.to_string(),
                data: value.to_string(),
            },
        }
    }

    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }

    pub fn decode(&self) -> Result<Vec<u8>> {
        base64::engine::general_purpose::STANDARD
            .decode(&self.data)
            .map_err(|e| Error::Invariant(format!("Invalid base64 image payload: {}", e)))
    }
}

/// User input for a single provider call.
#[derive(Debug, Clone, Default)]
pub struct Prompt {
    pub text: String,
    pub image: Option<ImageAttachment>,
}

impl Prompt {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            image: None,
        }
    }

    pub fn with_image(mut self, image: ImageAttachment) -> Self {
        self.image = Some(image);
        self
    }

    /// At least one of text or image must carry content.
    pub fn validate(&self) -> Result<()> {
        let has_text = !self.text.trim().is_empty();
        let has_image = self.image.as_ref().is_some_and(|i| !i.data.is_empty());
        if has_text || has_image {
            Ok(())
        } else {
            Err(Error::EmptyPrompt)
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub role: Role,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageAttachment>,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(role: Role, text: String, image: Option<ImageAttachment>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            text,
            image,
            timestamp: Utc::now(),
        }
    }
}

pub const CHAT_GREETING: &str = "As-salamu alaykum! I am the Rahat AI assistant. I can help you with questions about AI, coding, or Rehan Allahwala's books. You can speak to me, or show me pictures/questions using your camera!";

/// Append-only conversation owned by one chat panel.
///
/// Messages are never edited once pushed; only the read-aloud marker changes.
#[derive(Debug, Clone)]
pub struct ChatSession {
    messages: Vec<ChatMessage>,
    speaking: Option<Uuid>,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatSession {
    pub fn new() -> Self {
        Self {
            messages: vec![ChatMessage::new(
                Role::Model,
                CHAT_GREETING.to_string(),
                None,
            )],
            speaking: None,
        }
    }

    pub fn push(&mut self, message: ChatMessage) -> &ChatMessage {
        self.messages.push(message);
        &self.messages[self.messages.len() - 1]
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    pub fn speaking(&self) -> Option<Uuid> {
        self.speaking
    }

    /// Toggle read-aloud for a message. Returns true when playback should start.
    pub fn toggle_speaking(&mut self, id: Uuid) -> bool {
        if self.speaking == Some(id) {
            self.speaking = None;
            false
        } else if self.messages.iter().any(|m| m.id == id) {
            self.speaking = Some(id);
            true
        } else {
            false
        }
    }

    /// Called when speech playback reports completion.
    pub fn finish_speaking(&mut self) {
        self.speaking = None;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapLocation {
    pub title: String,
    pub uri: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceSearch {
    pub text: String,
    pub locations: Vec<MapLocation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessIdea {
    pub name: String,
    pub slogan: String,
}

/// Locally playable copy of a generated video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoHandle {
    pub source_uri: String,
    pub path: PathBuf,
    pub size_bytes: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationResult {
    Image { data_uri: String },
    Video(VideoHandle),
    Places(PlaceSearch),
    Ideas(Vec<BusinessIdea>),
}

// Configuration
pub const DEFAULT_CHAT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image";
pub const DEFAULT_VIDEO_MODEL: &str = "veo-3.1-fast-generate-preview";
pub const DEFAULT_MAP_CITY: &str = "Karachi";

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub chat_model: String,
    pub image_model: String,
    pub video_model: String,
    pub video_poll_interval: Duration,
    pub output_dir: PathBuf,
    pub map_city: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_key = lookup("GEMINI_API_KEY")
            .or_else(|| lookup("API_KEY"))
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| Error::Config("GEMINI_API_KEY not set".to_string()))?;

        let video_poll_interval = match lookup("VIDEO_POLL_INTERVAL_SECS") {
            Some(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|_| {
                    Error::Config(format!("Invalid VIDEO_POLL_INTERVAL_SECS '{}'", raw))
                })?;
                if secs == 0 {
                    return Err(Error::Config(
                        "VIDEO_POLL_INTERVAL_SECS must be at least 1".to_string(),
                    ));
                }
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(5),
        };

        Ok(Self {
            api_key,
            chat_model: lookup("GEMINI_CHAT_MODEL").unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string()),
            image_model: lookup("GEMINI_IMAGE_MODEL")
                .unwrap_or_else(|| DEFAULT_IMAGE_MODEL.to_string()),
            video_model: lookup("GEMINI_VIDEO_MODEL")
                .unwrap_or_else(|| DEFAULT_VIDEO_MODEL.to_string()),
            video_poll_interval,
            output_dir: lookup("OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("output")),
            map_city: lookup("MAP_CITY").unwrap_or_else(|| DEFAULT_MAP_CITY.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_prompt_requires_text_or_image() {
        assert!(matches!(
            Prompt::text("   ").validate(),
            Err(Error::EmptyPrompt)
        ));
        assert!(Prompt::text("hello").validate().is_ok());
        assert!(Prompt::text("")
            .with_image(ImageAttachment::from_bytes("image/png", &[1, 2]))
            .validate()
            .is_ok());
    }

    #[test]
    fn test_attachment_parses_data_uri() {
        let attachment = ImageAttachment::from_data_uri("data:image/png;base64,AAEC");
        assert_eq!(attachment.mime_type, "image/png");
        assert_eq!(attachment.data, "AAEC");
        assert_eq!(attachment.decode().unwrap(), vec![0, 1, 2]);
        assert_eq!(attachment.to_data_uri(), "data:image/png;base64,AAEC");
    }

    #[test]
    fn test_attachment_accepts_bare_base64() {
        let attachment = ImageAttachment::from_data_uri("AAEC");
        assert_eq!(attachment.mime_type, "image/jpeg");
        assert_eq!(attachment.data, "AAEC");
    }

    #[test]
    fn test_chat_session_starts_with_greeting_and_appends() {
        let mut session = ChatSession::new();
        assert_eq!(session.messages().len(), 1);
        assert_eq!(session.messages()[0].role, Role::Model);

        session.push(ChatMessage::new(Role::User, "hi".to_string(), None));
        assert_eq!(session.messages().len(), 2);
        assert_eq!(session.last().unwrap().text, "hi");
    }

    #[test]
    fn test_toggle_speaking() {
        let mut session = ChatSession::new();
        let id = session.messages()[0].id;

        assert!(session.toggle_speaking(id));
        assert_eq!(session.speaking(), Some(id));
        assert!(!session.toggle_speaking(id));
        assert_eq!(session.speaking(), None);

        assert!(!session.toggle_speaking(Uuid::new_v4()));

        session.toggle_speaking(id);
        session.finish_speaking();
        assert_eq!(session.speaking(), None);
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::from_lookup(lookup_from(&[("GEMINI_API_KEY", "k")])).unwrap();
        assert_eq!(config.api_key, "k");
        assert_eq!(config.chat_model, DEFAULT_CHAT_MODEL);
        assert_eq!(config.image_model, DEFAULT_IMAGE_MODEL);
        assert_eq!(config.video_model, DEFAULT_VIDEO_MODEL);
        assert_eq!(config.video_poll_interval, Duration::from_secs(5));
        assert_eq!(config.output_dir, PathBuf::from("output"));
        assert_eq!(config.map_city, "Karachi");
    }

    #[test]
    fn test_config_falls_back_to_api_key() {
        let config = Config::from_lookup(lookup_from(&[
            ("API_KEY", "legacy"),
            ("VIDEO_POLL_INTERVAL_SECS", "2"),
        ]))
        .unwrap();
        assert_eq!(config.api_key, "legacy");
        assert_eq!(config.video_poll_interval, Duration::from_secs(2));
    }

    #[test]
    fn test_config_requires_key() {
        assert!(matches!(
            Config::from_lookup(lookup_from(&[])),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_config_rejects_bad_interval() {
        let err = Config::from_lookup(lookup_from(&[
            ("GEMINI_API_KEY", "k"),
            ("VIDEO_POLL_INTERVAL_SECS", "soon"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("VIDEO_POLL_INTERVAL_SECS"));
    }

    #[test]
    fn test_config_rejects_zero_interval() {
        let err = Config::from_lookup(lookup_from(&[
            ("GEMINI_API_KEY", "k"),
            ("VIDEO_POLL_INTERVAL_SECS", "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("at least 1"));
    }
}
