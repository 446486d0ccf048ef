//! Media capture adapters
//!
//! Camera frames and picked files are normalized into [`ImageAttachment`]s;
//! microphone input arrives as a cancellable stream of transcript snapshots.

pub mod camera;
pub mod microphone;
pub mod mime;

pub use camera::{FileCamera, FrameSettings};
pub use microphone::LineMicrophone;
pub use mime::detect_image_mime;

use crate::models::ImageAttachment;
use crate::{Error, Result};
use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::TryStreamExt;
use std::path::Path;
use tokio_util::sync::CancellationToken;

#[async_trait]
pub trait Camera: Send + Sync {
    /// Grab one still frame as a JPEG attachment.
    async fn capture_frame(&self) -> Result<ImageAttachment>;

    /// Release the device. Safe to call more than once.
    fn stop(&self);

    fn is_active(&self) -> bool;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptSnapshot {
    pub text: String,
    pub is_final: bool,
}

impl TranscriptSnapshot {
    pub fn interim(text: String) -> Self {
        Self {
            text,
            is_final: false,
        }
    }

    pub fn final_text(text: String) -> Self {
        Self {
            text,
            is_final: true,
        }
    }
}

pub type TranscriptStream = BoxStream<'static, Result<TranscriptSnapshot>>;

pub trait Microphone: Send + Sync {
    /// Start a listening session. The stream ends after the final snapshot or
    /// when `cancel` fires.
    fn listen(&self, cancel: CancellationToken) -> TranscriptStream;
}

/// Drain a transcript stream, keeping the most recent snapshot's text.
pub async fn final_transcript(mut stream: TranscriptStream) -> Result<String> {
    let mut text = String::new();
    while let Some(snapshot) = stream.try_next().await? {
        text = snapshot.text;
        if snapshot.is_final {
            break;
        }
    }
    Ok(text)
}

/// Read a user-chosen file into an attachment, sniffing its image type.
pub async fn pick_file(path: impl AsRef<Path>) -> Result<ImageAttachment> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path).await.map_err(|e| {
        Error::Capture(format!("Unable to read {}: {}", path.display(), e))
    })?;
    if bytes.is_empty() {
        return Err(Error::Capture(format!("{} is empty", path.display())));
    }

    let mime_type = detect_image_mime(&bytes);
    tracing::debug!(
        "Picked {} ({} bytes, {})",
        path.display(),
        bytes.len(),
        mime_type
    );
    Ok(ImageAttachment::from_bytes(mime_type, &bytes))
}
