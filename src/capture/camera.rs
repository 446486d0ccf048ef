use super::Camera;
use crate::models::ImageAttachment;
use crate::{Error, Result};
use async_trait::async_trait;
use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

/// How a captured frame is encoded before it is attached to a prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSettings {
    /// JPEG quality, 1-100.
    pub quality: u8,
    /// Flip horizontally so the frame matches a selfie preview.
    pub mirror: bool,
}

impl FrameSettings {
    pub const CHAT: Self = Self {
        quality: 80,
        mirror: false,
    };

    pub const HAIR_STYLER: Self = Self {
        quality: 85,
        mirror: true,
    };
}

/// Camera backed by a still image on disk, re-read on every capture.
///
/// Stands in for a device on hosts without one (the CLI, tests). The source is
/// checked when the camera is opened, mirroring a device permission check.
pub struct FileCamera {
    source: PathBuf,
    settings: FrameSettings,
    active: AtomicBool,
}

impl FileCamera {
    pub fn open(source: impl AsRef<Path>, settings: FrameSettings) -> Result<Self> {
        let source = source.as_ref().to_path_buf();
        if !source.is_file() {
            return Err(Error::Capture(format!(
                "Unable to access camera source {}",
                source.display()
            )));
        }

        tracing::debug!("Opened file camera on {}", source.display());
        Ok(Self {
            source,
            settings,
            active: AtomicBool::new(true),
        })
    }

    fn encode_frame(image: DynamicImage, settings: FrameSettings) -> Result<Vec<u8>> {
        let image = if settings.mirror { image.fliph() } else { image };
        let rgb = image.to_rgb8();

        let mut buffer = Vec::new();
        JpegEncoder::new_with_quality(&mut buffer, settings.quality.clamp(1, 100))
            .encode_image(&rgb)?;
        Ok(buffer)
    }
}

#[async_trait]
impl Camera for FileCamera {
    async fn capture_frame(&self) -> Result<ImageAttachment> {
        if !self.is_active() {
            return Err(Error::Capture("Camera has been stopped".to_string()));
        }

        let bytes = tokio::fs::read(&self.source).await?;
        let settings = self.settings;
        let jpeg = tokio::task::spawn_blocking(move || {
            let image = image::load_from_memory(&bytes)?;
            Self::encode_frame(image, settings)
        })
        .await
        .map_err(|e| Error::Invariant(format!("Frame encoding task join error: {}", e)))??;

        tracing::debug!("Captured frame ({} bytes JPEG)", jpeg.len());
        Ok(ImageAttachment::from_bytes("image/jpeg", &jpeg))
    }

    fn stop(&self) {
        if self.active.swap(false, Ordering::SeqCst) {
            tracing::debug!("Released camera source {}", self.source.display());
        }
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

impl Drop for FileCamera {
    fn drop(&mut self) {
        self.stop();
    }
}
