//! Maps raw provider failures onto the [`ProviderError`] taxonomy.
//!
//! Classification never fails: anything unrecognized becomes
//! [`ProviderErrorKind::Generic`] with the best message that could be unwrapped.

use crate::error::{ProviderError, ProviderErrorKind};
use crate::Error;
use serde::Deserialize;

/// Which provider path produced the failure. Not-found responses mean
/// different things on each path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallPath {
    Content,
    Video,
}

/// Lowercase not-found and authorization markers the video path reports when
/// the credential lacks billing-enabled access.
const VIDEO_AUTHORIZATION_MARKERS: &[&str] = &[
    "not found",
    "not_found",
    "404",
    "authorization failed",
    "veomodelerror",
];

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Unwrap a `{"error": {"message": ...}}` envelope, or return the raw text.
pub fn unwrap_message(raw: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(raw.trim())
        .ok()
        .and_then(|envelope| envelope.error)
        .and_then(|body| body.message)
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| raw.to_string())
}

fn mentions_video_authorization(text: &str) -> bool {
    let lowered = text.to_ascii_lowercase();
    VIDEO_AUTHORIZATION_MARKERS
        .iter()
        .any(|marker| lowered.contains(marker))
}

fn mentions_not_found(text: &str) -> bool {
    text.contains("NOT_FOUND") || text.contains("Requested entity was not found")
}

/// Classify a raw status/body pair.
pub fn classify_response(status: Option<u16>, raw: &str, path: CallPath) -> ProviderError {
    let message = unwrap_message(raw);

    let kind = match path {
        CallPath::Video
            if matches!(status, Some(403) | Some(404))
                || mentions_video_authorization(raw)
                || mentions_video_authorization(&message) =>
        {
            ProviderErrorKind::AuthorizationRequired
        }
        CallPath::Content if status == Some(404) || mentions_not_found(raw) => {
            ProviderErrorKind::NotFound
        }
        _ => ProviderErrorKind::Generic,
    };

    ProviderError::new(kind, message)
}

/// Transport failures are classified by status alone. Their text carries the
/// request URL, which can hold the credential and stray marker digits.
fn classify_transport(error: &reqwest::Error, path: CallPath) -> ProviderError {
    let status = error.status().map(|s| s.as_u16());
    let kind = match (path, status) {
        (CallPath::Video, Some(403) | Some(404)) => ProviderErrorKind::AuthorizationRequired,
        (CallPath::Content, Some(404)) => ProviderErrorKind::NotFound,
        _ => ProviderErrorKind::Generic,
    };

    let mut message = error.to_string();
    if let Some(url) = error.url() {
        message = message.replace(url.as_str(), "<redacted>");
    }
    ProviderError::new(kind, message)
}

/// Classify any crate error raised while talking to the provider.
pub fn classify(error: &Error, path: CallPath) -> ProviderError {
    match error {
        Error::Api { status, body } => classify_response(Some(*status), body, path),
        Error::Provider(existing) => {
            if existing.kind == ProviderErrorKind::Generic {
                let reclassified = classify_response(None, &existing.message, path);
                ProviderError::new(reclassified.kind, existing.message.clone())
            } else {
                existing.clone()
            }
        }
        Error::Http(e) => classify_transport(e, path),
        other => classify_response(None, &other.to_string(), path),
    }
}
