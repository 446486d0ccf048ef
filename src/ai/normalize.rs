//! Extracts stable result shapes from raw Gemini responses.
//!
//! Nothing here fails on missing optional fields: absence yields `None` or an
//! empty list so callers can tell "no usable result" apart from "call failed".

use super::gemini::types::{ChunkSource, GenerateContentResponse, GroundingChunk, Operation, Part};
use crate::models::{BusinessIdea, MapLocation};

/// Mime type assumed when an inline part omits one.
pub const FALLBACK_IMAGE_MIME: &str = "image/png";

/// First inline-data part of the first candidate, as a data URI.
pub fn first_inline_image(response: &GenerateContentResponse) -> Option<String> {
    response
        .candidates
        .first()
        .and_then(|c| c.content.as_ref())
        .and_then(|content| {
            content.parts.iter().find_map(|p| match p {
                Part::InlineData { inline_data } if !inline_data.data.is_empty() => {
                    let mime_type = inline_data
                        .mime_type
                        .as_deref()
                        .filter(|m| !m.is_empty())
                        .unwrap_or(FALLBACK_IMAGE_MIME);
                    Some(format!("data:{};base64,{}", mime_type, inline_data.data))
                }
                _ => None,
            })
        })
}

/// Concatenated text parts of the first candidate; `None` when there is no text.
pub fn response_text(response: &GenerateContentResponse) -> Option<String> {
    let text: String = response
        .candidates
        .first()
        .and_then(|c| c.content.as_ref())
        .map(|content| {
            content
                .parts
                .iter()
                .filter_map(|p| match p {
                    Part::Text { text } => Some(text.as_str()),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

/// A grounding citation decoded into one of the two shapes the search path understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Citation {
    Maps { title: Option<String>, uri: String },
    Web { title: Option<String>, uri: String },
}

impl Citation {
    /// Decode a raw chunk; chunks without a usable URI are discarded.
    pub fn decode(chunk: &GroundingChunk) -> Option<Self> {
        fn usable(source: &ChunkSource) -> Option<(Option<String>, String)> {
            let uri = source.uri.as_deref().map(str::trim).filter(|u| !u.is_empty())?;
            let title = source.title.clone().filter(|t| !t.trim().is_empty());
            Some((title, uri.to_string()))
        }

        if let Some(maps) = &chunk.maps {
            return usable(maps).map(|(title, uri)| Citation::Maps { title, uri });
        }
        chunk
            .web
            .as_ref()
            .and_then(usable)
            .map(|(title, uri)| Citation::Web { title, uri })
    }

    /// Maps citations always count; web citations only when they point at a maps host.
    pub fn into_location(self) -> Option<MapLocation> {
        match self {
            Citation::Maps { title, uri } => Some(MapLocation {
                title: title.unwrap_or_else(|| "Map Location".to_string()),
                uri,
            }),
            Citation::Web { title, uri } if is_maps_uri(&uri) => Some(MapLocation {
                title: title.unwrap_or_else(|| "Location".to_string()),
                uri,
            }),
            Citation::Web { .. } => None,
        }
    }
}

/// Country-code and generic suffixes Google serves Maps from.
const GOOGLE_SUFFIXES: &[&str] = &[
    "com", "com.pk", "co.in", "co.uk", "ca", "com.au", "de", "fr", "es", "it", "nl", "ae",
    "com.sa", "com.bd", "co.jp", "com.br", "com.tr", "ru", "pl",
];

fn is_google_host(host: &str) -> bool {
    host.strip_prefix("google.")
        .is_some_and(|suffix| GOOGLE_SUFFIXES.contains(&suffix))
}

/// True when the URI points at Google Maps (`maps.google.<tld>`, `google.<tld>/maps`, or a maps short link).
pub fn is_maps_uri(uri: &str) -> bool {
    let Ok(url) = reqwest::Url::parse(uri) else {
        return false;
    };
    let Some(host) = url.host_str() else {
        return false;
    };
    let lowered = host.to_ascii_lowercase();
    let host = lowered.strip_prefix("www.").unwrap_or(lowered.as_str());

    if host == "maps.app.goo.gl" {
        return true;
    }
    if host.strip_prefix("maps.").is_some_and(is_google_host) {
        return true;
    }
    (is_google_host(host) || host == "goo.gl")
        && (url.path() == "/maps" || url.path().starts_with("/maps/"))
}

/// Merge maps-native and maps-host web citations, in response order, without de-duplication.
pub fn map_locations(response: &GenerateContentResponse) -> Vec<MapLocation> {
    response
        .candidates
        .first()
        .and_then(|c| c.grounding_metadata.as_ref())
        .map(|metadata| {
            metadata
                .grounding_chunks
                .iter()
                .filter_map(Citation::decode)
                .filter_map(Citation::into_location)
                .collect()
        })
        .unwrap_or_default()
}

/// Resource locator of a completed video operation.
pub fn video_locator(operation: &Operation) -> Option<String> {
    let response = operation.response.as_ref()?;
    let samples = response
        .generate_video_response
        .as_ref()
        .map(|r| r.generated_samples.as_slice())
        .filter(|samples| !samples.is_empty())
        .unwrap_or(response.generated_videos.as_slice());

    samples
        .first()
        .and_then(|sample| sample.video.as_ref())
        .and_then(|video| video.uri.clone())
        .filter(|uri| !uri.is_empty())
}

/// Parse a JSON array of `{name, slogan}` objects, tolerating markdown fences.
pub fn parse_business_ideas(text: &str) -> Vec<BusinessIdea> {
    let cleaned = text.replace("```json", "").replace("```", "");
    match serde_json::from_str::<Vec<BusinessIdea>>(cleaned.trim()) {
        Ok(ideas) => ideas,
        Err(e) => {
            tracing::warn!("Failed to parse business ideas as JSON: {}", e);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn response(json: serde_json::Value) -> GenerateContentResponse {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_first_inline_image_skips_text_parts() {
        let resp = response(serde_json::json!({
            "candidates": [{
                "content": {
                    "parts": [
                        { "text": "here you go" },
                        { "inlineData": { "mimeType": "image/jpeg", "data": "AAEC" } },
                        { "inlineData": { "mimeType": "image/png", "data": "BBBB" } }
                    ]
                }
            }]
        }));
        assert_eq!(
            first_inline_image(&resp).as_deref(),
            Some("data:image/jpeg;base64,AAEC")
        );
    }

    #[test]
    fn test_first_inline_image_defaults_mime() {
        let resp = response(serde_json::json!({
            "candidates": [{ "content": { "parts": [{ "inlineData": { "data": "AAEC" } }] } }]
        }));
        assert_eq!(
            first_inline_image(&resp).as_deref(),
            Some("data:image/png;base64,AAEC")
        );
    }

    #[test]
    fn test_first_inline_image_none_without_data() {
        let resp = response(serde_json::json!({
            "candidates": [{ "content": { "parts": [{ "text": "sorry, no image" }] } }]
        }));
        assert_eq!(first_inline_image(&resp), None);
        assert_eq!(first_inline_image(&GenerateContentResponse::default()), None);
    }

    #[test]
    fn test_response_text_joins_parts() {
        let resp = response(serde_json::json!({
            "candidates": [{ "content": { "parts": [{ "text": "Hi" }, { "text": "!" }] } }]
        }));
        assert_eq!(response_text(&resp).as_deref(), Some("Hi!"));
        assert_eq!(response_text(&GenerateContentResponse::default()), None);
    }

    #[test]
    fn test_maps_uri_detection() {
        assert!(is_maps_uri("https://maps.google.com/?cid=123"));
        assert!(is_maps_uri("https://www.google.com/maps/place/Clifton"));
        assert!(is_maps_uri("https://maps.app.goo.gl/abc"));
        assert!(!is_maps_uri("https://www.google.com/search?q=maps"));
        assert!(!is_maps_uri("https://example.com/maps"));
        assert!(!is_maps_uri("not a url"));
    }

    #[test]
    fn test_maps_uri_rejects_lookalike_hosts() {
        assert!(is_maps_uri("https://www.google.com.pk/maps/place/Saddar"));
        assert!(is_maps_uri("https://maps.google.co.uk/?q=tea"));
        assert!(is_maps_uri("https://goo.gl/maps/xyz"));
        assert!(!is_maps_uri("https://google.evil.com/maps"));
        assert!(!is_maps_uri("https://maps.google.evil.com/?cid=1"));
        assert!(!is_maps_uri("https://www.google.com.attacker.net/maps"));
        assert!(!is_maps_uri("https://maps.app.goo.gl.evil.com/abc"));
    }

    #[test]
    fn test_map_locations_merges_both_shapes_and_drops_unrelated_web() {
        let resp = response(serde_json::json!({
            "candidates": [{
                "content": { "parts": [{ "text": "Places" }] },
                "groundingMetadata": {
                    "groundingChunks": [
                        { "maps": { "uri": "https://maps.google.com/?cid=1", "title": "Port Grand" } },
                        { "web": { "uri": "https://www.google.com/maps/place/Clifton", "title": "Clifton" } },
                        { "web": { "uri": "https://en.wikipedia.org/wiki/Karachi", "title": "Karachi" } },
                        { "maps": { "title": "No link" } },
                        { "maps": { "uri": "https://maps.google.com/?cid=1" } }
                    ]
                }
            }]
        }));

        assert_eq!(
            map_locations(&resp),
            vec![
                MapLocation {
                    title: "Port Grand".to_string(),
                    uri: "https://maps.google.com/?cid=1".to_string(),
                },
                MapLocation {
                    title: "Clifton".to_string(),
                    uri: "https://www.google.com/maps/place/Clifton".to_string(),
                },
                MapLocation {
                    title: "Map Location".to_string(),
                    uri: "https://maps.google.com/?cid=1".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_citation_decode_prefers_maps_shape() {
        let chunk: GroundingChunk = serde_json::from_value(serde_json::json!({
            "web": { "uri": "https://example.com" },
            "maps": { "uri": "https://maps.google.com/?cid=9", "title": "Spot" }
        }))
        .unwrap();
        assert_eq!(
            Citation::decode(&chunk),
            Some(Citation::Maps {
                title: Some("Spot".to_string()),
                uri: "https://maps.google.com/?cid=9".to_string(),
            })
        );
    }

    #[test]
    fn test_video_locator_rest_shape() {
        let op: Operation = serde_json::from_value(serde_json::json!({
            "name": "op",
            "done": true,
            "response": {
                "generateVideoResponse": {
                    "generatedSamples": [{ "video": { "uri": "http://x/video" } }]
                }
            }
        }))
        .unwrap();
        assert_eq!(video_locator(&op).as_deref(), Some("http://x/video"));
    }

    #[test]
    fn test_video_locator_sdk_shape() {
        let op: Operation = serde_json::from_value(serde_json::json!({
            "done": true,
            "response": { "generatedVideos": [{ "video": { "uri": "http://x/sdk" } }] }
        }))
        .unwrap();
        assert_eq!(video_locator(&op).as_deref(), Some("http://x/sdk"));
    }

    #[test]
    fn test_video_locator_missing() {
        let op: Operation =
            serde_json::from_value(serde_json::json!({ "done": true, "response": {} })).unwrap();
        assert_eq!(video_locator(&op), None);
    }

    #[test]
    fn test_parse_business_ideas_strips_fences() {
        let text = "```json\n[{\"name\": \"TechFlow\", \"slogan\": \"Innovation in Motion\"}]\n```";
        assert_eq!(
            parse_business_ideas(text),
            vec![BusinessIdea {
                name: "TechFlow".to_string(),
                slogan: "Innovation in Motion".to_string(),
            }]
        );
    }

    #[test]
    fn test_parse_business_ideas_invalid_json_is_empty() {
        assert!(parse_business_ideas("Here are some names: TechFlow").is_empty());
    }
}
