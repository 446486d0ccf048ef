//! Drives long-running provider operations (video generation) to completion.
//!
//! The loop waits a fixed interval between polls with no backoff, retry cap or
//! timeout. It ends when the provider reports `done`, when a poll fails, or when
//! the caller cancels the token while the loop is waiting.

use super::classify::{self, CallPath};
use super::gemini::types::Operation;
use super::normalize;
use crate::error::ProviderError;
use crate::{Error, Result};
use async_trait::async_trait;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Anything that can re-fetch an operation by its handle.
#[async_trait]
pub trait OperationSource: Send + Sync {
    async fn fetch_operation(&self, operation: &Operation) -> Result<Operation>;
}

#[derive(Debug, Clone)]
pub struct OperationPoller {
    interval: Duration,
}

impl Default for OperationPoller {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL)
    }
}

impl OperationPoller {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Poll until the operation is done and return the video locator.
    pub async fn wait_for_video(
        &self,
        source: &dyn OperationSource,
        initial: Operation,
        cancel: &CancellationToken,
    ) -> Result<String> {
        let mut operation = initial;
        let mut polls = 0u32;

        while !operation.done {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    warn!(
                        "Video operation {} cancelled after {} polls",
                        operation.name, polls
                    );
                    return Err(Error::Cancelled);
                }
                _ = tokio::time::sleep(self.interval) => {}
            }

            polls += 1;
            operation = source
                .fetch_operation(&operation)
                .await
                .map_err(poll_failure)?;
            debug!(
                "Poll {} for operation {}: done={}",
                polls, operation.name, operation.done
            );
        }

        if let Some(status) = &operation.error {
            let message = status
                .message
                .clone()
                .unwrap_or_else(|| "Video generation failed".to_string());
            return Err(classify::classify_response(None, &message, CallPath::Video).into());
        }

        let locator = normalize::video_locator(&operation).ok_or_else(|| {
            ProviderError::generic("Video generation completed but no video URI was returned.")
        })?;
        info!(
            "Video operation {} finished after {} polls",
            operation.name, polls
        );
        Ok(locator)
    }
}

fn poll_failure(error: Error) -> Error {
    let classified = classify::classify(&error, CallPath::Video);
    warn!("Polling error: {}", classified.message);
    ProviderError::new(
        classified.kind,
        format!("Error while checking video status: {}", classified.message),
    )
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderErrorKind;
    use std::sync::{Arc, Mutex};

    /// Replays scripted poll results in order.
    struct ScriptedSource {
        script: Mutex<Vec<Result<Operation>>>,
        calls: Arc<Mutex<usize>>,
    }

    impl ScriptedSource {
        fn new(mut script: Vec<Result<Operation>>) -> Self {
            script.reverse();
            Self {
                script: Mutex::new(script),
                calls: Arc::new(Mutex::new(0)),
            }
        }

        fn calls(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl OperationSource for ScriptedSource {
        async fn fetch_operation(&self, _operation: &Operation) -> Result<Operation> {
            *self.calls.lock().unwrap() += 1;
            self.script
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Err(Error::Invariant("script exhausted".to_string())))
        }
    }

    fn pending() -> Operation {
        Operation {
            name: "operations/op-1".to_string(),
            ..Default::default()
        }
    }

    fn finished(uri: &str) -> Operation {
        serde_json::from_value(serde_json::json!({
            "name": "operations/op-1",
            "done": true,
            "response": {
                "generateVideoResponse": { "generatedSamples": [{ "video": { "uri": uri } }] }
            }
        }))
        .unwrap()
    }

    fn poller() -> OperationPoller {
        OperationPoller::new(Duration::from_millis(1))
    }

    #[tokio::test]
    async fn test_returns_locator_once_done_and_stops_polling() {
        let source = ScriptedSource::new(vec![
            Ok(pending()),
            Ok(pending()),
            Ok(finished("http://x/video")),
            Ok(finished("http://x/other")),
        ]);

        let locator = poller()
            .wait_for_video(&source, pending(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(locator, "http://x/video");
        assert_eq!(source.calls(), 3);
    }

    #[tokio::test]
    async fn test_already_done_operation_is_not_polled() {
        let source = ScriptedSource::new(vec![]);

        let locator = poller()
            .wait_for_video(&source, finished("http://x/now"), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(locator, "http://x/now");
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn test_poll_failure_aborts_with_prefix() {
        let source = ScriptedSource::new(vec![
            Ok(pending()),
            Err(Error::Api {
                status: 500,
                body: r#"{"error":{"message":"backend unavailable"}}"#.to_string(),
            }),
            Ok(finished("http://x/never")),
        ]);

        let err = poller()
            .wait_for_video(&source, pending(), &CancellationToken::new())
            .await
            .unwrap_err();

        match err {
            Error::Provider(p) => {
                assert_eq!(p.kind, ProviderErrorKind::Generic);
                assert_eq!(
                    p.message,
                    "Error while checking video status: backend unavailable"
                );
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_done_without_locator_is_fatal() {
        let done_empty = Operation {
            name: "operations/op-1".to_string(),
            done: true,
            ..Default::default()
        };
        let source = ScriptedSource::new(vec![Ok(done_empty)]);

        let err = poller()
            .wait_for_video(&source, pending(), &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "Video generation completed but no video URI was returned."
        );
    }

    #[tokio::test]
    async fn test_done_with_error_status_is_fatal() {
        let failed: Operation = serde_json::from_value(serde_json::json!({
            "name": "operations/op-1",
            "done": true,
            "error": { "code": 3, "message": "Prompt was blocked" }
        }))
        .unwrap();
        let source = ScriptedSource::new(vec![Ok(failed)]);

        let err = poller()
            .wait_for_video(&source, pending(), &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Prompt was blocked");
    }

    #[tokio::test]
    async fn test_cancellation_stops_polling() {
        let source = ScriptedSource::new(vec![]);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = OperationPoller::new(Duration::from_secs(3600))
            .wait_for_video(&source, pending(), &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Cancelled));
        assert_eq!(source.calls(), 0);
    }

    /// Reports the operation as still running and cancels the caller's token on the first fetch.
    struct CancellingSource {
        cancel: CancellationToken,
        calls: Mutex<usize>,
    }

    #[async_trait]
    impl OperationSource for CancellingSource {
        async fn fetch_operation(&self, _operation: &Operation) -> Result<Operation> {
            *self.calls.lock().unwrap() += 1;
            self.cancel.cancel();
            Ok(pending())
        }
    }

    #[tokio::test]
    async fn test_cancellation_during_wait_stops_further_polls() {
        let cancel = CancellationToken::new();
        let source = CancellingSource {
            cancel: cancel.clone(),
            calls: Mutex::new(0),
        };

        let err = OperationPoller::new(Duration::from_millis(10))
            .wait_for_video(&source, pending(), &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Cancelled));
        assert_eq!(*source.calls.lock().unwrap(), 1);
    }

    #[test]
    fn test_default_interval_is_five_seconds() {
        assert_eq!(OperationPoller::default().interval(), Duration::from_secs(5));
    }
}
