use super::{Microphone, TranscriptSnapshot, TranscriptStream};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// Microphone fed by a line-oriented transcript source, one utterance per line.
///
/// Each listening session consumes one line and replays it the way a speech
/// recognizer reports it: growing interim snapshots, then the final text.
pub struct LineMicrophone<R> {
    reader: Arc<Mutex<R>>,
}

impl<R> LineMicrophone<R>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    pub fn new(reader: R) -> Self {
        Self {
            reader: Arc::new(Mutex::new(reader)),
        }
    }
}

impl<R> Microphone for LineMicrophone<R>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    fn listen(&self, cancel: CancellationToken) -> TranscriptStream {
        let reader = Arc::clone(&self.reader);

        Box::pin(async_stream::try_stream! {
            let mut reader = reader.lock().await;
            let mut line = String::new();

            let read = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                read = reader.read_line(&mut line) => Some(read),
            };

            if let Some(read) = read {
                if read.map_err(crate::Error::from)? > 0 {
                    let words: Vec<&str> = line.split_whitespace().collect();
                    for end in 1..words.len() {
                        if cancel.is_cancelled() {
                            break;
                        }
                        yield TranscriptSnapshot::interim(words[..end].join(" "));
                    }
                    if !cancel.is_cancelled() {
                        yield TranscriptSnapshot::final_text(words.join(" "));
                    }
                } else {
                    tracing::debug!("Transcript source closed");
                }
            } else {
                tracing::debug!("Listening cancelled before any speech");
            }
        })
    }
}
