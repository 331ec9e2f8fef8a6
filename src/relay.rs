use axum::response::sse::Event;
use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use std::fmt::Display;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::metrics::FRAGMENTS_RELAYED;
use crate::models::StreamChunk;
use crate::openai::delta_content;
use crate::sse::{SseDecoder, SseLine};

pub const DONE_SENTINEL: &str = "[DONE]";

/// What the relay hands to the response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayFrame {
    Chunk(String),
    Done,
}

impl RelayFrame {
    pub fn into_event(self) -> Result<Event, axum::Error> {
        match self {
            RelayFrame::Chunk(content) => Event::default().json_data(StreamChunk { content }),
            RelayFrame::Done => Ok(Event::default().data(DONE_SENTINEL)),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum RelayOutcome {
    // upstream finished, sentinel sent
    Completed { fragments: usize },
    // downstream hung up
    ClientGone { fragments: usize },
    // upstream broke mid-stream, no sentinel
    UpstreamFailed { fragments: usize, reason: String },
}

/// Pipe a streamed chat completion to `tx`, one frame per non-empty text fragment,
/// then a single `Done` once the upstream finishes.
pub async fn relay_completion<S, E>(upstream: S, tx: mpsc::Sender<RelayFrame>) -> RelayOutcome
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: Display,
{
    relay_with_decoder(upstream, tx, SseDecoder::new()).await
}

pub async fn relay_with_decoder<S, E>(
    mut upstream: S,
    tx: mpsc::Sender<RelayFrame>,
    mut decoder: SseDecoder,
) -> RelayOutcome
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: Display,
{
    let mut fragments = 0;

    'read: loop {
        let lines = match upstream.next().await {
            Some(Ok(bytes)) => match decoder.feed(&bytes) {
                Ok(lines) => lines,
                Err(e) => {
                    return RelayOutcome::UpstreamFailed {
                        fragments,
                        reason: e.to_string(),
                    };
                }
            },
            Some(Err(e)) => {
                return RelayOutcome::UpstreamFailed {
                    fragments,
                    reason: e.to_string(),
                };
            }
            None => {
                // end of body
                let tail = decoder.finish();
                match tail {
                    Some(line) => vec![line, SseLine::Done],
                    None => vec![SseLine::Done],
                }
            }
        };

        for line in lines {
            let payload = match line {
                SseLine::Done => break 'read,
                SseLine::Data(payload) => payload,
            };

            let content = match delta_content(&payload) {
                Ok(Some(content)) => content,
                Ok(None) => continue,
                Err(e) => {
                    return RelayOutcome::UpstreamFailed {
                        fragments,
                        reason: e.to_string(),
                    };
                }
            };

            if tx.send(RelayFrame::Chunk(content)).await.is_err() {
                return RelayOutcome::ClientGone { fragments };
            }
            fragments += 1;
            FRAGMENTS_RELAYED.inc();
        }
    }

    if tx.send(RelayFrame::Done).await.is_err() {
        return RelayOutcome::ClientGone { fragments };
    }
    RelayOutcome::Completed { fragments }
}

/// Log how a relay ended; meant to run at the end of the spawned relay task.
pub fn report(outcome: &RelayOutcome) {
    match outcome {
        RelayOutcome::Completed { fragments } => {
            debug!(fragments, "chat stream completed")
        }
        RelayOutcome::ClientGone { fragments } => {
            debug!(fragments, "client disconnected, abandoning chat stream")
        }
        RelayOutcome::UpstreamFailed { fragments, reason } => {
            warn!(fragments, %reason, "chat upstream failed mid-stream")
        }
    }
}
