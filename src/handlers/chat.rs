use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    response::{IntoResponse, Response, sse::Sse},
};
use futures_util::StreamExt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{error, info};

use crate::error::ApiError;
use crate::metrics::{REQUEST_ERRORS, REQUEST_TOTAL};
use crate::models::ChatRequest;
use crate::openai;
use crate::relay::{self, RelayFrame};
use crate::state::AppState;

pub const CHAT_FAILURE_MESSAGE: &str = "Failed to process chat request";

// POST /api/chat, streams the completion back as SSE
pub async fn chat_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Response {
    REQUEST_TOTAL.with_label_values(&["chat"]).inc();

    match start_relay(state, payload).await {
        Ok(response) => response,
        Err(err) => {
            REQUEST_ERRORS.with_label_values(&["chat"]).inc();
            error!(error = %err, "chat request failed");
            err.into_response_with(CHAT_FAILURE_MESSAGE)
        }
    }
}

async fn start_relay(
    state: Arc<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let api_key = state
        .chat
        .api_key
        .as_deref()
        .ok_or(ApiError::MissingCredentials("AZURE_OPENAI_API_KEY is not set"))?;

    let Json(request) = payload.map_err(|e| ApiError::InvalidRequest(e.body_text()))?;
    let conversation = request.into_conversation()?;

    if let Some(last) = conversation.last() {
        info!(messages = conversation.len(), request = %last.content, "chat request received");
    }

    let upstream =
        openai::start_completion(&state.client, &state.chat, api_key, &conversation).await?;

    // one reader, one writer
    let (tx, rx) = mpsc::channel(1);
    tokio::spawn(async move {
        let outcome = relay::relay_completion(Box::pin(upstream.bytes_stream()), tx).await;
        relay::report(&outcome);
    });

    let events = ReceiverStream::new(rx).map(RelayFrame::into_event);
    // Sse sets text/event-stream and Cache-Control: no-cache
    Ok(Sse::new(events).into_response())
}
