use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use std::sync::Arc;
use tracing::{error, info};

use crate::captions::parse_captions;
use crate::error::ApiError;
use crate::gemini;
use crate::metrics::{CAPTIONS_GENERATED, REQUEST_ERRORS, REQUEST_TOTAL};
use crate::models::{CaptionRequest, CaptionResponse};
use crate::state::AppState;

// POST /api/generate-caption
pub async fn caption_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CaptionRequest>, JsonRejection>,
) -> Result<Json<CaptionResponse>, ApiError> {
    REQUEST_TOTAL.with_label_values(&["caption"]).inc();

    generate(&state, payload).await.inspect_err(|err| {
        REQUEST_ERRORS.with_label_values(&["caption"]).inc();
        error!(error = %err, "caption request failed");
    })
}

async fn generate(
    state: &AppState,
    payload: Result<Json<CaptionRequest>, JsonRejection>,
) -> Result<Json<CaptionResponse>, ApiError> {
    let api_key = state
        .caption
        .api_key
        .as_deref()
        .ok_or(ApiError::MissingCredentials("API key not configured"))?;

    let Json(request) = payload.map_err(|e| ApiError::InvalidRequest(e.body_text()))?;
    let image = request.into_payload(state.caption.max_image_bytes)?;
    info!(mime_type = %image.mime_type, bytes = image.data.len(), "received image data");

    let raw = gemini::generate_caption_text(&state.client, &state.caption, api_key, &image).await?;
    let captions = parse_captions(&raw);
    if captions.is_empty() {
        error!(raw = %raw, "could not parse captions from model response");
        return Err(ApiError::NoCaptions);
    }

    CAPTIONS_GENERATED.inc_by(captions.len() as f64);
    info!(count = captions.len(), "returning captions");
    Ok(Json(CaptionResponse { captions }))
}
