use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use crate::config::CaptionSettings;
use crate::error::UpstreamError;
use crate::metrics::UPSTREAM_LATENCY;
use crate::models::ImagePayload;

// kept out of the query string so it never shows up in error messages
const API_KEY_HEADER: &str = "x-goog-api-key";

pub const CAPTION_INSTRUCTION: &str = "Generate a list of 5-7 funny and clever meme captions for this image. Keep them short, witty, and internet-savvy. Separate each caption with an asterisk (*).";

// generateContent request body
#[derive(Serialize, Debug)]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
}

#[derive(Serialize, Debug)]
pub struct Content {
    pub parts: Vec<Part>,
}

#[derive(Serialize, Debug)]
#[serde(untagged)]
pub enum Part {
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: Blob,
    },
    Text {
        text: String,
    },
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Blob {
    pub mime_type: String,
    pub data: String,
}

impl GenerateContentRequest {
    /// Image first, then the caption instruction, in one user turn.
    pub fn caption(image: &ImagePayload) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![
                    Part::InlineData {
                        inline_data: Blob {
                            mime_type: image.mime_type.clone(),
                            data: image.data.clone(),
                        },
                    },
                    Part::Text {
                        text: CAPTION_INSTRUCTION.to_string(),
                    },
                ],
            }],
        }
    }
}

// generateContent response, only what we read
#[derive(Deserialize, Debug, Default)]
pub struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize, Debug)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Deserialize, Debug)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize, Debug)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateContentResponse {
    /// `candidates[0].content.parts[0].text`, or empty.
    pub fn first_text(&self) -> &str {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .and_then(|c| c.parts.first())
            .and_then(|p| p.text.as_deref())
            .unwrap_or_default()
    }
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Ask the vision model for captions and return its raw text answer.
pub async fn generate_caption_text(
    client: &reqwest::Client,
    settings: &CaptionSettings,
    api_key: &str,
    image: &ImagePayload,
) -> Result<String, UpstreamError> {
    debug!(model = %settings.model, mime_type = %image.mime_type, "sending caption request");

    let start = Instant::now();
    let res = client
        .post(settings.generate_url.clone())
        .header(API_KEY_HEADER, api_key)
        .json(&GenerateContentRequest::caption(image))
        .send()
        .await?;
    let status = res.status();
    let text = res.text().await?;
    UPSTREAM_LATENCY
        .with_label_values(&["gemini"])
        .observe(start.elapsed().as_secs_f64());

    if !status.is_success() {
        let message = serde_json::from_str::<ErrorEnvelope>(&text)
            .map(|e| e.error.message)
            .unwrap_or_else(|_| format!("HTTP error! status: {}", status.as_u16()));
        return Err(UpstreamError::Status {
            service: "Gemini",
            status,
            message,
        });
    }

    let body: GenerateContentResponse = serde_json::from_str(&text)?;
    Ok(body.first_text().to_string())
}
