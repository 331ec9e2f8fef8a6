use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use crate::config::ChatSettings;
use crate::error::UpstreamError;
use crate::metrics::UPSTREAM_LATENCY;
use crate::models::{Message, Role};

pub const PERSONA: &str = "You are Memezy.ai, a hilarious AI meme caption generator. You create funny, witty, and sometimes sarcastic captions for memes. Keep your responses short, punchy, and internet-culture savvy.";

const TEMPERATURE: f32 = 0.7;
const MAX_TOKENS: u32 = 150;

// Chat completion request body (OpenAI shape)
#[derive(Serialize, Debug)]
pub struct CompletionRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<Message>,
    pub stream: bool,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl<'a> CompletionRequest<'a> {
    /// Persona first, then the conversation in its original order.
    pub fn streaming(model: &'a str, conversation: &[Message]) -> Self {
        let mut messages = Vec::with_capacity(conversation.len() + 1);
        messages.push(Message::new(Role::System, PERSONA));
        messages.extend_from_slice(conversation);

        Self {
            model,
            messages,
            stream: true,
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        }
    }
}

// One streamed chunk, only the fields the relay reads
#[derive(Deserialize, Debug)]
struct CompletionChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Deserialize, Debug)]
struct ChunkChoice {
    #[serde(default)]
    delta: Option<Delta>,
}

#[derive(Deserialize, Debug)]
struct Delta {
    #[serde(default)]
    content: Option<String>,
}

/// Text carried by `choices[0].delta.content`, if any.
///
/// Chunks without choices (Azure sends content filter results first) yield `None`.
pub fn delta_content(payload: &str) -> Result<Option<String>, UpstreamError> {
    let chunk: CompletionChunk = serde_json::from_str(payload)?;
    Ok(chunk
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.delta)
        .and_then(|d| d.content)
        .filter(|text| !text.is_empty()))
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Start a streamed completion. Returns once the upstream accepted the request;
/// the body is left unread for the relay.
pub async fn start_completion(
    client: &reqwest::Client,
    settings: &ChatSettings,
    api_key: &str,
    conversation: &[Message],
) -> Result<reqwest::Response, UpstreamError> {
    let body = CompletionRequest::streaming(&settings.model, conversation);
    debug!(model = %settings.model, messages = body.messages.len(), "sending chat completion");

    let start = Instant::now();
    let res = client
        .post(settings.completions_url.clone())
        .header("api-key", api_key)
        .bearer_auth(api_key)
        .json(&body)
        .send()
        .await?;
    UPSTREAM_LATENCY
        .with_label_values(&["openai"])
        .observe(start.elapsed().as_secs_f64());

    let status = res.status();
    if !status.is_success() {
        let text = res.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorEnvelope>(&text)
            .map(|e| e.error.message)
            .unwrap_or_else(|_| format!("HTTP error! status: {}", status.as_u16()));
        return Err(UpstreamError::Status {
            service: "OpenAI",
            status,
            message,
        });
    }

    Ok(res)
}
