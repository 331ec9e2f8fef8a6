use serde::{Deserialize, Serialize};

use crate::error::ApiError;

#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

// One turn of a conversation, oldest first
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

// POST /api/chat body
#[derive(Deserialize, Serialize, Clone, Debug, Default)]
pub struct ChatRequest {
    #[serde(default)]
    pub messages: Vec<Message>,
}

impl ChatRequest {
    /// Takes the conversation out of the request, rejecting an empty one.
    pub fn into_conversation(self) -> Result<Vec<Message>, ApiError> {
        if self.messages.is_empty() {
            return Err(ApiError::InvalidRequest("messages must not be empty".to_string()));
        }
        Ok(self.messages)
    }
}

// POST /api/generate-caption body
#[derive(Deserialize, Serialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct CaptionRequest {
    #[serde(default)]
    pub image_base64: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
}

/// Validated image payload, ready to forward upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    pub data: String,
    pub mime_type: String,
}

const ACCEPTED_MIME_TYPES: &[&str] = &["image/jpeg", "image/jpg", "image/png"];

impl CaptionRequest {
    pub fn into_payload(self, max_image_bytes: usize) -> Result<ImagePayload, ApiError> {
        let (data, mime_type) = match (self.image_base64, self.mime_type) {
            (Some(data), Some(mime)) if !data.is_empty() && !mime.is_empty() => (data, mime),
            _ => {
                return Err(ApiError::InvalidRequest(
                    "Missing imageBase64 or mimeType".to_string(),
                ));
            }
        };

        let mut mime_type = mime_type.trim().to_ascii_lowercase();
        if !ACCEPTED_MIME_TYPES.contains(&mime_type.as_str()) {
            return Err(ApiError::InvalidRequest(format!(
                "Unsupported image type: {mime_type}. Use JPEG or PNG"
            )));
        }

        // Gemini only knows image/jpeg
        if mime_type == "image/jpg" {
            mime_type = "image/jpeg".to_string();
        }

        if decoded_len(&data) > max_image_bytes {
            return Err(ApiError::InvalidRequest(format!(
                "Image exceeds the {} MB limit",
                max_image_bytes / (1024 * 1024)
            )));
        }

        Ok(ImagePayload { data, mime_type })
    }
}

// size of the image once base64 is decoded, without decoding it
fn decoded_len(encoded: &str) -> usize {
    let trimmed = encoded.trim_end_matches('=');
    trimmed.len() * 3 / 4
}

// One relayed fragment, serialized as the SSE data payload
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct StreamChunk {
    pub content: String,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct CaptionResponse {
    pub captions: Vec<String>,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caption_request(data: Option<&str>, mime: Option<&str>) -> CaptionRequest {
        CaptionRequest {
            image_base64: data.map(str::to_string),
            mime_type: mime.map(str::to_string),
        }
    }

    #[test]
    fn roles_use_lowercase_names() {
        let msg: Message = serde_json::from_str(r#"{"role":"assistant","content":"lol"}"#).unwrap();
        assert_eq!(msg.role, Role::Assistant);
        assert_eq!(
            serde_json::to_string(&Message::new(Role::System, "x")).unwrap(),
            r#"{"role":"system","content":"x"}"#
        );
    }

    #[test]
    fn unknown_role_is_rejected() {
        assert!(serde_json::from_str::<Message>(r#"{"role":"tool","content":"x"}"#).is_err());
    }

    #[test]
    fn empty_conversation_is_invalid() {
        let err = ChatRequest::default().into_conversation().unwrap_err();
        assert!(matches!(err, ApiError::InvalidRequest(_)));
    }

    #[test]
    fn missing_messages_field_defaults_to_empty() {
        let req: ChatRequest = serde_json::from_str("{}").unwrap();
        assert!(req.into_conversation().is_err());
    }

    #[test]
    fn caption_request_reads_camel_case_fields() {
        let req: CaptionRequest =
            serde_json::from_str(r#"{"imageBase64":"aGVsbG8=","mimeType":"image/png"}"#).unwrap();
        let payload = req.into_payload(1024).unwrap();
        assert_eq!(payload.data, "aGVsbG8=");
        assert_eq!(payload.mime_type, "image/png");
    }

    #[test]
    fn missing_image_fields_are_invalid() {
        for req in [
            caption_request(None, Some("image/png")),
            caption_request(Some("aGVsbG8="), None),
            caption_request(Some(""), Some("image/png")),
        ] {
            match req.into_payload(1024) {
                Err(ApiError::InvalidRequest(msg)) => {
                    assert_eq!(msg, "Missing imageBase64 or mimeType")
                }
                other => panic!("expected invalid request, got {other:?}"),
            }
        }
    }

    #[test]
    fn only_jpeg_and_png_are_accepted() {
        assert!(caption_request(Some("aGVsbG8="), Some("image/gif")).into_payload(1024).is_err());
        let payload = caption_request(Some("aGVsbG8="), Some("IMAGE/JPEG"))
            .into_payload(1024)
            .unwrap();
        assert_eq!(payload.mime_type, "image/jpeg");
        let payload = caption_request(Some("aGVsbG8="), Some("image/jpg"))
            .into_payload(1024)
            .unwrap();
        assert_eq!(payload.mime_type, "image/jpeg");
    }

    #[test]
    fn oversized_images_are_rejected() {
        let data = "A".repeat(4 * 1000);
        assert!(caption_request(Some(&data), Some("image/png")).into_payload(2999).is_err());
        assert!(caption_request(Some(&data), Some("image/png")).into_payload(3000).is_ok());
    }
}
