use base64::{engine::general_purpose, Engine};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::GeminiConfig;
use crate::models::ImagePayload;

/// One ordered input part for the vision model.
#[derive(Debug, Clone, PartialEq)]
pub enum Part {
    Text(String),
    Image(ImagePayload),
}

/// What came back from the model, adapted from the raw response.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelReply {
    Text(String),
    /// The response carried no text part; holds the raw body instead.
    NoText(String),
}

impl ModelReply {
    pub fn into_display(self) -> String {
        match self {
            ModelReply::Text(text) | ModelReply::NoText(text) => text,
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum VisionError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("{0}")]
    Other(String),
}

/// Trait for image-capable generative models.
#[async_trait::async_trait]
pub trait VisionClient: Send + Sync {
    async fn generate(&self, parts: Vec<Part>) -> Result<ModelReply, VisionError>;
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    role: String,
    parts: Vec<WirePart>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum WirePart {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

#[derive(Debug, Serialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    message: String,
    status: Option<String>,
    #[serde(default)]
    details: Vec<serde_json::Value>,
}

impl From<Part> for WirePart {
    fn from(part: Part) -> Self {
        match part {
            Part::Text(text) => WirePart::Text { text },
            Part::Image(image) => WirePart::InlineData {
                inline_data: InlineData {
                    mime_type: image.mime_type,
                    data: general_purpose::STANDARD.encode(&image.data),
                },
            },
        }
    }
}

/// Google Gemini `generateContent` REST client.
pub struct GeminiService {
    api_key: String,
    model: String,
    api_url: String,
    client: reqwest::Client,
}

impl GeminiService {
    pub fn new(config: &GeminiConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            api_url: config.api_url.clone(),
            client,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.api_url, self.model)
    }
}

#[async_trait::async_trait]
impl VisionClient for GeminiService {
    async fn generate(&self, parts: Vec<Part>) -> Result<ModelReply, VisionError> {
        let request = GenerateRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: parts.into_iter().map(WirePart::from).collect(),
            }],
        };

        log::info!("🤖 Sending request to Gemini with model: {}", self.model);

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(|e| VisionError::Other(e.without_url().to_string()))?;

        let status = response.status();
        log::debug!("📥 Gemini response status: {}", status);

        let body = response
            .text()
            .await
            .map_err(|e| VisionError::Other(e.without_url().to_string()))?;

        if !status.is_success() {
            log::error!("❌ Gemini API error ({}): {}", status, body);
            return Err(classify_error(status, &body));
        }

        log::debug!("📄 Raw Gemini response size: {} bytes", body.len());
        parse_reply(&body)
    }
}

/// Map a non-2xx Gemini response onto the failure kinds we distinguish.
pub fn classify_error(status: StatusCode, body: &str) -> VisionError {
    let (message, rpc_status) = match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(parsed) => {
            let reasons: Vec<&str> = parsed
                .error
                .details
                .iter()
                .filter_map(|d| d.get("reason").and_then(|r| r.as_str()))
                .collect();
            let mut message = parsed.error.message;
            if !reasons.is_empty() {
                message = format!("{} [reason: {}]", message, reasons.join(", "));
            }
            (message, parsed.error.status)
        }
        Err(_) => (body.trim().to_string(), None),
    };

    match rpc_status.as_deref() {
        Some("INVALID_ARGUMENT") => VisionError::InvalidArgument(message),
        Some("RESOURCE_EXHAUSTED") => VisionError::ResourceExhausted(message),
        Some(_) => VisionError::Api {
            status: status.as_u16(),
            message,
        },
        None if status == StatusCode::BAD_REQUEST => VisionError::InvalidArgument(message),
        None if status == StatusCode::TOO_MANY_REQUESTS => VisionError::ResourceExhausted(message),
        None => VisionError::Api {
            status: status.as_u16(),
            message,
        },
    }
}

/// Join the text parts of the first candidate, falling back to the raw body.
fn parse_reply(body: &str) -> Result<ModelReply, VisionError> {
    let parsed: GenerateResponse = serde_json::from_str(body)
        .map_err(|e| VisionError::Other(format!("failed to parse Gemini response: {}", e)))?;

    let text: Vec<String> = parsed
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.is_empty() {
        log::warn!("⚠️ Gemini response had no text part, showing raw response");
        Ok(ModelReply::NoText(body.to_string()))
    } else {
        Ok(ModelReply::Text(text.concat()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_part_order_and_encoding() {
        let parts = vec![
            Part::Text("lunch".to_string()),
            Part::Image(ImagePayload {
                mime_type: "image/png".to_string(),
                data: vec![1, 2, 3],
            }),
            Part::Text("prompt".to_string()),
        ];
        let request = GenerateRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: parts.into_iter().map(WirePart::from).collect(),
            }],
        };

        let json = serde_json::to_value(&request).unwrap();
        let wire = &json["contents"][0]["parts"];
        assert_eq!(wire[0]["text"], "lunch");
        assert_eq!(wire[1]["inline_data"]["mime_type"], "image/png");
        assert_eq!(wire[1]["inline_data"]["data"], "AQID");
        assert_eq!(wire[2]["text"], "prompt");
    }

    #[test]
    fn test_parse_reply_joins_text_parts() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"1. Rice - 200"},{"text":"\n----"}]}}]}"#;
        assert_eq!(
            parse_reply(body).unwrap(),
            ModelReply::Text("1. Rice - 200\n----".to_string())
        );
    }

    #[test]
    fn test_parse_reply_without_text_falls_back_to_raw() {
        let body = r#"{"candidates":[{"finishReason":"SAFETY"}]}"#;
        assert_eq!(parse_reply(body).unwrap(), ModelReply::NoText(body.to_string()));
    }

    #[test]
    fn test_parse_reply_rejects_garbage() {
        assert!(matches!(parse_reply("<html>"), Err(VisionError::Other(_))));
    }

    #[test]
    fn test_classify_invalid_key_keeps_reason() {
        let body = r#"{"error":{"code":400,"message":"API key not valid. Please pass a valid API key.","status":"INVALID_ARGUMENT","details":[{"@type":"type.googleapis.com/google.rpc.ErrorInfo","reason":"API_KEY_INVALID"}]}}"#;
        match classify_error(StatusCode::BAD_REQUEST, body) {
            VisionError::InvalidArgument(message) => assert!(message.contains("API_KEY_INVALID")),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_classify_quota_and_generic() {
        let quota = r#"{"error":{"code":429,"message":"Quota exceeded","status":"RESOURCE_EXHAUSTED"}}"#;
        assert!(matches!(
            classify_error(StatusCode::TOO_MANY_REQUESTS, quota),
            VisionError::ResourceExhausted(_)
        ));

        let internal = r#"{"error":{"code":500,"message":"Internal error","status":"INTERNAL"}}"#;
        assert_eq!(
            classify_error(StatusCode::INTERNAL_SERVER_ERROR, internal),
            VisionError::Api {
                status: 500,
                message: "Internal error".to_string()
            }
        );

        assert!(matches!(
            classify_error(StatusCode::TOO_MANY_REQUESTS, "slow down"),
            VisionError::ResourceExhausted(_)
        ));
        assert!(matches!(
            classify_error(StatusCode::BAD_GATEWAY, "bad gateway"),
            VisionError::Api { status: 502, .. }
        ));
    }
}
