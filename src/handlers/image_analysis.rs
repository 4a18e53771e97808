use std::sync::Arc;

use thiserror::Error;

use crate::models::{AnalysisResult, ImagePayload, ResultKind, UploadedImage};
use crate::services::{Part, VisionClient, VisionError};

pub const NUTRITIONIST_PROMPT: &str = "You are an expert nutritionist. Look at the image and identify each food item,
estimate its calories, and list results in this format:

1. Item 1 - number of calories
2. Item 2 - number of calories
----
Also provide short notes about portion size assumptions you used.
";

const SUPPORTED_TYPES: &[&str] = &["image/jpeg", "image/png"];

#[derive(Debug, Error, PartialEq)]
pub enum ImageError {
    #[error("the uploaded file is empty")]
    Empty,
    #[error("the uploaded file has no image type")]
    MissingType,
    #[error("unsupported image type '{0}' (use JPG or PNG)")]
    UnsupportedType(String),
}

impl From<ImageError> for AnalysisResult {
    fn from(err: ImageError) -> Self {
        AnalysisResult::new(
            ResultKind::ImageUnprepared,
            format!("Could not prepare the image for analysis: {}", err),
        )
    }
}

impl From<VisionError> for AnalysisResult {
    fn from(err: VisionError) -> Self {
        match err {
            VisionError::InvalidArgument(msg)
                if msg.contains("API_KEY_INVALID") || msg.contains("API key expired") =>
            {
                AnalysisResult::new(
                    ResultKind::CredentialInvalid,
                    "⚠️ Your Google API key is invalid or expired. Renew it in Google AI Studio.",
                )
            }
            VisionError::InvalidArgument(msg) => {
                AnalysisResult::new(ResultKind::BadRequest, format!("❌ Invalid argument: {}", msg))
            }
            VisionError::ResourceExhausted(_) => AnalysisResult::new(
                ResultKind::QuotaExceeded,
                "🚫 Google API quota exceeded. Try again later.",
            ),
            err @ VisionError::Api { .. } => {
                AnalysisResult::new(ResultKind::UpstreamError, format!("❗ Google API error: {}", err))
            }
            VisionError::Other(msg) => {
                AnalysisResult::new(ResultKind::Unexpected, format!("💥 Unexpected error: {}", msg))
            }
        }
    }
}

/// Turn a raw upload into a payload the vision model accepts.
///
/// The declared content type wins; a missing or generic one falls back to
/// the file extension.
pub fn prepare_image(upload: &UploadedImage) -> Result<ImagePayload, ImageError> {
    if upload.data.is_empty() {
        return Err(ImageError::Empty);
    }

    let declared = upload
        .content_type
        .as_deref()
        .map(|t| t.trim().to_ascii_lowercase())
        .filter(|t| !t.is_empty() && t != "application/octet-stream");

    let mime_type = match declared {
        Some(t) => t,
        None => upload
            .file_name
            .as_deref()
            .and_then(mime_from_extension)
            .ok_or(ImageError::MissingType)?
            .to_string(),
    };

    let mime_type = if mime_type == "image/jpg" {
        "image/jpeg".to_string()
    } else {
        mime_type
    };

    if !SUPPORTED_TYPES.contains(&mime_type.as_str()) {
        return Err(ImageError::UnsupportedType(mime_type));
    }

    Ok(ImagePayload {
        mime_type,
        data: upload.data.clone(),
    })
}

fn mime_from_extension(file_name: &str) -> Option<&'static str> {
    let (_, ext) = file_name.rsplit_once('.')?;
    match ext.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        _ => None,
    }
}

/// Image path: asks the vision model for a calorie estimate.
pub struct ImageAnalyzer {
    client: Arc<dyn VisionClient>,
}

impl ImageAnalyzer {
    pub fn new(client: Arc<dyn VisionClient>) -> Self {
        Self { client }
    }

    /// Never fails; every client error becomes a tagged result.
    pub async fn analyze_image(&self, payload: &ImagePayload, context: &str) -> AnalysisResult {
        log::info!(
            "📸 Analyzing {} image ({} bytes), context: '{}'",
            payload.mime_type,
            payload.data.len(),
            context
        );

        let parts = vec![
            Part::Text(context.to_string()),
            Part::Image(payload.clone()),
            Part::Text(NUTRITIONIST_PROMPT.to_string()),
        ];

        match self.client.generate(parts).await {
            Ok(reply) => AnalysisResult::success(reply.into_display()),
            Err(e) => {
                log::warn!("⚠️ Image analysis failed: {}", e);
                e.into()
            }
        }
    }
}
