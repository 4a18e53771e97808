use serde::{Deserialize, Serialize};

/// One submitted request: free text and/or an uploaded image.
#[derive(Debug, Clone, Default)]
pub struct UserQuery {
    pub text: Option<String>,
    pub image: Option<UploadedImage>,
}

impl UserQuery {
    /// Text trimmed, or None when missing or blank.
    pub fn trimmed_text(&self) -> Option<&str> {
        self.text
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

/// Raw upload as received from the form, before normalization.
#[derive(Debug, Clone, Default)]
pub struct UploadedImage {
    pub data: Vec<u8>,
    pub content_type: Option<String>,
    pub file_name: Option<String>,
}

/// Image ready to be sent to the vision client.
#[derive(Debug, Clone, PartialEq)]
pub struct ImagePayload {
    pub mime_type: String,
    pub data: Vec<u8>,
}

/// One food item as returned by the lookup service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutritionItem {
    #[serde(default = "default_item_name")]
    pub name: String,
    #[serde(default)]
    pub calories: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serving_size: Option<String>,
}

fn default_item_name() -> String {
    "item".to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultKind {
    Success,
    NoData,
    Unavailable,
    ImageUnprepared,
    CredentialInvalid,
    BadRequest,
    QuotaExceeded,
    UpstreamError,
    TransportError,
    Unexpected,
}

impl ResultKind {
    /// `Success` and `NoData` are valid answers; everything else is a failure.
    pub fn is_error(self) -> bool {
        !matches!(self, ResultKind::Success | ResultKind::NoData)
    }
}

impl std::fmt::Display for ResultKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ResultKind::Success => "success",
            ResultKind::NoData => "no_data",
            ResultKind::Unavailable => "unavailable",
            ResultKind::ImageUnprepared => "image_unprepared",
            ResultKind::CredentialInvalid => "credential_invalid",
            ResultKind::BadRequest => "bad_request",
            ResultKind::QuotaExceeded => "quota_exceeded",
            ResultKind::UpstreamError => "upstream_error",
            ResultKind::TransportError => "transport_error",
            ResultKind::Unexpected => "unexpected",
        };
        write!(f, "{}", s)
    }
}

/// Text shown to the user for one path, tagged with exactly one kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub kind: ResultKind,
    pub message: String,
}

impl AnalysisResult {
    pub fn new(kind: ResultKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(ResultKind::Success, message)
    }

    pub fn is_error(&self) -> bool {
        self.kind.is_error()
    }
}

/// Results of one dispatch. A slot is None when its path did not run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DispatchOutcome {
    pub image: Option<AnalysisResult>,
    pub text: Option<AnalysisResult>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trimmed_text() {
        let query = UserQuery {
            text: Some("  rice  ".to_string()),
            image: None,
        };
        assert_eq!(query.trimmed_text(), Some("rice"));

        let blank = UserQuery {
            text: Some(" \t\n".to_string()),
            image: None,
        };
        assert_eq!(blank.trimmed_text(), None);
        assert_eq!(UserQuery::default().trimmed_text(), None);
    }

    #[test]
    fn test_nutrition_item_defaults() {
        let item: NutritionItem = serde_json::from_str("{}").unwrap();
        assert_eq!(item.name, "item");
        assert_eq!(item.calories, 0.0);
        assert!(item.serving_size.is_none());
    }

    #[test]
    fn test_kind_error_classification() {
        assert!(!ResultKind::Success.is_error());
        assert!(!ResultKind::NoData.is_error());
        assert!(ResultKind::Unavailable.is_error());
        assert!(ResultKind::QuotaExceeded.is_error());
        assert_eq!(ResultKind::CredentialInvalid.to_string(), "credential_invalid");
        assert_eq!(
            serde_json::to_string(&ResultKind::NoData).unwrap(),
            "\"no_data\""
        );
    }
}
