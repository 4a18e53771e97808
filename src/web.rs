use serde::{Deserialize, Serialize};

use crate::models::{AnalysisResult, DispatchOutcome, UploadedImage, UserQuery};

pub const NO_IMAGE_HINT: &str = "No image provided. Upload an image to run Gemini-based analysis.";
pub const NO_TEXT_HINT: &str =
    "Type a dish or short ingredient list above to run a quick text lookup.";
pub const UPLOAD_TOO_LARGE: &str =
    "The uploaded file is too large. Try a smaller or more compressed image.";
pub const NO_LOOKUP_KEY_HINT: &str =
    "CalorieNinjas key not set. Add CALORIE_NINJAS_KEY to secrets or .env to enable text lookup.";

/// One rendered result panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelView {
    pub kind: String,
    pub message: String,
    pub is_error: bool,
}

impl PanelView {
    fn skipped(message: &str) -> Self {
        Self {
            kind: "skipped".to_string(),
            message: message.to_string(),
            is_error: false,
        }
    }
}

impl From<AnalysisResult> for PanelView {
    fn from(result: AnalysisResult) -> Self {
        Self {
            kind: result.kind.to_string(),
            is_error: result.is_error(),
            message: result.message,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub image: PanelView,
    pub text: PanelView,
}

impl AnalyzeResponse {
    /// Fill the panel of a path that did not run with the matching hint.
    pub fn from_outcome(outcome: DispatchOutcome, lookup_available: bool) -> Self {
        let image = outcome
            .image
            .map(PanelView::from)
            .unwrap_or_else(|| PanelView::skipped(NO_IMAGE_HINT));

        let text = outcome.text.map(PanelView::from).unwrap_or_else(|| {
            if lookup_available {
                PanelView::skipped(NO_TEXT_HINT)
            } else {
                PanelView::skipped(NO_LOOKUP_KEY_HINT)
            }
        });

        Self { image, text }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Collects form fields into a query. A file input left empty counts as no image.
#[derive(Debug, Default)]
pub struct QueryBuilder {
    query: UserQuery,
}

impl QueryBuilder {
    pub fn text(&mut self, text: String) {
        self.query.text = Some(text);
    }

    pub fn image(&mut self, data: Vec<u8>, content_type: Option<String>, file_name: Option<String>) {
        let file_name = file_name.filter(|n| !n.is_empty());
        if data.is_empty() && file_name.is_none() {
            return;
        }
        self.query.image = Some(UploadedImage {
            data,
            content_type,
            file_name,
        });
    }

    pub fn build(self) -> UserQuery {
        self.query
    }
}

#[cfg(feature = "web-server")]
pub mod server {
    use super::*;
    use std::sync::Arc;

    use axum::{
        extract::{DefaultBodyLimit, Multipart, State},
        http::StatusCode,
        middleware,
        response::{Html, IntoResponse, Response},
        routing::{get, post},
        Json, Router,
    };
    use tower_http::limit::RequestBodyLimitLayer;

    use crate::handlers::Dispatcher;

    pub struct AppState {
        pub dispatcher: Arc<Dispatcher>,
    }

    pub fn create_router(dispatcher: Arc<Dispatcher>, max_upload_bytes: usize) -> Router {
        let state = Arc::new(AppState { dispatcher });

        Router::new()
            .route("/", get(index_page))
            .route("/api/analyze", post(analyze_handler))
            .route("/health", get(health_check))
            .layer(DefaultBodyLimit::disable())
            .layer(RequestBodyLimitLayer::new(max_upload_bytes))
            .layer(middleware::map_response(too_large_as_json))
            .with_state(state)
    }

    /// The body limit answers 413 in plain text; the page expects JSON errors.
    async fn too_large_as_json(response: Response) -> Response {
        if response.status() != StatusCode::PAYLOAD_TOO_LARGE {
            return response;
        }
        log::warn!("⚠️ Rejected upload over the size limit");
        (
            StatusCode::PAYLOAD_TOO_LARGE,
            Json(ErrorResponse {
                error: UPLOAD_TOO_LARGE.to_string(),
            }),
        )
            .into_response()
    }

    fn bad_request(message: impl Into<String>) -> Response {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: message.into(),
            }),
        )
            .into_response()
    }

    async fn read_form(mut multipart: Multipart) -> Result<UserQuery, String> {
        let mut builder = QueryBuilder::default();

        while let Some(field) = multipart.next_field().await.map_err(|e| e.to_string())? {
            let name = field.name().map(str::to_string);
            match name.as_deref() {
                Some("text") => builder.text(field.text().await.map_err(|e| e.to_string())?),
                Some("image") => {
                    let content_type = field.content_type().map(str::to_string);
                    let file_name = field.file_name().map(str::to_string);
                    let data = field.bytes().await.map_err(|e| e.to_string())?;
                    log::debug!("📦 Received image field: {:?} ({} bytes)", file_name, data.len());
                    builder.image(data.to_vec(), content_type, file_name);
                }
                other => log::debug!("Ignoring form field {:?}", other),
            }
        }

        Ok(builder.build())
    }

    async fn analyze_handler(State(state): State<Arc<AppState>>, multipart: Multipart) -> Response {
        let query = match read_form(multipart).await {
            Ok(q) => q,
            Err(e) => {
                log::error!("❌ Failed to read analyze form: {}", e);
                return bad_request(format!("Could not read the submitted form: {}", e));
            }
        };

        match state.dispatcher.dispatch(query).await {
            Ok(outcome) => {
                let response =
                    AnalyzeResponse::from_outcome(outcome, state.dispatcher.lookup_available());
                log::info!(
                    "✅ Analysis done - image: {} | text: {}",
                    response.image.kind,
                    response.text.kind
                );
                (StatusCode::OK, Json(response)).into_response()
            }
            Err(e) => bad_request(e.to_string()),
        }
    }

    async fn index_page() -> Html<&'static str> {
        Html(include_str!("../static/index.html"))
    }

    async fn health_check() -> &'static str {
        "OK"
    }
}
