use thiserror::Error;

use crate::handlers::image_analysis::{prepare_image, ImageAnalyzer};
use crate::handlers::nutrition_lookup::NutritionLookup;
use crate::models::{AnalysisResult, DispatchOutcome, UserQuery};

#[derive(Debug, Error, PartialEq)]
pub enum DispatchError {
    #[error("Please upload an image or type a dish/ingredients (or both).")]
    NoInput,
}

/// Decides which paths run for a query and collects their results.
pub struct Dispatcher {
    image: ImageAnalyzer,
    lookup: NutritionLookup,
}

impl Dispatcher {
    pub fn new(image: ImageAnalyzer, lookup: NutritionLookup) -> Self {
        Self { image, lookup }
    }

    pub fn lookup_available(&self) -> bool {
        self.lookup.is_available()
    }

    pub async fn dispatch(&self, query: UserQuery) -> Result<DispatchOutcome, DispatchError> {
        let text = query.trimmed_text();

        if text.is_none() && query.image.is_none() {
            log::info!("🚫 Rejected empty query");
            return Err(DispatchError::NoInput);
        }

        log::info!(
            "📨 Dispatching query - text: {:?} | image: {}",
            text,
            query.image.is_some()
        );

        let image_path = async {
            let upload = query.image.as_ref()?;
            let result = match prepare_image(upload) {
                Ok(payload) => self.image.analyze_image(&payload, text.unwrap_or("")).await,
                Err(e) => {
                    log::warn!("⚠️ Unable to prepare image for upload: {}", e);
                    AnalysisResult::from(e)
                }
            };
            Some(result)
        };

        let text_path = async {
            match text {
                Some(t) => Some(self.lookup.lookup_nutrition(t).await),
                None => None,
            }
        };

        let (image, text) = tokio::join!(image_path, text_path);
        Ok(DispatchOutcome { image, text })
    }
}
