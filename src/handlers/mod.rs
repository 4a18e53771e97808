pub mod dispatcher;
pub mod image_analysis;
pub mod nutrition_lookup;

pub use dispatcher::Dispatcher;
pub use image_analysis::ImageAnalyzer;
pub use nutrition_lookup::NutritionLookup;

/// In-memory stand-ins for the downstream clients.
#[cfg(test)]
pub mod testing {
    use std::sync::Arc;

    use parking_lot::Mutex;

    use crate::models::NutritionItem;
    use crate::services::gemini::ModelReply;
    use crate::services::{LookupError, NutritionSource, Part, VisionClient, VisionError};

    pub struct FakeVision {
        pub reply: Result<ModelReply, VisionError>,
        pub calls: Mutex<Vec<Vec<Part>>>,
    }

    impl FakeVision {
        pub fn new(reply: Result<ModelReply, VisionError>) -> Arc<Self> {
            Arc::new(Self {
                reply,
                calls: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait::async_trait]
    impl VisionClient for FakeVision {
        async fn generate(&self, parts: Vec<Part>) -> Result<ModelReply, VisionError> {
            self.calls.lock().push(parts);
            self.reply.clone()
        }
    }

    pub struct FakeSource {
        pub reply: Result<Vec<NutritionItem>, LookupError>,
        queries: Mutex<Vec<String>>,
    }

    impl FakeSource {
        pub fn new(reply: Result<Vec<NutritionItem>, LookupError>) -> Arc<Self> {
            Arc::new(Self {
                reply,
                queries: Mutex::new(Vec::new()),
            })
        }

        pub fn queries(&self) -> Vec<String> {
            self.queries.lock().clone()
        }
    }

    #[async_trait::async_trait]
    impl NutritionSource for FakeSource {
        async fn fetch_items(&self, query: &str) -> Result<Vec<NutritionItem>, LookupError> {
            self.queries.lock().push(query.to_string());
            self.reply.clone()
        }
    }
}
