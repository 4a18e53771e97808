use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use parking_lot::Mutex;

use crate::models::{AnalysisResult, NutritionItem, ResultKind};
use crate::services::{LookupError, NutritionSource};

pub const LOOKUP_UNAVAILABLE: &str = "Calorie lookup unavailable: CALORIE_NINJAS_KEY not set.";
pub const NO_DATA_FOUND: &str = "No nutrition data found for that query.";

impl From<LookupError> for AnalysisResult {
    fn from(err: LookupError) -> Self {
        match err {
            LookupError::Transport(msg) => AnalysisResult::new(
                ResultKind::TransportError,
                format!("Error calling CalorieNinjas: {}", msg),
            ),
            LookupError::Unexpected(msg) => AnalysisResult::new(
                ResultKind::Unexpected,
                format!("Unexpected error in calorie lookup: {}", msg),
            ),
        }
    }
}

/// Render items one per line, then the separator and the total.
///
/// `rice — 200 kcal` or `chicken curry (1 bowl) — 350 kcal`, in service order.
pub fn format_items(items: &[NutritionItem]) -> String {
    let mut lines: Vec<String> = items
        .iter()
        .map(|item| match item.serving_size.as_deref().filter(|s| !s.is_empty()) {
            Some(serving) => format!("{} ({}) — {} kcal", item.name, serving, item.calories),
            None => format!("{} — {} kcal", item.name, item.calories),
        })
        .collect();

    let total: f64 = items.iter().map(|item| item.calories).sum();
    lines.push("----".to_string());
    lines.push(format!("Estimated total: {} kcal", total));
    lines.join("\n")
}

/// Text path: looks a free-text meal description up in the nutrition database.
///
/// Answers are cached per exact query string; failures are not.
pub struct NutritionLookup {
    source: Option<Arc<dyn NutritionSource>>,
    cache: Option<Mutex<LruCache<String, AnalysisResult>>>,
}

impl NutritionLookup {
    pub fn new(source: Option<Arc<dyn NutritionSource>>, cache_size: usize) -> Self {
        Self {
            source,
            cache: NonZeroUsize::new(cache_size).map(|n| Mutex::new(LruCache::new(n))),
        }
    }

    pub fn is_available(&self) -> bool {
        self.source.is_some()
    }

    /// Never fails; every source error becomes a tagged result.
    pub async fn lookup_nutrition(&self, query: &str) -> AnalysisResult {
        let Some(source) = &self.source else {
            log::warn!("⚠️ Text lookup requested but CALORIE_NINJAS_KEY is not set");
            return AnalysisResult::new(ResultKind::Unavailable, LOOKUP_UNAVAILABLE);
        };

        if let Some(cached) = self.cached(query) {
            log::debug!("♻️ Lookup cache hit for '{}'", query);
            return cached;
        }

        let result = match source.fetch_items(query).await {
            Ok(items) if items.is_empty() => AnalysisResult::new(ResultKind::NoData, NO_DATA_FOUND),
            Ok(items) => AnalysisResult::success(format_items(&items)),
            Err(e) => {
                log::warn!("⚠️ Nutrition lookup failed: {}", e);
                return e.into();
            }
        };

        if let Some(cache) = &self.cache {
            cache.lock().put(query.to_string(), result.clone());
        }

        result
    }

    fn cached(&self, query: &str) -> Option<AnalysisResult> {
        self.cache.as_ref()?.lock().get(query).cloned()
    }
}
