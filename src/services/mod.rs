pub mod calorie_ninjas; // CalorieNinjas text lookup
pub mod gemini; // Google Gemini vision model

pub use calorie_ninjas::{CalorieNinjasClient, LookupError, NutritionSource};
pub use gemini::{GeminiService, Part, VisionClient, VisionError};
