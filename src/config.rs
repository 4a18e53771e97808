use std::env;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_CALORIE_NINJAS_URL: &str = "https://api.calorieninjas.com/v1/nutrition";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(
        "No Google API key found. Add GOOGLE_API_KEY to your .env file or export it in the terminal."
    )]
    MissingGoogleKey,
}

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub api_url: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct LookupConfig {
    /// None disables the text lookup path with an explanatory message.
    pub api_key: Option<String>,
    pub url: String,
    pub timeout: Duration,
    pub cache_size: usize,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub gemini: GeminiConfig,
    pub lookup: LookupConfig,
    pub bind_addr: String,
    pub max_upload_bytes: usize,
}

impl AppConfig {
    /// Resolve configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Resolve configuration through an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let google_key = get("GOOGLE_API_KEY").ok_or(ConfigError::MissingGoogleKey)?;

        let gemini = GeminiConfig {
            api_key: google_key,
            model: get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            api_url: get("GEMINI_API_URL")
                .unwrap_or_else(|| DEFAULT_GEMINI_API_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            timeout: Duration::from_secs(parse_or(&get, "GEMINI_TIMEOUT_SECS", 60)),
        };

        let lookup = LookupConfig {
            api_key: get("CALORIE_NINJAS_KEY"),
            url: get("CALORIE_NINJAS_URL").unwrap_or_else(|| DEFAULT_CALORIE_NINJAS_URL.to_string()),
            timeout: Duration::from_secs(parse_or(&get, "LOOKUP_TIMEOUT_SECS", 8)),
            cache_size: parse_or(&get, "LOOKUP_CACHE_SIZE", 256),
        };

        Ok(Self {
            gemini,
            lookup,
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:8080".to_string()),
            max_upload_bytes: parse_or(&get, "MAX_UPLOAD_BYTES", 10 * 1024 * 1024),
        })
    }
}

fn parse_or<F, T>(get: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr + std::fmt::Display,
{
    match get(key) {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            log::warn!("⚠️ {} has invalid value '{}', using default {}", key, raw, default);
            default
        }),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_missing_google_key_is_fatal() {
        assert!(matches!(config_from(&[]), Err(ConfigError::MissingGoogleKey)));
        assert!(matches!(
            config_from(&[("GOOGLE_API_KEY", "   ")]),
            Err(ConfigError::MissingGoogleKey)
        ));
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[("GOOGLE_API_KEY", "g-key")]).unwrap();

        assert_eq!(config.gemini.api_key, "g-key");
        assert_eq!(config.gemini.model, DEFAULT_GEMINI_MODEL);
        assert_eq!(config.gemini.api_url, DEFAULT_GEMINI_API_URL);
        assert!(config.lookup.api_key.is_none());
        assert_eq!(config.lookup.url, DEFAULT_CALORIE_NINJAS_URL);
        assert_eq!(config.lookup.timeout, Duration::from_secs(8));
        assert_eq!(config.lookup.cache_size, 256);
        assert_eq!(config.bind_addr, "0.0.0.0:8080");
        assert_eq!(config.max_upload_bytes, 10 * 1024 * 1024);
    }

    #[test]
    fn test_overrides_and_bad_numbers() {
        let config = config_from(&[
            ("GOOGLE_API_KEY", "g-key"),
            ("CALORIE_NINJAS_KEY", "cn-key"),
            ("GEMINI_API_URL", "http://localhost:9000/v1beta/"),
            ("LOOKUP_TIMEOUT_SECS", "3"),
            ("LOOKUP_CACHE_SIZE", "lots"),
        ])
        .unwrap();

        assert_eq!(config.lookup.api_key.as_deref(), Some("cn-key"));
        assert_eq!(config.gemini.api_url, "http://localhost:9000/v1beta");
        assert_eq!(config.lookup.timeout, Duration::from_secs(3));
        assert_eq!(config.lookup.cache_size, 256);
    }
}
