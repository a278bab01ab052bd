//! Configuration types.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Default Gemini model used for enrichment.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Service configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Address the HTTP server binds to.
    pub bind_addr: String,
    /// Path of the labeled training dataset.
    pub dataset_path: PathBuf,
    /// Generative model settings. `None` when no API key is present.
    pub llm: Option<LlmSettings>,
    /// Maximum accepted upload size in bytes.
    pub max_upload_bytes: usize,
}

/// Settings for the remote generative model.
#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub api_key: SecretString,
    pub model: String,
    /// Overrides the public Gemini endpoint (tests, proxies).
    pub base_url: Option<String>,
    pub temperature: f32,
    pub timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:5000".to_string(),
            dataset_path: PathBuf::from("data/dataset.json"),
            llm: None,
            max_upload_bytes: 10 * 1024 * 1024, // 10 MiB
        }
    }
}

impl AppConfig {
    /// Build configuration from environment variables.
    ///
    /// A missing API key is not an error: the service starts with
    /// enrichment disabled.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let bind_addr = lookup("EMAIL_TRIAGE_BIND").unwrap_or(defaults.bind_addr);
        let dataset_path = lookup("EMAIL_TRIAGE_DATASET")
            .map(PathBuf::from)
            .unwrap_or(defaults.dataset_path);
        let max_upload_bytes =
            parse_or("EMAIL_TRIAGE_MAX_UPLOAD_BYTES", &lookup, defaults.max_upload_bytes)?;

        let present = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let api_key = present("GEMINI_API_KEY").or_else(|| present("API_KEY"));

        let llm = match api_key {
            Some(key) => {
                let temperature: f32 = parse_or("EMAIL_TRIAGE_TEMPERATURE", &lookup, 0.2)?;
                if !(0.0..=2.0).contains(&temperature) {
                    return Err(ConfigError::InvalidValue {
                        key: "EMAIL_TRIAGE_TEMPERATURE".into(),
                        message: format!("{temperature} is outside 0.0..=2.0"),
                    });
                }
                let timeout_secs: u64 = parse_or("EMAIL_TRIAGE_TIMEOUT_SECS", &lookup, 30)?;
                Some(LlmSettings {
                    api_key: SecretString::from(key),
                    model: lookup("EMAIL_TRIAGE_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                    base_url: lookup("GEMINI_BASE_URL"),
                    temperature,
                    timeout: Duration::from_secs(timeout_secs),
                })
            }
            None => None,
        };

        Ok(Self {
            bind_addr,
            dataset_path,
            llm,
            max_upload_bytes,
        })
    }
}

fn parse_or<T, F>(key: &str, lookup: &F, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_env() {
        let config = AppConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:5000");
        assert_eq!(config.dataset_path, PathBuf::from("data/dataset.json"));
        assert!(config.llm.is_none());
    }

    #[test]
    fn api_key_enables_llm_with_defaults() {
        let config = AppConfig::from_lookup(lookup_from(&[("GEMINI_API_KEY", "k-123")])).unwrap();
        let llm = config.llm.expect("llm settings");
        assert_eq!(llm.api_key.expose_secret(), "k-123");
        assert_eq!(llm.model, DEFAULT_MODEL);
        assert!((llm.temperature - 0.2).abs() < f32::EPSILON);
        assert_eq!(llm.timeout, Duration::from_secs(30));
    }

    #[test]
    fn legacy_api_key_variable_is_accepted() {
        let config = AppConfig::from_lookup(lookup_from(&[("API_KEY", "legacy")])).unwrap();
        assert!(config.llm.is_some());
    }

    #[test]
    fn blank_api_key_disables_llm() {
        let config = AppConfig::from_lookup(lookup_from(&[("GEMINI_API_KEY", "  ")])).unwrap();
        assert!(config.llm.is_none());
    }

    #[test]
    fn blank_gemini_key_falls_back_to_api_key() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("GEMINI_API_KEY", ""),
            ("API_KEY", "legacy"),
        ]))
        .unwrap();
        let llm = config.llm.expect("llm settings");
        assert_eq!(llm.api_key.expose_secret(), "legacy");
    }

    #[test]
    fn invalid_number_is_rejected() {
        let err = AppConfig::from_lookup(lookup_from(&[
            ("GEMINI_API_KEY", "k"),
            ("EMAIL_TRIAGE_TIMEOUT_SECS", "soon"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("EMAIL_TRIAGE_TIMEOUT_SECS"));
    }

    #[test]
    fn out_of_range_temperature_is_rejected() {
        let result = AppConfig::from_lookup(lookup_from(&[
            ("GEMINI_API_KEY", "k"),
            ("EMAIL_TRIAGE_TEMPERATURE", "3.5"),
        ]));
        assert!(result.is_err());
    }
}
