// SPDX-License-Identifier: MIT

//! Session configuration
//!
//! Sources, lowest priority first: built-in defaults, an optional YAML file,
//! environment variables, then whatever the caller overrides (CLI flags).

use crate::adk::error::MeteoError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

#[derive(Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SessionConfig {
    /// Credential for the language model
    pub google_api_key: Option<String>,
    /// Override for the language model endpoint
    pub model_base_url: Option<String>,
    /// Credential for the authoritative alerts source; without it alerts
    /// come from web search
    pub aemet_api_key: Option<String>,
    /// Optional Brave Search token, tried before DuckDuckGo
    pub brave_api_key: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub max_iterations: u32,
    /// Language preference for geocoding results
    pub language: String,
    pub http_timeout_secs: u64,
    pub bulletin_timeout_secs: u64,
    pub model_timeout_secs: u64,
    pub search_max_results: usize,
    pub alert_snippet_chars: usize,
    pub memory_capacity: Option<usize>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            google_api_key: None,
            model_base_url: None,
            aemet_api_key: None,
            brave_api_key: None,
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.0,
            max_iterations: 6,
            language: "es".to_string(),
            http_timeout_secs: 10,
            bulletin_timeout_secs: 20,
            model_timeout_secs: 60,
            search_max_results: 5,
            alert_snippet_chars: 500,
            memory_capacity: None,
        }
    }
}

// Keys stay out of logs
impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn redact(key: &Option<String>) -> &'static str {
            if key.is_some() {
                "<set>"
            } else {
                "<unset>"
            }
        }
        f.debug_struct("SessionConfig")
            .field("google_api_key", &redact(&self.google_api_key))
            .field("model_base_url", &self.model_base_url)
            .field("aemet_api_key", &redact(&self.aemet_api_key))
            .field("brave_api_key", &redact(&self.brave_api_key))
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_iterations", &self.max_iterations)
            .field("language", &self.language)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .field("bulletin_timeout_secs", &self.bulletin_timeout_secs)
            .field("model_timeout_secs", &self.model_timeout_secs)
            .field("search_max_results", &self.search_max_results)
            .field("alert_snippet_chars", &self.alert_snippet_chars)
            .field("memory_capacity", &self.memory_capacity)
            .finish()
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T, MeteoError> {
    raw.trim()
        .parse()
        .map_err(|_| MeteoError::config(format!("{} has an invalid value: '{}'", name, raw)))
}

impl SessionConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, MeteoError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, MeteoError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Overlay values from the process environment
    pub fn apply_env(self) -> Result<Self, MeteoError> {
        self.apply_env_from(|name| std::env::var(name).ok())
    }

    /// Overlay values from an arbitrary variable lookup
    pub fn apply_env_from<F>(mut self, lookup: F) -> Result<Self, MeteoError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty("GOOGLE_API_KEY") {
            self.google_api_key = Some(key);
        }
        if let Some(key) = non_empty("AEMET_API_KEY") {
            self.aemet_api_key = Some(key);
        }
        if let Some(key) = non_empty("BRAVE_API_KEY") {
            self.brave_api_key = Some(key);
        }
        if let Some(url) = non_empty("GEMINI_BASE_URL") {
            self.model_base_url = Some(url);
        }
        if let Some(model) = non_empty("METEO_MODEL") {
            self.model = model;
        }
        if let Some(raw) = non_empty("METEO_TEMPERATURE") {
            self.temperature = parse_env("METEO_TEMPERATURE", &raw)?;
        }
        if let Some(raw) = non_empty("METEO_MAX_ITERATIONS") {
            self.max_iterations = parse_env("METEO_MAX_ITERATIONS", &raw)?;
        }
        Ok(self)
    }

    /// Check the configuration before the first turn
    pub fn validate(&self) -> Result<(), MeteoError> {
        if self
            .google_api_key
            .as_deref()
            .map_or(true, |k| k.trim().is_empty())
        {
            return Err(MeteoError::config(
                "GOOGLE_API_KEY is not set; get a key at https://aistudio.google.com/app/apikey",
            ));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(MeteoError::config(format!(
                "temperature must be between 0.0 and 2.0, got {}",
                self.temperature
            )));
        }
        if self.max_iterations == 0 {
            return Err(MeteoError::config("max_iterations must be at least 1"));
        }
        if self.model.trim().is_empty() {
            return Err(MeteoError::config("model must not be empty"));
        }
        Ok(())
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn bulletin_timeout(&self) -> Duration {
        Duration::from_secs(self.bulletin_timeout_secs)
    }

    pub fn model_timeout(&self) -> Duration {
        Duration::from_secs(self.model_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.model, "gemini-2.5-flash");
        assert_eq!(config.temperature, 0.0);
        assert_eq!(config.http_timeout(), Duration::from_secs(10));
        assert!(config.aemet_api_key.is_none());
    }

    #[test]
    fn test_yaml_partial_overrides_defaults() {
        let config = SessionConfig::from_yaml_str(
            "model: gemini-1.5-pro\nmax_iterations: 3\nmemory_capacity: 20\n",
        )
        .unwrap();
        assert_eq!(config.model, "gemini-1.5-pro");
        assert_eq!(config.max_iterations, 3);
        assert_eq!(config.memory_capacity, Some(20));
        assert_eq!(config.language, "es");
    }

    #[test]
    fn test_yaml_type_error() {
        assert!(matches!(
            SessionConfig::from_yaml_str("max_iterations: lots"),
            Err(MeteoError::Yaml(_))
        ));
    }

    #[test]
    fn test_env_overlay() {
        let config = SessionConfig::default()
            .apply_env_from(env(&[
                ("GOOGLE_API_KEY", "g-key"),
                ("AEMET_API_KEY", ""),
                ("METEO_TEMPERATURE", "0.7"),
                ("METEO_MAX_ITERATIONS", "4"),
            ]))
            .unwrap();
        assert_eq!(config.google_api_key.as_deref(), Some("g-key"));
        // Empty values are ignored
        assert!(config.aemet_api_key.is_none());
        assert_eq!(config.temperature, 0.7);
        assert_eq!(config.max_iterations, 4);
    }

    #[test]
    fn test_env_invalid_number() {
        let err = SessionConfig::default()
            .apply_env_from(env(&[("METEO_MAX_ITERATIONS", "many")]))
            .unwrap_err();
        assert!(err.to_string().contains("METEO_MAX_ITERATIONS"));
    }

    #[test]
    fn test_validate() {
        let mut config = SessionConfig::default();
        assert!(config.validate().is_err());

        config.google_api_key = Some("key".to_string());
        assert!(config.validate().is_ok());

        config.temperature = 3.0;
        assert!(config.validate().is_err());

        config.temperature = 0.5;
        config.max_iterations = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_debug_redacts_keys() {
        let config = SessionConfig {
            google_api_key: Some("super-secret".to_string()),
            ..Default::default()
        };
        let debug = format!("{:?}", config);
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("<set>"));
    }
}
