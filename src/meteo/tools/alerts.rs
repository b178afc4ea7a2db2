// SPDX-License-Identifier: MIT

//! Official weather alerts: AEMET OpenData first, web search second
//!
//! AEMET answers in two phases. The credentialed endpoint returns a small
//! JSON envelope whose `datos` field points at the bulletin itself; the
//! bulletin is searched as plain text for the location name. Whenever the
//! authoritative source cannot be used the lookup degrades to a web search
//! and says so.

use crate::adk::tool::Tool;
use crate::meteo::http::{HttpFetcher, HttpRequest};
use crate::meteo::tools::search::SearchChain;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

pub const AEMET_ALERTS_URL: &str =
    "https://opendata.aemet.es/opendata/api/avisos_cap/ultimoelaborado/area/esp";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlertQueryOutcome {
    /// The bulletin mentions the location
    Found { snippet: String },
    /// The bulletin was read and does not mention the location
    NotFound,
    /// The authoritative source could not be used
    SourceUnavailable { fallback_used: bool },
}

/// Outcome plus the text handed back to the agent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertReport {
    pub outcome: AlertQueryOutcome,
    pub text: String,
}

pub struct AlertsTool {
    fetcher: Arc<dyn HttpFetcher>,
    api_key: Option<String>,
    endpoint: String,
    search: Arc<SearchChain>,
    timeout: Duration,
    bulletin_timeout: Duration,
    snippet_chars: usize,
}

impl AlertsTool {
    pub fn new(
        fetcher: Arc<dyn HttpFetcher>,
        api_key: Option<String>,
        search: Arc<SearchChain>,
        timeout: Duration,
        bulletin_timeout: Duration,
        snippet_chars: usize,
    ) -> Self {
        Self {
            fetcher,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            endpoint: AEMET_ALERTS_URL.to_string(),
            search,
            timeout,
            bulletin_timeout,
            snippet_chars,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Ask AEMET. Only `Found` and `NotFound` are final answers; anything
    /// else is reported as an unavailable source.
    async fn query_authoritative(&self, location: &str, api_key: &str) -> AlertQueryOutcome {
        let unavailable = AlertQueryOutcome::SourceUnavailable {
            fallback_used: false,
        };

        let request = HttpRequest::get(&self.endpoint, self.timeout)
            .header("api_key", api_key)
            .header("Accept", "application/json");
        let envelope = match self.fetcher.fetch(request).await {
            Ok(resp) if resp.is_success() => resp.body,
            Ok(resp) => {
                log::warn!("AEMET alerts endpoint answered HTTP {}", resp.status);
                return unavailable;
            }
            Err(e) => {
                log::warn!("AEMET alerts endpoint unreachable: {}", e);
                return unavailable;
            }
        };

        let envelope: Value = match serde_json::from_str(&envelope) {
            Ok(v) => v,
            Err(e) => {
                log::warn!("AEMET envelope is not JSON: {}", e);
                return unavailable;
            }
        };
        let estado = envelope["estado"]
            .as_u64()
            .or_else(|| envelope["estado"].as_str().and_then(|s| s.parse().ok()));
        if estado != Some(200) {
            log::warn!(
                "AEMET reported status {:?}: {}",
                estado,
                envelope["descripcion"].as_str().unwrap_or("no description")
            );
            return unavailable;
        }
        let Some(datos) = envelope["datos"].as_str() else {
            log::warn!("AEMET envelope has no bulletin URL");
            return unavailable;
        };

        let bulletin = match self
            .fetcher
            .fetch(HttpRequest::get(datos, self.bulletin_timeout))
            .await
        {
            Ok(resp) if resp.is_success() => resp.body,
            Ok(resp) => {
                log::warn!("AEMET bulletin answered HTTP {}", resp.status);
                return unavailable;
            }
            Err(e) => {
                log::warn!("AEMET bulletin unreachable: {}", e);
                return unavailable;
            }
        };

        match find_snippet(&bulletin, location, self.snippet_chars) {
            Some(snippet) => AlertQueryOutcome::Found { snippet },
            None => AlertQueryOutcome::NotFound,
        }
    }

    /// Run the chain; always produces a report
    pub async fn check_alerts(&self, location: &str) -> AlertReport {
        let location = location.trim();
        if location.is_empty() {
            return AlertReport {
                outcome: AlertQueryOutcome::NotFound,
                text: "Please tell me which place you want to check for weather alerts."
                    .to_string(),
            };
        }

        let outcome = match &self.api_key {
            Some(key) => self.query_authoritative(location, key).await,
            None => {
                log::info!("No AEMET credential configured, using web search");
                AlertQueryOutcome::SourceUnavailable {
                    fallback_used: false,
                }
            }
        };

        match outcome {
            AlertQueryOutcome::Found { snippet } => AlertReport {
                text: format!(
                    "OFFICIAL ALERT (AEMET) mentioning {}:\n...{}...",
                    location, snippet
                ),
                outcome: AlertQueryOutcome::Found { snippet },
            },
            AlertQueryOutcome::NotFound => AlertReport {
                outcome: AlertQueryOutcome::NotFound,
                text: format!(
                    "No official alert found for {} in the latest AEMET bulletin.",
                    location
                ),
            },
            AlertQueryOutcome::SourceUnavailable { .. } => {
                let query = format!("{} weather alerts warnings today", location);
                let results = self.search.search(&query).await;
                AlertReport {
                    outcome: AlertQueryOutcome::SourceUnavailable {
                        fallback_used: true,
                    },
                    text: format!(
                        "The official alert source was not available. Web search advisory \
                         (lower confidence, verify with official sources):\n{}",
                        results
                    ),
                }
            }
        }
    }
}

#[async_trait]
impl Tool for AlertsTool {
    fn name(&self) -> &str {
        "check_weather_alerts"
    }

    fn description(&self) -> &str {
        "Useful to check for official adverse weather alerts or warnings (storms, heat, wind, \
         rain) for a place in Spain. Input: the place name."
    }

    async fn invoke(&self, input: &str) -> String {
        self.check_alerts(input).await.text
    }
}

/// Case-insensitive search for `needle`; returns about `window` characters
/// of surrounding text with whitespace collapsed.
pub fn find_snippet(text: &str, needle: &str, window: usize) -> Option<String> {
    let needle: Vec<char> = needle.chars().collect();
    if needle.is_empty() {
        return None;
    }
    let hay: Vec<char> = text.chars().collect();
    if hay.len() < needle.len() {
        return None;
    }

    let start = (0..=hay.len() - needle.len()).find(|&i| {
        needle
            .iter()
            .zip(&hay[i..])
            .all(|(n, h)| n.to_lowercase().eq(h.to_lowercase()))
    })?;

    let from = start.saturating_sub(window / 2);
    let to = (from + window.max(needle.len())).min(hay.len());
    let raw: String = hay[from..to].iter().collect();
    Some(raw.split_whitespace().collect::<Vec<_>>().join(" "))
}
