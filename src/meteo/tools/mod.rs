// SPDX-License-Identifier: MIT

//! The agent's toolset: time, weather, alerts and web search

pub mod alerts;
pub mod search;
pub mod time;
pub mod weather;

use crate::adk::error::MeteoError;
use crate::adk::registry::ToolRegistry;
use crate::meteo::config::SessionConfig;
use crate::meteo::http::HttpFetcher;
use search::{BraveSearchBackend, DuckDuckGoBackend, DuckDuckGoFlavor, SearchBackend, SearchChain};
use std::sync::Arc;

pub use alerts::AlertsTool;
pub use time::CurrentTimeTool;
pub use weather::WeatherTool;

/// Search backends in the order they are tried. Brave only joins the chain
/// when a token is configured.
pub fn build_search_chain(config: &SessionConfig, fetcher: Arc<dyn HttpFetcher>) -> SearchChain {
    let timeout = config.http_timeout();
    let mut backends: Vec<Arc<dyn SearchBackend>> = Vec::new();

    if let Some(key) = config.brave_api_key.as_deref().filter(|k| !k.trim().is_empty()) {
        backends.push(Arc::new(BraveSearchBackend::new(fetcher.clone(), key, timeout)));
    }
    backends.push(Arc::new(DuckDuckGoBackend::new(
        fetcher.clone(),
        DuckDuckGoFlavor::Html,
        timeout,
    )));
    backends.push(Arc::new(DuckDuckGoBackend::new(
        fetcher,
        DuckDuckGoFlavor::Lite,
        timeout,
    )));

    SearchChain::new(backends, config.search_max_results)
}

/// Build the registry the weather agent runs with
pub fn build_registry(
    config: &SessionConfig,
    fetcher: Arc<dyn HttpFetcher>,
) -> Result<ToolRegistry, MeteoError> {
    let search = Arc::new(build_search_chain(config, fetcher.clone()));
    let mut registry = ToolRegistry::new();

    registry.register(Arc::new(CurrentTimeTool::new()))?;
    registry.register(Arc::new(WeatherTool::new(
        fetcher.clone(),
        config.language.clone(),
        config.http_timeout(),
    )))?;
    registry.register(Arc::new(AlertsTool::new(
        fetcher,
        config.aemet_api_key.clone(),
        search.clone(),
        config.http_timeout(),
        config.bulletin_timeout(),
        config.alert_snippet_chars,
    )))?;
    registry.register(search)?;

    log::debug!("Registered tools: {:?}", registry.names());
    Ok(registry)
}
