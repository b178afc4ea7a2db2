// SPDX-License-Identifier: MIT

//! Web search over an ordered list of interchangeable backends
//!
//! Backends are tried in order. A backend that errors or finds nothing just
//! hands over to the next one; the first non-empty result list wins.

use crate::adk::error::FetchError;
use crate::adk::tool::Tool;
use crate::meteo::http::{HttpFetcher, HttpRequest};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Returned when every backend came back empty
pub const NO_RESULTS: &str = "No results found.";

pub const BRAVE_SEARCH_URL: &str = "https://api.search.brave.com/res/v1/web/search";
pub const DDG_HTML_URL: &str = "https://html.duckduckgo.com/html/";
pub const DDG_LITE_URL: &str = "https://lite.duckduckgo.com/lite/";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default, alias = "description")]
    pub snippet: String,
}

impl SearchResult {
    fn is_empty(&self) -> bool {
        self.title.trim().is_empty() && self.snippet.trim().is_empty()
    }
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("search backend answered with HTTP {0}")]
    Status(u16),
    #[error("unexpected search response: {0}")]
    Parse(String),
}

#[async_trait]
pub trait SearchBackend: Send + Sync {
    fn name(&self) -> &str;

    async fn search(&self, query: &str, max_results: usize)
        -> Result<Vec<SearchResult>, SearchError>;
}

/// Brave Search API, only usable with a subscription token
pub struct BraveSearchBackend {
    fetcher: Arc<dyn HttpFetcher>,
    api_key: String,
    timeout: Duration,
}

impl BraveSearchBackend {
    pub fn new(fetcher: Arc<dyn HttpFetcher>, api_key: impl Into<String>, timeout: Duration) -> Self {
        Self {
            fetcher,
            api_key: api_key.into(),
            timeout,
        }
    }
}

#[async_trait]
impl SearchBackend for BraveSearchBackend {
    fn name(&self) -> &str {
        "brave"
    }

    async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<SearchResult>, SearchError> {
        let count = max_results.clamp(1, 20);
        let request = HttpRequest::get(BRAVE_SEARCH_URL, self.timeout)
            .query("q", query)
            .query("count", count.to_string())
            .header("Accept", "application/json")
            .header("X-Subscription-Token", &self.api_key);

        let resp = self.fetcher.fetch(request).await?;
        if !resp.is_success() {
            return Err(SearchError::Status(resp.status));
        }

        let body: Value =
            serde_json::from_str(&resp.body).map_err(|e| SearchError::Parse(e.to_string()))?;
        let results_json = body
            .get("web")
            .and_then(|w| w.get("results"))
            .cloned()
            .unwrap_or(Value::Array(Vec::new()));

        let results: Vec<SearchResult> =
            serde_json::from_value(results_json).map_err(|e| SearchError::Parse(e.to_string()))?;
        Ok(results
            .into_iter()
            .filter(|r| !r.is_empty())
            .take(max_results)
            .collect())
    }
}

/// Which DuckDuckGo page to scrape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuckDuckGoFlavor {
    Html,
    Lite,
}

/// DuckDuckGo without an API key, scraping the HTML or Lite page
pub struct DuckDuckGoBackend {
    fetcher: Arc<dyn HttpFetcher>,
    flavor: DuckDuckGoFlavor,
    timeout: Duration,
}

impl DuckDuckGoBackend {
    pub fn new(fetcher: Arc<dyn HttpFetcher>, flavor: DuckDuckGoFlavor, timeout: Duration) -> Self {
        Self {
            fetcher,
            flavor,
            timeout,
        }
    }
}

#[async_trait]
impl SearchBackend for DuckDuckGoBackend {
    fn name(&self) -> &str {
        match self.flavor {
            DuckDuckGoFlavor::Html => "duckduckgo-html",
            DuckDuckGoFlavor::Lite => "duckduckgo-lite",
        }
    }

    async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<SearchResult>, SearchError> {
        let url = match self.flavor {
            DuckDuckGoFlavor::Html => DDG_HTML_URL,
            DuckDuckGoFlavor::Lite => DDG_LITE_URL,
        };
        let request = HttpRequest::get(url, self.timeout).query("q", query);

        let resp = self.fetcher.fetch(request).await?;
        if !resp.is_success() {
            return Err(SearchError::Status(resp.status));
        }

        let mut results = match self.flavor {
            DuckDuckGoFlavor::Html => extract_html_results(&resp.body),
            DuckDuckGoFlavor::Lite => extract_lite_results(&resp.body),
        };
        results.truncate(max_results);
        Ok(results)
    }
}

/// Text of the element opened by the first tag containing `marker`, up to
/// `close`, with nested tags stripped.
fn element_text(chunk: &str, marker: &str, close: &str) -> Option<String> {
    let after_marker = &chunk[chunk.find(marker)? + marker.len()..];
    let content = &after_marker[after_marker.find('>')? + 1..];
    let end = content.find(close).unwrap_or(content.len());
    Some(html_decode(&strip_tags(&content[..end])).trim().to_string())
}

fn extract_html_results(html: &str) -> Vec<SearchResult> {
    html.split("result__body\"")
        .skip(1)
        .filter_map(|chunk| {
            let title = element_text(chunk, "class=\"result__a\"", "</a>")?;
            let snippet =
                element_text(chunk, "class=\"result__snippet\"", "</a>").unwrap_or_default();
            let url = element_text(chunk, "class=\"result__url\"", "</a>").unwrap_or_default();
            Some(SearchResult {
                title,
                url,
                snippet,
            })
        })
        .filter(|r| !r.is_empty())
        .collect()
}

fn extract_lite_results(html: &str) -> Vec<SearchResult> {
    html.split("<a rel=\"nofollow\" href=\"")
        .skip(1)
        .filter(|chunk| chunk.contains("result-link"))
        .filter_map(|chunk| {
            let url = chunk.split('"').next()?.to_string();
            let title = element_text(chunk, "result-link", "</a>")?;
            let snippet = element_text(chunk, "result-snippet", "</td>").unwrap_or_default();
            Some(SearchResult {
                title,
                url: html_decode(&url),
                snippet,
            })
        })
        .filter(|r| !r.is_empty())
        .collect()
}

fn strip_tags(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_tag = false;
    for c in s.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

/// Basic HTML entity decoding.
fn html_decode(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

/// Ordered fallback over search backends, exposed as the `web_search` tool
pub struct SearchChain {
    backends: Vec<Arc<dyn SearchBackend>>,
    max_results: usize,
}

impl SearchChain {
    pub fn new(backends: Vec<Arc<dyn SearchBackend>>, max_results: usize) -> Self {
        Self {
            backends,
            max_results,
        }
    }

    pub fn backend_names(&self) -> Vec<&str> {
        self.backends.iter().map(|b| b.name()).collect()
    }

    /// Results of the first backend with anything to show
    pub async fn first_results(&self, query: &str) -> Option<(String, Vec<SearchResult>)> {
        for backend in &self.backends {
            match backend.search(query, self.max_results).await {
                Ok(results) => {
                    let results: Vec<SearchResult> =
                        results.into_iter().filter(|r| !r.is_empty()).collect();
                    if results.is_empty() {
                        log::info!("Search backend {} found nothing for '{}'", backend.name(), query);
                        continue;
                    }
                    log::info!(
                        "Search backend {} returned {} results",
                        backend.name(),
                        results.len()
                    );
                    return Some((backend.name().to_string(), results));
                }
                Err(e) => {
                    log::warn!("Search backend {} failed: {}", backend.name(), e);
                }
            }
        }
        None
    }

    /// Formatted results, or [`NO_RESULTS`] once every backend is exhausted
    pub async fn search(&self, query: &str) -> String {
        let query = query.trim();
        if query.is_empty() {
            return NO_RESULTS.to_string();
        }
        match self.first_results(query).await {
            Some((_, results)) => format_results(&results),
            None => NO_RESULTS.to_string(),
        }
    }
}

pub fn format_results(results: &[SearchResult]) -> String {
    results
        .iter()
        .enumerate()
        .map(|(i, r)| format!("{}. {}\n{}\nURL: {}", i + 1, r.title, r.snippet, r.url))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[async_trait]
impl Tool for SearchChain {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Searches the web for current information that the other tools do not cover. \
         Input: a search query."
    }

    async fn invoke(&self, input: &str) -> String {
        self.search(input).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meteo::http::testing::{ok_json, ScriptedFetcher};
    use crate::meteo::http::HttpResponse;
    use serde_json::json;
    use std::sync::Mutex;

    /// Backend with canned output that logs when it was asked
    struct StubBackend {
        name: String,
        outcome: Result<Vec<SearchResult>, String>,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl StubBackend {
        fn new(
            name: &str,
            outcome: Result<Vec<SearchResult>, String>,
            log: &Arc<Mutex<Vec<String>>>,
        ) -> Arc<dyn SearchBackend> {
            Arc::new(Self {
                name: name.to_string(),
                outcome,
                log: log.clone(),
            })
        }
    }

    #[async_trait]
    impl SearchBackend for StubBackend {
        fn name(&self) -> &str {
            &self.name
        }

        async fn search(
            &self,
            _query: &str,
            _max_results: usize,
        ) -> Result<Vec<SearchResult>, SearchError> {
            self.log.lock().unwrap().push(self.name.clone());
            self.outcome.clone().map_err(SearchError::Parse)
        }
    }

    fn result(title: &str) -> SearchResult {
        SearchResult {
            title: title.to_string(),
            url: format!("https://example.com/{}", title),
            snippet: format!("about {}", title),
        }
    }

    #[tokio::test]
    async fn test_empty_backend_falls_through_in_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let chain = SearchChain::new(
            vec![
                StubBackend::new("a", Ok(vec![]), &log),
                StubBackend::new("b", Ok(vec![result("storm")]), &log),
                StubBackend::new("c", Ok(vec![result("never")]), &log),
            ],
            5,
        );

        let out = chain.search("storm").await;
        assert_eq!(out, format_results(&[result("storm")]));
        assert_eq!(*log.lock().unwrap(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_order_follows_configuration() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let chain = SearchChain::new(
            vec![
                StubBackend::new("b", Ok(vec![result("from-b")]), &log),
                StubBackend::new("a", Ok(vec![]), &log),
            ],
            5,
        );

        let (name, results) = chain.first_results("q").await.unwrap();
        assert_eq!(name, "b");
        assert_eq!(results, vec![result("from-b")]);
        assert_eq!(*log.lock().unwrap(), vec!["b"]);
    }

    #[tokio::test]
    async fn test_failure_is_isolated() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let chain = SearchChain::new(
            vec![
                StubBackend::new("broken", Err("boom".to_string()), &log),
                StubBackend::new("ok", Ok(vec![result("x")]), &log),
            ],
            5,
        );
        assert!(chain.search("q").await.contains("1. x"));
    }

    #[tokio::test]
    async fn test_blank_results_do_not_count() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let blank = SearchResult {
            title: " ".to_string(),
            url: "https://example.com".to_string(),
            snippet: String::new(),
        };
        let chain = SearchChain::new(
            vec![
                StubBackend::new("a", Ok(vec![blank]), &log),
                StubBackend::new("b", Err("down".to_string()), &log),
            ],
            5,
        );
        assert_eq!(chain.search("q").await, NO_RESULTS);
        assert_eq!(*log.lock().unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn test_extract_html_results() {
        let html = r#"
<div class="result results_links"><div class="links_main links_deep result__body">
<h2 class="result__title"><a rel="nofollow" class="result__a" href="//duckduckgo.com/l/?uddg=x">Aviso <b>amarillo</b> en Valencia</a></h2>
<div class="result__extras"><a class="result__url" href="//duckduckgo.com/l/?uddg=x"> www.aemet.es/avisos </a></div>
<a class="result__snippet" href="//duckduckgo.com/l/?uddg=x">Lluvias &amp; tormentas <b>hoy</b></a>
</div></div>
<div class="result results_links"><div class="links_main links_deep result__body">
<h2 class="result__title"><a rel="nofollow" class="result__a" href="//duckduckgo.com/l/?uddg=y">Second</a></h2>
</div></div>"#;
        let results = extract_html_results(html);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].title, "Aviso amarillo en Valencia");
        assert_eq!(results[0].url, "www.aemet.es/avisos");
        assert_eq!(results[0].snippet, "Lluvias & tormentas hoy");
        assert_eq!(results[1].title, "Second");
        assert_eq!(results[1].snippet, "");
    }

    #[test]
    fn test_extract_lite_results() {
        let html = r#"<table>
<tr><td>1.&nbsp;</td><td><a rel="nofollow" href="https://www.aemet.es/es/eltiempo/prediccion/avisos" class='result-link'>Avisos - <b>AEMET</b></a></td></tr>
<tr><td>&nbsp;</td><td class='result-snippet'>Avisos meteorol&#39;gicos para <b>Valencia</b></td></tr>
</table>"#;
        let results = extract_lite_results(html);
        assert_eq!(
            results,
            vec![SearchResult {
                title: "Avisos - AEMET".to_string(),
                url: "https://www.aemet.es/es/eltiempo/prediccion/avisos".to_string(),
                snippet: "Avisos meteorol'gicos para Valencia".to_string(),
            }]
        );
    }

    #[test]
    fn test_extract_from_page_without_results() {
        assert!(extract_html_results("<html><body>No results.</body></html>").is_empty());
        assert!(extract_lite_results("<html></html>").is_empty());
    }

    #[tokio::test]
    async fn test_brave_backend_parses_results() {
        let fetcher = Arc::new(ScriptedFetcher::new(vec![(
            BRAVE_SEARCH_URL,
            ok_json(json!({
                "web": { "results": [
                    { "title": "Rust", "url": "https://rust-lang.org", "description": "A language" }
                ]}
            })),
        )]));
        let backend = BraveSearchBackend::new(fetcher.clone(), "token", Duration::from_secs(5));

        let results = backend.search("rust", 3).await.unwrap();
        assert_eq!(results[0].snippet, "A language");

        let call = &fetcher.calls()[0];
        assert_eq!(call.query_value("count"), Some("3"));
        assert!(call
            .headers
            .contains(&("X-Subscription-Token".to_string(), "token".to_string())));
    }

    #[tokio::test]
    async fn test_brave_backend_tolerates_partial_results() {
        let fetcher = Arc::new(ScriptedFetcher::new(vec![(
            BRAVE_SEARCH_URL,
            ok_json(json!({
                "web": { "results": [
                    { "title": "AEMET avisos", "url": "https://www.aemet.es/es/eltiempo/prediccion/avisos" },
                    { "title": "Valencia en alerta naranja", "description": "Lluvias fuertes" },
                    { "url": "https://example.com/empty" }
                ]}
            })),
        )]));
        let backend = BraveSearchBackend::new(fetcher, "token", Duration::from_secs(5));

        let results = backend.search("valencia avisos", 5).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].snippet, "");
        assert_eq!(results[1].url, "");
        assert_eq!(results[1].snippet, "Lluvias fuertes");
    }

    #[tokio::test]
    async fn test_duckduckgo_empty_page() {
        let fetcher = Arc::new(ScriptedFetcher::new(vec![(
            DDG_LITE_URL,
            Ok(HttpResponse::new(202, "")),
        )]));
        let backend = DuckDuckGoBackend::new(fetcher, DuckDuckGoFlavor::Lite, Duration::from_secs(5));
        assert!(backend.search("q", 5).await.unwrap().is_empty());
        assert_eq!(backend.name(), "duckduckgo-lite");
    }

    #[tokio::test]
    async fn test_duckduckgo_rate_limited() {
        let fetcher = Arc::new(ScriptedFetcher::new(vec![(
            DDG_HTML_URL,
            Ok(HttpResponse::new(429, "")),
        )]));
        let backend = DuckDuckGoBackend::new(fetcher, DuckDuckGoFlavor::Html, Duration::from_secs(5));
        assert!(matches!(
            backend.search("q", 5).await,
            Err(SearchError::Status(429))
        ));
    }
}
