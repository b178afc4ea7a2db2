// SPDX-License-Identifier: MIT

//! HTTP collaborator shared by every data fetcher
//!
//! Fetch chains talk to the network through the [`HttpFetcher`] trait so
//! their fallback policy can be exercised against scripted responses. A
//! non-2xx status is not an error at this layer; callers decide what a
//! status means for their chain.

use crate::adk::error::{FetchError, MeteoError};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

const USER_AGENT: &str = "Mozilla/5.0 (compatible; meteo-agent/0.1)";

/// A GET request with query parameters, headers and its own timeout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub timeout: Duration,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            query: Vec::new(),
            headers: Vec::new(),
            timeout,
        }
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    /// Full URL with the encoded query string
    pub fn full_url(&self) -> Result<url::Url, FetchError> {
        let mut url = url::Url::parse(&self.url)
            .map_err(|e| FetchError::transport(&self.url, e.to_string()))?;
        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(self.query.iter());
        }
        Ok(url)
    }

    /// Value of a query parameter, if set
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait HttpFetcher: Send + Sync {
    async fn fetch(&self, request: HttpRequest) -> Result<HttpResponse, FetchError>;
}

/// Production fetcher backed by reqwest
pub struct ReqwestFetcher {
    client: Client,
}

impl ReqwestFetcher {
    pub fn new() -> Result<Self, MeteoError> {
        Ok(Self {
            client: Client::builder().user_agent(USER_AGENT).build()?,
        })
    }
}

#[async_trait]
impl HttpFetcher for ReqwestFetcher {
    async fn fetch(&self, request: HttpRequest) -> Result<HttpResponse, FetchError> {
        let url = request.full_url()?;
        let url_str = url.to_string();
        log::debug!("GET {} (timeout {:?})", request.url, request.timeout);

        let mut builder = self.client.get(url).timeout(request.timeout);
        for (key, value) in &request.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }

        let map_err = |e: reqwest::Error| {
            if e.is_timeout() {
                FetchError::Timeout {
                    url: request.url.clone(),
                }
            } else {
                FetchError::transport(&request.url, e.to_string())
            }
        };

        let resp = builder.send().await.map_err(map_err)?;
        let status = resp.status().as_u16();
        // Bulletins are not always UTF-8; decode lossily
        let bytes = resp.bytes().await.map_err(map_err)?;
        let body = String::from_utf8_lossy(&bytes).into_owned();

        log::debug!("GET {} -> {} ({} bytes)", url_str, status, bytes.len());
        Ok(HttpResponse { status, body })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Answers by URL prefix (first match wins) and records every request
    pub struct ScriptedFetcher {
        routes: Vec<(String, Result<HttpResponse, FetchError>)>,
        calls: Mutex<Vec<HttpRequest>>,
    }

    impl ScriptedFetcher {
        pub fn new(routes: Vec<(&str, Result<HttpResponse, FetchError>)>) -> Self {
            Self {
                routes: routes
                    .into_iter()
                    .map(|(u, r)| (u.to_string(), r))
                    .collect(),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn calls(&self) -> Vec<HttpRequest> {
            self.calls.lock().unwrap().clone()
        }

        pub fn urls(&self) -> Vec<String> {
            self.calls().into_iter().map(|r| r.url).collect()
        }
    }

    #[async_trait]
    impl HttpFetcher for ScriptedFetcher {
        async fn fetch(&self, request: HttpRequest) -> Result<HttpResponse, FetchError> {
            self.calls.lock().unwrap().push(request.clone());
            self.routes
                .iter()
                .find(|(prefix, _)| request.url.starts_with(prefix.as_str()))
                .map(|(_, r)| r.clone())
                .unwrap_or_else(|| Ok(HttpResponse::new(404, "")))
        }
    }

    pub fn ok_json(v: serde_json::Value) -> Result<HttpResponse, FetchError> {
        Ok(HttpResponse::new(200, v.to_string()))
    }
}
