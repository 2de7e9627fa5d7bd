//! Fetch executor: performs one outbound HTTP request and summarizes the result
//!
//! The executor has no knowledge of task identifiers or storage. It is a pure
//! request/response transform behind the [`Fetcher`] trait so the worker pool
//! can be tested against stubs.

use crate::config::FetchConfig;
use crate::error::FetchError;
use crate::types::{FetchOutcome, FetchRequest};
use async_trait::async_trait;
use std::collections::HashMap;

/// Executes a fully-specified outbound request
#[async_trait]
pub trait Fetcher: Send + Sync + 'static {
    /// Perform the request and summarize the response
    ///
    /// No retries; any failure (malformed inputs, connection failure,
    /// timeout) is returned as a [`FetchError`].
    async fn execute(&self, request: &FetchRequest) -> Result<FetchOutcome, FetchError>;
}

/// Production [`Fetcher`] on reqwest with a fixed request timeout
pub struct HttpFetcher {
    client: reqwest::Client,
    timeout_secs: u64,
}

impl HttpFetcher {
    /// Build a fetcher from configuration
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self {
            client,
            timeout_secs: config.timeout_secs,
        })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn execute(&self, request: &FetchRequest) -> Result<FetchOutcome, FetchError> {
        let method = reqwest::Method::from_bytes(request.method.as_bytes())
            .map_err(|_| FetchError::InvalidMethod(request.method.clone()))?;

        let url = url::Url::parse(&request.address).map_err(|e| FetchError::InvalidAddress {
            address: request.address.clone(),
            reason: e.to_string(),
        })?;

        let mut builder = self.client.request(method, url);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::TimedOut {
                    seconds: self.timeout_secs,
                }
            } else {
                FetchError::Request(e)
            }
        })?;

        let status = response.status();
        let http_status = match status.canonical_reason() {
            Some(reason) => format!("{} {}", status.as_u16(), reason),
            None => status.as_u16().to_string(),
        };

        let mut headers: HashMap<String, Vec<String>> = HashMap::new();
        for (name, value) in response.headers() {
            headers
                .entry(name.to_string())
                .or_default()
                .push(String::from_utf8_lossy(value.as_bytes()).into_owned());
        }

        let content_length = response.content_length().map(|n| n as i64);

        Ok(FetchOutcome {
            http_status,
            headers,
            content_length,
        })
    }
}
