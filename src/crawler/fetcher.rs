//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the pooled HTTP client shared by a round of tasks
//! - Issuing exactly one GET per attempt
//! - Classifying the outcome as success, bad status, or transport failure

use crate::config::WorkerConfig;
use reqwest::{header::CONTENT_TYPE, Client, Response, StatusCode};
use std::time::Duration;

/// How long an idle pooled connection is kept
const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(30);

/// Upper bound on connection establishment
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Result of a fetch operation
#[derive(Debug)]
pub enum FetchOutcome {
    /// HTTP 200; the body has not been read yet
    Success(Response),

    /// Any other HTTP status
    Status(u16),

    /// DNS, connection, TLS, or timeout failure
    Transport(String),
}

/// Builds the HTTP client used by task processors
///
/// The per-request timeout bounds how long one hung fetch can stall the
/// round barrier.
///
/// # Example
///
/// ```no_run
/// use crawlbox::config::WorkerConfig;
/// use crawlbox::crawler::build_http_client;
///
/// let client = build_http_client(&WorkerConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &WorkerConfig) -> Result<Client, reqwest::Error> {
    let timeout = Duration::from_secs(config.request_timeout_secs);

    Client::builder()
        .user_agent(concat!("crawlbox/", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .connect_timeout(CONNECT_TIMEOUT.min(timeout))
        .pool_max_idle_per_host(config.max_idle_connections)
        .pool_idle_timeout(POOL_IDLE_TIMEOUT)
        .build()
}

/// Issues a single GET for `url`
///
/// # Outcome Classification
///
/// | Condition | Outcome |
/// |-----------|---------|
/// | HTTP 200 | `Success` |
/// | Any other status | `Status` |
/// | Timeout | `Transport` |
/// | Connection refused / DNS / TLS | `Transport` |
pub async fn fetch(client: &Client, url: &str) -> FetchOutcome {
    match client.get(url).send().await {
        Ok(response) if response.status() == StatusCode::OK => FetchOutcome::Success(response),
        Ok(response) => FetchOutcome::Status(response.status().as_u16()),
        Err(e) => FetchOutcome::Transport(describe_transport_error(&e)),
    }
}

/// Returns the response's declared `Content-Type`, or an empty string
pub fn content_type(response: &Response) -> String {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string()
}

pub(crate) fn describe_transport_error(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        format!("Request timeout: {}", error)
    } else if error.is_connect() {
        format!("Connection failed: {}", error)
    } else {
        error.to_string()
    }
}
