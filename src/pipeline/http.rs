//! Shared HTTP plumbing: one client per run, single-attempt GETs.
//!
//! No retry or backoff happens here. A failed request is reported to the
//! caller exactly once and the per-page policy decides what happens next.

use reqwest::{Client, Url};
use std::time::Duration;
use tracing::debug;

/// User-Agent sent with every request.
const USER_AGENT: &str = concat!("epaper2pdf/", env!("CARGO_PKG_VERSION"));

/// Why a GET failed, before it is attached to a page or run-level error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HttpFailure {
    Timeout { secs: u64 },
    Status(u16),
    Transport(String),
}

impl std::fmt::Display for HttpFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HttpFailure::Timeout { secs } => write!(f, "timed out after {secs}s"),
            HttpFailure::Status(code) => write!(f, "HTTP {code}"),
            HttpFailure::Transport(e) => f.write_str(e),
        }
    }
}

/// Build the client used for every request of a run.
pub fn build_client(timeout_secs: u64) -> Result<Client, String> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| e.to_string())
}

/// GET a URL and return the body as text.
pub async fn get_text(client: &Client, url: &str, timeout_secs: u64) -> Result<String, HttpFailure> {
    let response = send(client, url, timeout_secs).await?;
    response
        .text()
        .await
        .map_err(|e| classify(e, timeout_secs))
}

/// GET a URL and return the raw body bytes.
pub async fn get_bytes(
    client: &Client,
    url: &str,
    timeout_secs: u64,
) -> Result<Vec<u8>, HttpFailure> {
    let response = send(client, url, timeout_secs).await?;
    let bytes = response
        .bytes()
        .await
        .map_err(|e| classify(e, timeout_secs))?;
    debug!("GET {} → {} bytes", url, bytes.len());
    Ok(bytes.to_vec())
}

async fn send(
    client: &Client,
    url: &str,
    timeout_secs: u64,
) -> Result<reqwest::Response, HttpFailure> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| classify(e, timeout_secs))?;

    if !response.status().is_success() {
        return Err(HttpFailure::Status(response.status().as_u16()));
    }
    Ok(response)
}

fn classify(e: reqwest::Error, timeout_secs: u64) -> HttpFailure {
    if e.is_timeout() {
        HttpFailure::Timeout { secs: timeout_secs }
    } else {
        HttpFailure::Transport(e.to_string())
    }
}

/// Resolve a possibly relative `href`/`src` against the page it came from.
pub fn resolve(base: &str, reference: &str) -> Option<String> {
    let reference = reference.trim();
    if reference.is_empty() {
        return None;
    }
    if let Ok(absolute) = Url::parse(reference) {
        return Some(absolute.to_string());
    }
    Url::parse(base)
        .ok()?
        .join(reference)
        .ok()
        .map(|u| u.to_string())
}
