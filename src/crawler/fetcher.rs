//! HTTP fetcher
//!
//! Wraps a shared reqwest client. Every request carries a user agent picked
//! from the configured rotation, and only HTML bodies are returned.

use crate::config::{CrawlerConfig, UserAgentConfig};
use reqwest::{header, redirect::Policy, Client};
use std::time::{Duration, SystemTime};

/// Browser user agents used when the configuration lists none
pub const DEFAULT_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:133.0) Gecko/20100101 Firefox/133.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:133.0) Gecko/20100101 Firefox/133.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/18.1 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36 Edg/131.0.0.0",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:133.0) Gecko/20100101 Firefox/133.0",
];

/// Result of a fetch operation
#[derive(Debug)]
pub enum FetchResult {
    /// Successfully fetched an HTML page
    Success {
        /// Final URL after redirects
        final_url: String,
        status_code: u16,
        body: String,
    },

    /// Response was not HTML
    ContentMismatch {
        /// The Content-Type received
        content_type: String,
    },

    /// Non-2xx response
    HttpError { status_code: u16 },

    /// Connection failure, timeout or unreadable body
    NetworkError { error: String },
}

/// Builds the shared HTTP client
pub fn build_http_client(config: &CrawlerConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(5))
        .gzip(true)
        .brotli(true)
        .build()
}

/// HTTP fetcher with user agent rotation
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    agents: Vec<String>,
}

impl Fetcher {
    pub fn new(crawler: &CrawlerConfig, user_agent: &UserAgentConfig) -> Result<Self, reqwest::Error> {
        let agents = if user_agent.agents.is_empty() {
            DEFAULT_USER_AGENTS.iter().map(|s| s.to_string()).collect()
        } else {
            user_agent.agents.clone()
        };

        Ok(Self {
            client: build_http_client(crawler)?,
            agents,
        })
    }

    /// Picks a user agent for the next request
    pub fn user_agent(&self) -> &str {
        let nanos = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_nanos() as usize)
            .unwrap_or(0);
        &self.agents[nanos % self.agents.len()]
    }

    /// Fetches a URL
    ///
    /// Non-2xx responses, network failures and non-HTML bodies are reported
    /// as distinct variants; none of them is an error for the caller.
    pub async fn fetch(&self, url: &str) -> FetchResult {
        let response = match self
            .client
            .get(url)
            .header(header::USER_AGENT, self.user_agent())
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                let error = if e.is_timeout() {
                    "Request timeout".to_string()
                } else if e.is_connect() {
                    "Connection refused".to_string()
                } else {
                    e.to_string()
                };
                return FetchResult::NetworkError { error };
            }
        };

        let status = response.status();
        let final_url = response.url().to_string();

        if !status.is_success() {
            return FetchResult::HttpError {
                status_code: status.as_u16(),
            };
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        if !is_html_content_type(&content_type) {
            return FetchResult::ContentMismatch { content_type };
        }

        match response.text().await {
            Ok(body) => FetchResult::Success {
                final_url,
                status_code: status.as_u16(),
                body,
            },
            Err(e) => FetchResult::NetworkError {
                error: e.to_string(),
            },
        }
    }
}

/// Returns true for HTML content types; a missing header counts as HTML
fn is_html_content_type(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    mime.is_empty() || mime == "text/html" || mime == "application/xhtml+xml"
}
