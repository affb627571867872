//! Static HTTP fetcher
//!
//! Performs one GET per page, follows redirects and returns the raw body.
//! Error classification:
//!
//! | Condition | Outcome |
//! |-----------|---------|
//! | 2xx with HTML (or missing) Content-Type | Success |
//! | 2xx with any other Content-Type | NotHtml |
//! | Non-2xx status | HttpError |
//! | Timeout (connect or read) | Timeout |
//! | Connection refused, DNS, TLS, redirect limit | NetworkError |

use crate::config::{CrawlerConfig, UserAgentConfig};
use crate::crawler::fetcher::{FetchOutcome, PageFetcher};
use crate::CrawlError;
use reqwest::{header::CONTENT_TYPE, redirect::Policy, Client};
use std::time::Duration;
use url::Url;

/// Page fetcher backed by a plain HTTP client
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Wraps an already configured client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds a fetcher from the crawler and user agent configuration
    ///
    /// # Errors
    ///
    /// Returns [`CrawlError::Http`] if the client cannot be built, for
    /// example when the user agent is not a valid header value.
    pub fn from_config(
        crawler: &CrawlerConfig,
        user_agent: &UserAgentConfig,
    ) -> Result<Self, CrawlError> {
        let client = build_http_client(user_agent, crawler.timeout(), crawler.max_redirects)?;
        Ok(Self::new(client))
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `user_agent` - The User-Agent header to send
/// * `timeout` - Upper bound for a whole request, body included
/// * `max_redirects` - Redirect hops to follow before giving up
///
/// # Example
///
/// ```no_run
/// use meta_crawl::config::UserAgentConfig;
/// use meta_crawl::crawler::build_http_client;
/// use std::time::Duration;
///
/// let client = build_http_client(&UserAgentConfig::default(), Duration::from_secs(10), 10).unwrap();
/// ```
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    timeout: Duration,
    max_redirects: usize,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.value.as_str())
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .redirect(Policy::limited(max_redirects))
        .gzip(true)
        .brotli(true)
        .build()
}

impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> FetchOutcome {
        fetch_url(&self.client, url).await
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

/// Fetches a URL and classifies the result
pub async fn fetch_url(client: &Client, url: &Url) -> FetchOutcome {
    let response = match client.get(url.clone()).send().await {
        Ok(response) => response,
        Err(e) => return classify_error(&e),
    };

    let status = response.status();
    if !status.is_success() {
        return FetchOutcome::HttpError {
            status: status.as_u16(),
        };
    }

    let final_url = response.url().to_string();

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    if !is_html_content_type(&content_type) {
        return FetchOutcome::NotHtml { content_type };
    }

    match response.text().await {
        Ok(html) => FetchOutcome::Success { final_url, html },
        Err(e) => classify_error(&e),
    }
}

/// Maps a client error onto the outcome taxonomy
fn classify_error(e: &reqwest::Error) -> FetchOutcome {
    if e.is_timeout() {
        FetchOutcome::Timeout
    } else if e.is_connect() {
        FetchOutcome::NetworkError {
            error: format!("Connection failed: {}", e),
        }
    } else if e.is_redirect() {
        FetchOutcome::NetworkError {
            error: format!("Redirect error: {}", e),
        }
    } else {
        FetchOutcome::NetworkError {
            error: e.to_string(),
        }
    }
}

/// Missing Content-Type is given the benefit of the doubt
fn is_html_content_type(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    mime.is_empty() || mime == "text/html" || mime == "application/xhtml+xml"
}
