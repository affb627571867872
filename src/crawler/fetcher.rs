//! Page fetcher seam
//!
//! The crawl engine only sees [`PageFetcher`]; the static HTTP client and the
//! headless browser are interchangeable implementations behind it.

use std::fmt;
use std::future::Future;
use url::Url;

/// Result of a single fetch attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The page was fetched
    Success {
        /// Final URL after redirects
        final_url: String,
        /// Raw response body, or the serialized DOM for rendered fetches
        html: String,
    },

    /// The server answered with a non-2xx status
    HttpError {
        /// The HTTP status code
        status: u16,
    },

    /// Connection, DNS, TLS or protocol failure
    NetworkError {
        /// Error description
        error: String,
    },

    /// The fetch did not finish within the configured timeout
    Timeout,

    /// The response was not an HTML document
    NotHtml {
        /// The Content-Type that was received
        content_type: String,
    },
}

impl FetchOutcome {
    /// Returns true for [`FetchOutcome::Success`]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

impl fmt::Display for FetchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success { final_url, .. } => write!(f, "fetched {}", final_url),
            Self::HttpError { status } => write!(f, "HTTP {}", status),
            Self::NetworkError { error } => write!(f, "network error: {}", error),
            Self::Timeout => write!(f, "timed out"),
            Self::NotHtml { content_type } => write!(f, "not HTML ({})", content_type),
        }
    }
}

/// Turns a URL into page content
///
/// Implementations bound every call by their own timeout and never fail the
/// crawl: every problem is expressed as a [`FetchOutcome`] variant.
pub trait PageFetcher {
    /// Fetches one page
    fn fetch(&self, url: &Url) -> impl Future<Output = FetchOutcome> + Send;

    /// Releases any resources held by the fetcher. Called once at finalization.
    fn shutdown(&mut self) -> impl Future<Output = ()> + Send {
        async {}
    }

    /// Short name used in log lines
    fn name(&self) -> &'static str;
}
