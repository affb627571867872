//! Crawler module for page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - The fetcher seam with static HTTP and headless browser implementations
//! - HTML metadata and link extraction
//! - The breadth-first frontier and rate limiting
//! - Overall crawl coordination

mod browser_fetcher;
mod coordinator;
mod fetcher;
mod frontier;
mod http_fetcher;
mod parser;
mod rate_limiter;

pub use browser_fetcher::BrowserFetcher;
pub use coordinator::CrawlEngine;
pub use fetcher::{FetchOutcome, PageFetcher};
pub use frontier::Frontier;
pub use http_fetcher::{build_http_client, fetch_url, HttpFetcher};
pub use parser::{extract_links, extract_metadata, parse_page, PageMetadata, ParsedPage};
pub use rate_limiter::RateLimiter;
