//! URL handling module for Meta-Crawl
//!
//! This module provides URL normalization, the crawl target derived from the
//! seed, and the scope filter that decides which discovered links are crawled.

mod domain;
mod normalize;
mod scope;

// Re-export main functions
pub use domain::{extract_domain, CrawlTarget};
pub use normalize::{normalize_absolute, normalize_url};
pub use scope::in_scope;
