//! Configuration module for Meta-Crawl
//!
//! Settings come from three layers: built-in defaults, an optional TOML file,
//! and command-line flags applied by the binary on top of the loaded file.
//!
//! # Example
//!
//! ```no_run
//! use meta_crawl::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("crawl.toml")).unwrap();
//! println!("Delay between fetches: {:?}", config.crawler.delay());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    BrowserSettings, Config, CrawlerConfig, FetchMode, OutputConfig, UserAgentConfig,
    DEFAULT_USER_AGENT,
};

// Re-export parser functions
pub use parser::{load_config, parse_config};
pub use validation::validate;
