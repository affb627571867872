//! Output module for crawl results
//!
//! This module handles:
//! - Accumulating page records and writing them to CSV
//! - Recording and printing run statistics

mod sink;
pub mod stats;

pub use sink::{PageRecord, ResultSink, CSV_HEADER};
pub use stats::{print_statistics, CrawlStatistics};
