//! Run statistics
//!
//! Counters updated by the crawl engine as outcomes arrive, and the summary
//! printed when the run finishes.

use crate::crawler::FetchOutcome;
use crate::state::EngineState;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Crawl statistics summary
#[derive(Debug, Clone)]
pub struct CrawlStatistics {
    /// Wall-clock start of the run
    pub started_at: DateTime<Utc>,

    /// Wall-clock end of the run, set at finalization
    pub finished_at: Option<DateTime<Utc>>,

    /// Terminal state of the run
    pub final_state: EngineState,

    /// Pages handed to the fetcher
    pub fetch_attempts: u64,

    /// Rows added to the result sink
    pub pages_recorded: u64,

    /// Non-2xx responses
    pub http_errors: u64,

    /// Connection, DNS, TLS and protocol failures
    pub network_errors: u64,

    /// Fetches that hit the timeout
    pub timeouts: u64,

    /// Responses skipped because they were not HTML
    pub not_html: u64,

    /// Redirects that ended on another host
    pub redirected_out_of_scope: u64,

    /// Redirects whose target had already been recorded
    pub duplicate_redirects: u64,

    /// URLs still queued when the run ended
    pub frontier_remaining: usize,

    /// Distinct URLs dispatched or reached through a redirect
    pub urls_visited: usize,
}

impl CrawlStatistics {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            final_state: EngineState::Idle,
            fetch_attempts: 0,
            pages_recorded: 0,
            http_errors: 0,
            network_errors: 0,
            timeouts: 0,
            not_html: 0,
            redirected_out_of_scope: 0,
            duplicate_redirects: 0,
            frontier_remaining: 0,
            urls_visited: 0,
        }
    }

    /// Counts a non-success outcome
    pub fn record_failure(&mut self, outcome: &FetchOutcome) {
        match outcome {
            FetchOutcome::Success { .. } => {}
            FetchOutcome::HttpError { .. } => self.http_errors += 1,
            FetchOutcome::NetworkError { .. } => self.network_errors += 1,
            FetchOutcome::Timeout => self.timeouts += 1,
            FetchOutcome::NotHtml { .. } => self.not_html += 1,
        }
    }

    /// Failed fetches of any kind (non-HTML skips are not failures)
    pub fn total_failures(&self) -> u64 {
        self.http_errors + self.network_errors + self.timeouts
    }

    /// Time between start and finish, or since start if still running
    pub fn elapsed(&self) -> Duration {
        let end = self.finished_at.unwrap_or_else(Utc::now);
        (end - self.started_at).to_std().unwrap_or_default()
    }

    /// Pages fetched per second over the whole run
    pub fn rate(&self) -> f64 {
        let secs = self.elapsed().as_secs_f64();
        if secs > 0.0 {
            self.fetch_attempts as f64 / secs
        } else {
            0.0
        }
    }
}

impl Default for CrawlStatistics {
    fn default() -> Self {
        Self::new()
    }
}

/// Prints crawl statistics to stdout in a human-readable format
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Run:");
    println!("  Final state: {}", stats.final_state);
    println!("  Started: {}", stats.started_at.format("%Y-%m-%d %H:%M:%S UTC"));
    println!("  Elapsed: {:.1}s", stats.elapsed().as_secs_f64());
    println!();

    println!("Pages:");
    println!("  Fetch attempts: {}", stats.fetch_attempts);
    println!("  URLs visited: {}", stats.urls_visited);
    println!("  Recorded: {}", stats.pages_recorded);
    println!("  Skipped (not HTML): {}", stats.not_html);
    if stats.frontier_remaining > 0 {
        println!("  Left in frontier: {}", stats.frontier_remaining);
    }
    println!();

    if stats.total_failures() > 0 {
        println!("Failures:");
        println!("  HTTP errors: {}", stats.http_errors);
        println!("  Network errors: {}", stats.network_errors);
        println!("  Timeouts: {}", stats.timeouts);
        println!();
    }

    if stats.redirected_out_of_scope > 0 || stats.duplicate_redirects > 0 {
        println!("Redirects:");
        println!("  Left the domain: {}", stats.redirected_out_of_scope);
        println!("  To an already recorded page: {}", stats.duplicate_redirects);
        println!();
    }

    let success_rate = if stats.fetch_attempts > 0 {
        (stats.pages_recorded as f64 / stats.fetch_attempts as f64) * 100.0
    } else {
        0.0
    };

    println!(
        "Success Rate: {:.1}% ({} / {} fetches recorded)",
        success_rate, stats.pages_recorded, stats.fetch_attempts
    );
}
