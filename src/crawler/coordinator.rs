//! Crawl engine - main crawl orchestration logic
//!
//! This module contains the main crawl loop, which coordinates:
//! - Dequeuing from the frontier and marking URLs visited
//! - Rate limiting between fetches
//! - Fetching through the configured page fetcher
//! - Extracting metadata and links from fetched pages
//! - Handling interruption and final persistence

use crate::crawler::fetcher::{FetchOutcome, PageFetcher};
use crate::crawler::frontier::Frontier;
use crate::crawler::parser::parse_page;
use crate::crawler::rate_limiter::RateLimiter;
use crate::output::{CrawlStatistics, PageRecord, ResultSink};
use crate::state::EngineState;
use crate::url::{in_scope, normalize_absolute, normalize_url, CrawlTarget};
use crate::CrawlError;
use chrono::Utc;
use std::collections::HashSet;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

/// How often (in fetch attempts) a progress line is logged
const PROGRESS_INTERVAL: u64 = 10;

/// Single-domain crawl engine
///
/// Owns all crawl state for one run: the frontier and visited set, the rate
/// limiter, the result sink and the statistics. The engine is generic over
/// the fetcher so it never needs to know which strategy is active.
pub struct CrawlEngine<F: PageFetcher> {
    fetcher: F,
    target: CrawlTarget,
    frontier: Frontier,
    limiter: RateLimiter,
    sink: ResultSink,
    /// Normalized URLs that already have a row in the sink
    recorded: HashSet<String>,
    state: EngineState,
    stats: CrawlStatistics,
}

impl<F: PageFetcher> CrawlEngine<F> {
    /// Creates a new engine
    ///
    /// # Arguments
    ///
    /// * `seed` - Absolute http(s) URL the crawl starts from
    /// * `fetcher` - Page fetcher implementation
    /// * `delay` - Minimum time between fetch starts
    /// * `sink` - Destination for records; flushed once at the end of [`run`](Self::run)
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlEngine)` - Engine in the `Idle` state with the seed queued
    /// * `Err(CrawlError::Url)` - The seed is not a usable http(s) URL
    pub fn new(
        seed: &str,
        fetcher: F,
        delay: Duration,
        sink: ResultSink,
    ) -> Result<Self, CrawlError> {
        let seed = normalize_absolute(seed)?;
        let target = CrawlTarget::from_seed(&seed)?;

        Ok(Self {
            fetcher,
            target,
            frontier: Frontier::new(seed),
            limiter: RateLimiter::new(delay),
            sink,
            recorded: HashSet::new(),
            state: EngineState::Idle,
            stats: CrawlStatistics::new(),
        })
    }

    /// The domain this crawl is confined to
    pub fn target(&self) -> &CrawlTarget {
        &self.target
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Records collected so far
    pub fn records(&self) -> &[PageRecord] {
        self.sink.records()
    }

    pub fn statistics(&self) -> &CrawlStatistics {
        &self.stats
    }

    /// Runs the crawl until the frontier drains or `cancel` fires
    ///
    /// The cancellation token is checked between pages and while waiting on
    /// the rate limiter; a fetch already in flight runs to completion or to
    /// its timeout. Either way the result sink is flushed before returning,
    /// and the fetcher is shut down.
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlStatistics)` - Final statistics, with `final_state` set
    /// * `Err(CrawlError)` - The engine was already run, or the output could not be written
    pub async fn run(&mut self, cancel: CancellationToken) -> Result<CrawlStatistics, CrawlError> {
        self.transition(EngineState::Running)?;
        self.stats.started_at = Utc::now();

        tracing::info!(
            "Starting {} crawl of {} (delay {:?})",
            self.fetcher.name(),
            self.target.domain(),
            self.limiter.delay()
        );

        let terminal = self.crawl_loop(&cancel).await;
        self.finalize(terminal).await
    }

    /// Main loop; returns the terminal state it stopped in
    async fn crawl_loop(&mut self, cancel: &CancellationToken) -> EngineState {
        loop {
            if cancel.is_cancelled() {
                return EngineState::Interrupted;
            }

            // Dequeue and mark visited before fetching
            let Some(url) = self.frontier.dispatch() else {
                tracing::info!("Frontier is empty, crawl complete");
                return EngineState::Completed;
            };

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return EngineState::Interrupted,
                _ = self.limiter.wait() => {}
            }

            tracing::debug!("Fetching {}", url);
            let outcome = self.fetcher.fetch(&url).await;
            self.stats.fetch_attempts += 1;

            self.process_outcome(&url, outcome);

            if self.stats.fetch_attempts % PROGRESS_INTERVAL == 0 {
                tracing::info!(
                    "Progress: {} pages recorded, {} fetched, {} in frontier, {:.2} pages/sec",
                    self.sink.len(),
                    self.stats.fetch_attempts,
                    self.frontier.len(),
                    self.stats.rate()
                );
            }
        }
    }

    /// Handles the result of fetching `url`
    ///
    /// Per-page failures are logged and counted; they never stop the crawl.
    fn process_outcome(&mut self, url: &Url, outcome: FetchOutcome) {
        self.stats.record_failure(&outcome);

        match outcome {
            FetchOutcome::Success { final_url, html } => {
                self.handle_page(url, &final_url, &html);
            }
            FetchOutcome::NotHtml { content_type } => {
                tracing::debug!("Skipping {} (not HTML: {})", url, content_type);
            }
            failure => {
                tracing::warn!("Failed to fetch {}: {}", url, failure);
            }
        }
    }

    /// Records a fetched page and queues its links
    fn handle_page(&mut self, requested: &Url, final_url: &str, html: &str) {
        // Redirects may change the page's identity
        let page_url = match normalize_url(final_url, requested) {
            Ok(url) => url,
            Err(e) => {
                tracing::debug!("Unusable final URL {:?} for {}: {}", final_url, requested, e);
                requested.clone()
            }
        };

        if page_url != *requested {
            if !in_scope(&page_url, &self.target) {
                tracing::info!("{} redirected out of scope to {}", requested, page_url);
                self.stats.redirected_out_of_scope += 1;
                return;
            }

            if self.recorded.contains(page_url.as_str()) {
                tracing::debug!("{} redirected to already recorded {}", requested, page_url);
                self.stats.duplicate_redirects += 1;
                return;
            }

            // Links are followed once per recorded URL, including targets
            // whose own fetch failed earlier
            self.frontier.mark_visited(&page_url);
        }

        let parsed = parse_page(html, &page_url, &self.target);

        tracing::info!(
            "Recorded {} ({})",
            page_url,
            if parsed.metadata.title.is_empty() {
                "untitled"
            } else {
                parsed.metadata.title.as_str()
            }
        );

        self.recorded.insert(page_url.as_str().to_string());
        self.sink.append(PageRecord {
            url: page_url.to_string(),
            title: parsed.metadata.title,
            description: parsed.metadata.description,
        });
        self.stats.pages_recorded += 1;

        let mut queued = 0;
        for link in parsed.links {
            if self.frontier.enqueue(link) {
                queued += 1;
            }
        }
        tracing::trace!("Queued {} new links from {}", queued, page_url);
    }

    /// Flushes results and shuts the fetcher down
    async fn finalize(&mut self, terminal: EngineState) -> Result<CrawlStatistics, CrawlError> {
        if terminal == EngineState::Interrupted {
            tracing::warn!(
                "Crawl interrupted with {} URLs left in the frontier, saving partial results",
                self.frontier.len()
            );
        }

        self.transition(terminal)?;
        self.fetcher.shutdown().await;

        self.stats.final_state = terminal;
        self.stats.finished_at = Some(Utc::now());
        self.stats.frontier_remaining = self.frontier.len();
        self.stats.urls_visited = self.frontier.visited_count();

        self.sink.flush()?;

        tracing::info!(
            "Crawl {}: {} pages recorded from {} fetches in {:?}",
            terminal,
            self.stats.pages_recorded,
            self.stats.fetch_attempts,
            self.stats.elapsed()
        );

        Ok(self.stats.clone())
    }

    fn transition(&mut self, next: EngineState) -> Result<(), CrawlError> {
        if !self.state.can_transition_to(next) {
            return Err(CrawlError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        Ok(())
    }
}
