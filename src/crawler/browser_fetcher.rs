//! Rendered fetcher backed by a headless Chromium instance
//!
//! Each fetch opens a fresh tab, navigates, lets client-side scripts settle
//! and serializes the resulting DOM. The status code of the main document
//! response is captured from network events so that error pages map to
//! [`FetchOutcome::HttpError`] just like in the static fetcher.

use crate::config::{BrowserSettings, CrawlerConfig};
use crate::crawler::fetcher::{FetchOutcome, PageFetcher};
use crate::CrawlError;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::{EventResponseReceived, ResourceType};
use chromiumoxide::error::CdpError;
use chromiumoxide::listeners::EventStream;
use chromiumoxide::Page;
use futures::StreamExt;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use url::Url;

/// Titles that single-page apps show before their content has rendered
const PLACEHOLDER_TITLES: &[&str] = &["", "loading", "loading...", "読み込み中"];

/// Poll interval and attempt count while waiting for a placeholder title to change
const TITLE_POLL_INTERVAL: Duration = Duration::from_millis(500);
const TITLE_POLL_ATTEMPTS: usize = 10;

/// How long to wait for the buffered main-document response event
const STATUS_EVENT_WAIT: Duration = Duration::from_millis(250);

/// Page fetcher that renders pages in a headless browser
pub struct BrowserFetcher {
    browser: Browser,
    handler_task: JoinHandle<()>,
    timeout: Duration,
    settle_time: Duration,
}

impl BrowserFetcher {
    /// Launches the browser and starts its event handler task
    ///
    /// # Errors
    ///
    /// Returns [`CrawlError::Browser`] if Chromium cannot be found or started.
    pub async fn launch(
        crawler: &CrawlerConfig,
        settings: &BrowserSettings,
    ) -> Result<Self, CrawlError> {
        let mut builder = BrowserConfig::builder().request_timeout(crawler.timeout());
        if !settings.headless {
            builder = builder.with_head();
        }
        if settings.no_sandbox {
            builder = builder.no_sandbox();
        }
        let config = builder.build().map_err(CrawlError::Browser)?;

        let (browser, mut handler) = Browser::launch(config).await?;

        // The handler drives the CDP connection and must be polled for the browser to work
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("Browser handler error: {}", e);
                }
            }
        });

        tracing::info!(
            "Browser launched ({})",
            if settings.headless { "headless" } else { "headed" }
        );

        Ok(Self {
            browser,
            handler_task,
            timeout: crawler.timeout(),
            settle_time: settings.settle_time(),
        })
    }

    /// Navigates an open tab and extracts the rendered document
    async fn render(&self, page: &Page, url: &Url) -> FetchOutcome {
        let deadline = Instant::now() + self.timeout;

        let mut responses = match page.event_listener::<EventResponseReceived>().await {
            Ok(stream) => Some(stream),
            Err(e) => {
                tracing::warn!("Failed to subscribe to response events for {}: {}", url, e);
                None
            }
        };

        match tokio::time::timeout_at(deadline, page.goto(url.as_str())).await {
            Err(_) => return FetchOutcome::Timeout,
            Ok(Err(e)) => return classify_error(e),
            Ok(Ok(_)) => {}
        }

        if let Some(stream) = responses.as_mut() {
            if let Some(status) = main_document_status(stream).await {
                if !(200..300).contains(&status) {
                    return FetchOutcome::HttpError { status };
                }
            }
        }

        self.wait_for_render(page, deadline).await;

        let html = match tokio::time::timeout_at(deadline, page.content()).await {
            Err(_) => return FetchOutcome::Timeout,
            Ok(Err(e)) => return classify_error(e),
            Ok(Ok(html)) => html,
        };

        let final_url = match page.url().await {
            Ok(Some(current)) => current,
            _ => url.to_string(),
        };

        FetchOutcome::Success { final_url, html }
    }

    /// Gives client-side scripts time to render, bounded by the deadline
    ///
    /// Sleeps for the settle time, then keeps polling while the title still
    /// looks like a loading placeholder.
    async fn wait_for_render(&self, page: &Page, deadline: Instant) {
        tokio::time::sleep_until(deadline.min(Instant::now() + self.settle_time)).await;

        for _ in 0..TITLE_POLL_ATTEMPTS {
            let title = page.get_title().await.ok().flatten().unwrap_or_default();
            if !is_placeholder_title(&title) {
                return;
            }
            if Instant::now() + TITLE_POLL_INTERVAL >= deadline {
                return;
            }
            tokio::time::sleep(TITLE_POLL_INTERVAL).await;
        }
    }
}

impl PageFetcher for BrowserFetcher {
    async fn fetch(&self, url: &Url) -> FetchOutcome {
        let page = match self.browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => return classify_error(e),
        };

        let outcome = self.render(&page, url).await;

        if let Err(e) = page.close().await {
            tracing::debug!("Failed to close tab for {}: {}", url, e);
        }

        outcome
    }

    async fn shutdown(&mut self) {
        if let Err(e) = self.browser.close().await {
            tracing::warn!("Failed to close browser: {}", e);
        }
        if let Err(e) = self.browser.wait().await {
            tracing::warn!("Failed waiting for browser exit: {}", e);
        }
        self.handler_task.abort();
        tracing::info!("Browser closed");
    }

    fn name(&self) -> &'static str {
        "rendered"
    }
}

/// Reads the status of the first document response seen during navigation
///
/// Redirect hops are not reported as separate responses, so the first
/// document response belongs to the final URL.
async fn main_document_status(stream: &mut EventStream<EventResponseReceived>) -> Option<u16> {
    loop {
        match tokio::time::timeout(STATUS_EVENT_WAIT, stream.next()).await {
            Ok(Some(event)) => {
                if event.r#type == ResourceType::Document {
                    return u16::try_from(event.response.status).ok();
                }
            }
            Ok(None) | Err(_) => return None,
        }
    }
}

fn classify_error(e: CdpError) -> FetchOutcome {
    match e {
        CdpError::Timeout => FetchOutcome::Timeout,
        other => FetchOutcome::NetworkError {
            error: other.to_string(),
        },
    }
}

/// Checks whether a title is a known loading placeholder
fn is_placeholder_title(title: &str) -> bool {
    let title = title.trim().to_lowercase();
    PLACEHOLDER_TITLES.contains(&title.as_str())
}
