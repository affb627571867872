use serde::Deserialize;
use std::time::Duration;

/// User agent sent by the static fetcher unless configured otherwise
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Main configuration structure for Meta-Crawl
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub browser: BrowserSettings,
    pub output: OutputConfig,
}

/// Which page fetcher implementation drives the crawl
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchMode {
    /// Plain HTTP GET of the raw response body
    #[default]
    Static,
    /// Headless browser, serializing the DOM after scripts have run
    Rendered,
}

impl FetchMode {
    /// Default minimum delay between fetch starts for this mode (seconds)
    pub fn default_delay_secs(&self) -> f64 {
        match self {
            Self::Static => 0.5,
            Self::Rendered => 1.0,
        }
    }
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Fetch strategy
    pub mode: FetchMode,

    /// Minimum time between the starts of consecutive fetches (seconds).
    /// Falls back to the mode's default when unset.
    pub delay: Option<f64>,

    /// Upper bound on a single fetch (seconds)
    pub timeout: u64,

    /// Maximum redirect hops followed by the static fetcher
    #[serde(rename = "max-redirects")]
    pub max_redirects: usize,
}

impl CrawlerConfig {
    /// Effective inter-fetch delay
    pub fn delay(&self) -> Duration {
        let secs = self
            .delay
            .unwrap_or_else(|| self.mode.default_delay_secs());
        Duration::try_from_secs_f64(secs.max(0.0)).unwrap_or(Duration::MAX)
    }

    /// Per-fetch timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            mode: FetchMode::Static,
            delay: None,
            timeout: 10,
            max_redirects: 10,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Full User-Agent header value
    pub value: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            value: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Headless browser settings, used only in rendered mode
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    /// Run without a visible window
    pub headless: bool,

    /// Time given to client-side scripts after the document has loaded (milliseconds)
    #[serde(rename = "settle-time")]
    pub settle_time: u64,

    /// Launch Chromium with `--no-sandbox` (needed in some containers)
    #[serde(rename = "no-sandbox")]
    pub no_sandbox: bool,
}

impl BrowserSettings {
    pub fn settle_time(&self) -> Duration {
        Duration::from_millis(self.settle_time)
    }
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: true,
            settle_time: 500,
            no_sandbox: false,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path of the CSV file; derived from the seed host when unset
    pub path: Option<String>,

    /// Prefix the file with a UTF-8 byte order mark
    pub bom: bool,
}
