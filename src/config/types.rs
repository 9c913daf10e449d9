use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Review-Harvest
///
/// Built once per run and handed by reference to every component; nothing mutates it
/// after validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub renderer: RendererConfig,
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub markers: MarkerConfig,
    #[serde(default)]
    pub debug: DebugConfig,
}

/// Crawl pacing, retry and termination thresholds
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Total load attempts per page before it counts as a failed load
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// How long to wait for review content to appear (milliseconds)
    #[serde(rename = "page-load-timeout-ms")]
    pub page_load_timeout_ms: u64,

    /// Pause between load attempts of the same page (milliseconds)
    #[serde(rename = "retry-delay-ms")]
    pub retry_delay_ms: u64,

    /// Politeness pause between successive pages (milliseconds)
    #[serde(rename = "page-delay-ms")]
    pub page_delay_ms: u64,

    /// Number of reviews the site shows on a full page
    #[serde(rename = "reviews-per-page")]
    pub reviews_per_page: u32,

    /// A page past the first with fewer elements than this is treated as the last one;
    /// defaults to `reviews_per_page`
    #[serde(rename = "min-reviews-last-page")]
    pub min_reviews_last_page: Option<u32>,

    /// Consecutive failed page loads that end the crawl
    #[serde(rename = "max-consecutive-failures")]
    pub max_consecutive_failures: u32,

    /// Consecutive pages without a single parseable record that end the crawl
    #[serde(rename = "max-consecutive-empty-pages")]
    pub max_consecutive_empty_pages: u32,

    /// Optional hard cap on the number of pages visited
    #[serde(rename = "max-pages")]
    pub max_pages: Option<u32>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            page_load_timeout_ms: 15_000,
            retry_delay_ms: 2_000,
            page_delay_ms: 2_000,
            reviews_per_page: 20,
            min_reviews_last_page: None,
            max_consecutive_failures: 3,
            max_consecutive_empty_pages: 3,
            max_pages: None,
        }
    }
}

impl CrawlerConfig {
    /// Element count below which a page past the first is probably the last one
    pub fn last_page_threshold(&self) -> u32 {
        self.min_reviews_last_page.unwrap_or(self.reviews_per_page)
    }

    pub fn page_load_timeout(&self) -> Duration {
        Duration::from_millis(self.page_load_timeout_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }
}

/// Which rendering engine drives the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum RendererBackend {
    /// Headless browser over WebDriver; needed for client-rendered listings
    #[serde(rename = "webdriver")]
    WebDriver,

    /// Plain HTTP fetch of the served markup
    #[serde(rename = "http")]
    Http,
}

/// Rendering session configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    pub backend: RendererBackend,

    /// Address of the WebDriver server (chromedriver, selenium, ...)
    #[serde(rename = "webdriver-url")]
    pub webdriver_url: String,

    /// Extra command-line switches passed to the browser
    #[serde(rename = "browser-args")]
    pub browser_args: Vec<String>,

    /// User agent override for the HTTP backend
    #[serde(rename = "user-agent")]
    pub user_agent: Option<String>,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            backend: RendererBackend::WebDriver,
            webdriver_url: "http://localhost:9515".to_string(),
            browser_args: [
                "--headless",
                "--disable-gpu",
                "--window-size=1920,1080",
                "--disable-extensions",
                "--no-sandbox",
                "--disable-dev-shm-usage",
            ]
            .iter()
            .map(|arg| arg.to_string())
            .collect(),
            user_agent: None,
        }
    }
}

/// Star-rating filter applied to every extracted review
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Accepted ratings; empty means every rating (and no rating) is accepted
    pub stars: Vec<u8>,
}

impl FilterConfig {
    pub fn new(stars: Vec<u8>) -> Self {
        Self { stars }
    }

    /// Returns true if a filter is in effect
    pub fn is_active(&self) -> bool {
        !self.stars.is_empty()
    }

    /// Returns true if a review with this rating passes the filter
    ///
    /// With an active filter an absent rating never passes.
    pub fn admits(&self, stars: Option<u8>) -> bool {
        if !self.is_active() {
            return true;
        }
        stars.map_or(false, |s| self.stars.contains(&s))
    }
}

/// Markers that identify pages the crawl must not go past
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MarkerConfig {
    /// Substrings of the page title that mark an error or blocked page
    #[serde(rename = "hard-stop-titles")]
    pub hard_stop_titles: Vec<String>,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            hard_stop_titles: ["404", "Whoops", "Access Denied", "Blocked"]
                .iter()
                .map(|m| m.to_string())
                .collect(),
        }
    }
}

impl MarkerConfig {
    /// Returns the first hard-stop marker contained in `title`, if any
    pub fn hard_stop_marker(&self, title: &str) -> Option<&str> {
        self.hard_stop_titles
            .iter()
            .map(String::as_str)
            .find(|marker| title.contains(marker))
    }
}

/// Diagnostics toggles
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    /// Save the raw markup of the first page
    #[serde(rename = "save-html")]
    pub save_html: bool,

    /// Where the first page's markup is written
    #[serde(rename = "html-path")]
    pub html_path: String,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            save_html: false,
            html_path: "debug_page.html".to_string(),
        }
    }
}
