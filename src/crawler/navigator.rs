//! Page loading with retries and hard-stop detection

use crate::config::{Config, DebugConfig, MarkerConfig};
use crate::render::{RenderResult, Renderer};
use crate::url::page_number;
use std::time::Duration;
use url::Url;

/// Selectors whose presence means review content has rendered, primary first
const CONTENT_SELECTORS: &[&str] = &["article", "div.styles_reviewCard__hcAvl"];

/// How much shorter the wait for a fallback content selector is
const FALLBACK_WAIT_REDUCTION: Duration = Duration::from_secs(5);

/// Shortest wait ever granted to a fallback content selector
const MIN_FALLBACK_WAIT: Duration = Duration::from_secs(1);

/// Outcome of loading one listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLoadResult {
    /// The URL that was requested
    pub url: String,

    /// The page number that was requested
    pub page_number: u32,

    /// Review content appeared within the timeout
    pub succeeded: bool,

    /// The page is an error or blocked page
    pub is_hard_stop: bool,

    /// The page number the site actually served, when it differs from the request
    pub redirected_to_page: Option<u32>,

    /// Where the session ended up after redirects
    pub final_url: Option<String>,

    pub title: Option<String>,

    /// Page markup, captured only on success
    pub markup: Option<String>,

    /// Load attempts used
    pub attempts: u32,
}

impl PageLoadResult {
    fn failed(url: &Url, page: u32, attempts: u32) -> Self {
        Self {
            url: url.to_string(),
            page_number: page,
            succeeded: false,
            is_hard_stop: false,
            redirected_to_page: None,
            final_url: None,
            title: None,
            markup: None,
            attempts,
        }
    }

    /// The URL reviews on this page are attributed to
    pub fn source_url(&self) -> &str {
        self.final_url.as_deref().unwrap_or(&self.url)
    }
}

/// What a single load attempt observed
enum Attempt {
    Loaded {
        final_url: String,
        title: String,
        markup: String,
    },
    HardStop {
        final_url: Option<String>,
        title: String,
        marker: String,
    },
    TimedOut,
}

/// Loads listing pages through a renderer
#[derive(Debug, Clone)]
pub struct PageNavigator {
    attempts: u32,
    content_timeout: Duration,
    retry_delay: Duration,
    markers: MarkerConfig,
    debug: DebugConfig,
}

impl PageNavigator {
    pub fn new(config: &Config) -> Self {
        Self {
            attempts: config.crawler.max_retries.max(1),
            content_timeout: config.crawler.page_load_timeout(),
            retry_delay: config.crawler.retry_delay(),
            markers: config.markers.clone(),
            debug: config.debug.clone(),
        }
    }

    /// Loads page `page` at `url`
    ///
    /// A hard-stop page returns at once without using the remaining attempts. Running out
    /// of attempts yields an unsuccessful result rather than an error; only a lost
    /// session is returned as `Err`.
    pub async fn load<R: Renderer + ?Sized>(
        &self,
        renderer: &mut R,
        url: &Url,
        page: u32,
    ) -> RenderResult<PageLoadResult> {
        for attempt in 1..=self.attempts {
            tracing::debug!("Loading page {} (attempt {}/{})", page, attempt, self.attempts);

            match self.attempt(renderer, url).await {
                Ok(Attempt::Loaded {
                    final_url,
                    title,
                    markup,
                }) => {
                    let redirected_to_page =
                        page_number(&final_url).filter(|resolved| *resolved != page);

                    if page == 1 && self.debug.save_html {
                        self.save_debug_html(&markup).await;
                    }

                    return Ok(PageLoadResult {
                        url: url.to_string(),
                        page_number: page,
                        succeeded: true,
                        is_hard_stop: false,
                        redirected_to_page,
                        final_url: Some(final_url),
                        title: Some(title),
                        markup: Some(markup),
                        attempts: attempt,
                    });
                }
                Ok(Attempt::HardStop {
                    final_url,
                    title,
                    marker,
                }) => {
                    tracing::warn!(
                        "Page {} is an error or blocked page (title {:?} contains {:?})",
                        page,
                        title,
                        marker
                    );
                    return Ok(PageLoadResult {
                        is_hard_stop: true,
                        final_url,
                        title: Some(title),
                        ..PageLoadResult::failed(url, page, attempt)
                    });
                }
                Ok(Attempt::TimedOut) => {
                    tracing::warn!(
                        "Review content did not appear on page {} (attempt {}/{})",
                        page,
                        attempt,
                        self.attempts
                    );
                }
                Err(e) if e.is_session_failure() => return Err(e),
                Err(e) => {
                    tracing::warn!(
                        "Attempt {}/{} for page {} failed: {}",
                        attempt,
                        self.attempts,
                        page,
                        e
                    );
                }
            }

            if attempt < self.attempts {
                tokio::time::sleep(self.retry_delay).await;
            }
        }

        Ok(PageLoadResult::failed(url, page, self.attempts))
    }

    async fn attempt<R: Renderer + ?Sized>(
        &self,
        renderer: &mut R,
        url: &Url,
    ) -> RenderResult<Attempt> {
        renderer.navigate(url.as_str()).await?;

        let title = renderer.title().await?;
        if let Some(marker) = self.markers.hard_stop_marker(&title) {
            return Ok(Attempt::HardStop {
                final_url: renderer.current_url().await.ok(),
                marker: marker.to_string(),
                title,
            });
        }

        if !self.wait_for_content(renderer).await? {
            // error pages sometimes replace the listing only after the wait
            let title = renderer.title().await?;
            if let Some(marker) = self.markers.hard_stop_marker(&title) {
                return Ok(Attempt::HardStop {
                    final_url: renderer.current_url().await.ok(),
                    marker: marker.to_string(),
                    title,
                });
            }
            return Ok(Attempt::TimedOut);
        }

        Ok(Attempt::Loaded {
            final_url: renderer.current_url().await?,
            title: renderer.title().await?,
            markup: renderer.raw_markup().await?,
        })
    }

    /// Waits for the primary content selector, then for each fallback in turn
    async fn wait_for_content<R: Renderer + ?Sized>(&self, renderer: &mut R) -> RenderResult<bool> {
        for (index, selector) in CONTENT_SELECTORS.iter().enumerate() {
            let timeout = if index == 0 {
                self.content_timeout
            } else {
                self.fallback_timeout()
            };

            if renderer.wait_for_selector(selector, timeout).await? {
                tracing::debug!("Content appeared ({})", selector);
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn fallback_timeout(&self) -> Duration {
        self.content_timeout
            .saturating_sub(FALLBACK_WAIT_REDUCTION)
            .max(MIN_FALLBACK_WAIT)
    }

    async fn save_debug_html(&self, markup: &str) {
        match tokio::fs::write(&self.debug.html_path, markup).await {
            Ok(()) => tracing::info!("Saved page markup to {}", self.debug.html_path),
            Err(e) => tracing::warn!(
                "Failed to save page markup to {}: {}",
                self.debug.html_path,
                e
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::testing::{listing_page, Scripted, ScriptedRenderer};
    use crate::render::RenderError;

    fn navigator() -> PageNavigator {
        let mut config = Config::default();
        config.crawler.retry_delay_ms = 0;
        config.crawler.max_retries = 3;
        PageNavigator::new(&config)
    }

    fn url(page: u32) -> Url {
        Url::parse(&format!("https://reviews.test/review/acme?page={}", page)).unwrap()
    }

    #[tokio::test]
    async fn test_successful_load() {
        let mut renderer = ScriptedRenderer::new().page(2, Scripted::page(listing_page(3)));

        let result = navigator().load(&mut renderer, &url(2), 2).await.unwrap();

        assert!(result.succeeded);
        assert!(!result.is_hard_stop);
        assert_eq!(result.redirected_to_page, None);
        assert_eq!(result.attempts, 1);
        assert!(result.markup.unwrap().contains("<article"));
        assert_eq!(result.title.as_deref(), Some("Acme Reviews"));
    }

    #[tokio::test]
    async fn test_hard_stop_skips_remaining_attempts() {
        let mut renderer = ScriptedRenderer::new().page(3, Scripted::blank("Access Denied"));

        let result = navigator().load(&mut renderer, &url(3), 3).await.unwrap();

        assert!(!result.succeeded);
        assert!(result.is_hard_stop);
        assert_eq!(result.attempts, 1);
        assert_eq!(renderer.navigations().len(), 1);
    }

    #[tokio::test]
    async fn test_timeouts_exhaust_attempts() {
        let mut renderer = ScriptedRenderer::new().page(4, Scripted::blank("Acme Reviews"));

        let result = navigator().load(&mut renderer, &url(4), 4).await.unwrap();

        assert!(!result.succeeded);
        assert!(!result.is_hard_stop);
        assert_eq!(result.attempts, 3);
        assert_eq!(renderer.navigations().len(), 3);
    }

    #[tokio::test]
    async fn test_navigation_error_is_retried() {
        let mut renderer = ScriptedRenderer::new().page_sequence(
            2,
            vec![Scripted::NavigationError, Scripted::page(listing_page(20))],
        );

        let result = navigator().load(&mut renderer, &url(2), 2).await.unwrap();

        assert!(result.succeeded);
        assert_eq!(result.attempts, 2);
    }

    #[tokio::test]
    async fn test_session_loss_is_fatal() {
        let mut renderer = ScriptedRenderer::new().page(2, Scripted::SessionGone);

        let err = navigator().load(&mut renderer, &url(2), 2).await.unwrap_err();

        assert!(matches!(err, RenderError::SessionLost(_)));
        assert_eq!(renderer.navigations().len(), 1);
    }

    #[tokio::test]
    async fn test_redirect_is_reported() {
        let mut renderer = ScriptedRenderer::new()
            .page(8, Scripted::page(listing_page(20)).served_as(url(1).as_str()));

        let result = navigator().load(&mut renderer, &url(8), 8).await.unwrap();

        assert!(result.succeeded);
        assert_eq!(result.redirected_to_page, Some(1));
        assert_eq!(result.source_url(), url(1).as_str());
    }

    #[tokio::test]
    async fn test_missing_page_param_is_not_a_redirect() {
        let mut renderer = ScriptedRenderer::new().page(
            1,
            Scripted::page(listing_page(20)).served_as("https://reviews.test/review/acme"),
        );

        let result = navigator().load(&mut renderer, &url(1), 1).await.unwrap();

        assert_eq!(result.redirected_to_page, None);
    }

    #[test]
    fn test_fallback_timeout() {
        let mut config = Config::default();
        config.crawler.page_load_timeout_ms = 15_000;
        assert_eq!(
            PageNavigator::new(&config).fallback_timeout(),
            Duration::from_secs(10)
        );

        config.crawler.page_load_timeout_ms = 3_000;
        assert_eq!(
            PageNavigator::new(&config).fallback_timeout(),
            Duration::from_secs(1)
        );
    }

    #[tokio::test]
    async fn test_debug_html_saved_for_first_page() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("first.html");

        let mut config = Config::default();
        config.crawler.retry_delay_ms = 0;
        config.debug.save_html = true;
        config.debug.html_path = path.to_string_lossy().into_owned();

        let mut renderer = ScriptedRenderer::new()
            .page(1, Scripted::page(listing_page(2)))
            .page(2, Scripted::page(listing_page(2)));
        let navigator = PageNavigator::new(&config);

        navigator.load(&mut renderer, &url(1), 1).await.unwrap();
        let saved = std::fs::read_to_string(&path).unwrap();
        assert!(saved.contains("<article"));

        std::fs::remove_file(&path).unwrap();
        navigator.load(&mut renderer, &url(2), 2).await.unwrap();
        assert!(!path.exists());
    }
}
