//! WebDriver rendering backend
//!
//! Drives a headless Chrome through a WebDriver server (chromedriver or a Selenium
//! grid). This is the backend for client-rendered listings, where the reviews only
//! exist after the page's scripts have run.

use crate::config::RendererConfig;
use crate::render::{RenderError, RenderResult, Renderer};
use async_trait::async_trait;
use std::time::Duration;
use thirtyfour::error::WebDriverError;
use thirtyfour::prelude::*;
use tokio::time::Instant;

/// How often the DOM is polled while waiting for content
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Rendering backend backed by a WebDriver browser session
pub struct WebDriverRenderer {
    driver: Option<WebDriver>,
}

impl WebDriverRenderer {
    /// Starts a browser session on the configured WebDriver server
    ///
    /// # Returns
    ///
    /// * `Ok(WebDriverRenderer)` - The session is up
    /// * `Err(RenderError::SessionStart)` - The server is unreachable or refused the session
    pub async fn connect(config: &RendererConfig) -> RenderResult<Self> {
        let mut caps = DesiredCapabilities::chrome();
        for arg in &config.browser_args {
            caps.add_arg(arg)
                .map_err(|e| RenderError::SessionStart(e.to_string()))?;
        }

        tracing::debug!("Connecting to WebDriver at {}", config.webdriver_url);
        let driver = WebDriver::new(config.webdriver_url.as_str(), caps)
            .await
            .map_err(|e| RenderError::SessionStart(e.to_string()))?;

        Ok(Self {
            driver: Some(driver),
        })
    }

    fn driver(&self) -> RenderResult<&WebDriver> {
        self.driver
            .as_ref()
            .ok_or_else(|| RenderError::SessionLost("browser session already closed".to_string()))
    }
}

/// Maps a WebDriver error to a session failure or a plain command failure
fn classify(error: WebDriverError) -> RenderError {
    let message = error.to_string();
    if is_session_gone(&message) {
        RenderError::SessionLost(message)
    } else {
        RenderError::Command(message)
    }
}

/// Returns true if a WebDriver error message means the browser session is gone
fn is_session_gone(message: &str) -> bool {
    let message = message.to_lowercase();
    ["invalid session id", "session deleted", "no such window", "chrome not reachable"]
        .iter()
        .any(|marker| message.contains(marker))
}

#[async_trait]
impl Renderer for WebDriverRenderer {
    async fn navigate(&mut self, url: &str) -> RenderResult<()> {
        match self.driver()?.goto(url).await {
            Ok(()) => Ok(()),
            Err(e) => match classify(e) {
                RenderError::Command(message) => Err(RenderError::Navigation {
                    url: url.to_string(),
                    message,
                }),
                other => Err(other),
            },
        }
    }

    async fn current_url(&mut self) -> RenderResult<String> {
        let url = self.driver()?.current_url().await.map_err(classify)?;
        Ok(url.to_string())
    }

    async fn title(&mut self) -> RenderResult<String> {
        self.driver()?.title().await.map_err(classify)
    }

    async fn wait_for_selector(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> RenderResult<bool> {
        let deadline = Instant::now() + timeout;
        loop {
            match self.driver()?.find_all(By::Css(selector)).await {
                Ok(found) if !found.is_empty() => return Ok(true),
                Ok(_) => {}
                Err(e) => {
                    let error = classify(e);
                    if error.is_session_failure() {
                        return Err(error);
                    }
                    tracing::debug!("Lookup of '{}' failed while waiting: {}", selector, error);
                }
            }

            if Instant::now() >= deadline {
                return Ok(false);
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn raw_markup(&mut self) -> RenderResult<String> {
        self.driver()?.source().await.map_err(classify)
    }

    async fn close(&mut self) -> RenderResult<()> {
        match self.driver.take() {
            Some(driver) => driver.quit().await.map_err(classify),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_session_gone() {
        assert!(is_session_gone("invalid session id: session deleted"));
        assert!(is_session_gone("No Such Window: target window already closed"));
        assert!(is_session_gone("unknown error: chrome not reachable"));

        assert!(!is_session_gone("timeout: Timed out receiving message from renderer"));
        assert!(!is_session_gone("no such element: Unable to locate element"));
    }
}
