//! Rendering session abstraction
//!
//! The crawler only ever needs a handful of things from a rendering engine: go to a URL,
//! report where it ended up and what the title is, wait for some content to show up,
//! and hand over the markup. [`Renderer`] captures exactly that. Element-level queries
//! run against a [`PageSnapshot`] of the markup instead of the live session.
//!
//! Two backends are provided:
//! - [`WebDriverRenderer`]: a headless browser driven over WebDriver, for client-rendered
//!   listings
//! - [`HttpRenderer`]: a plain HTTP fetch, for server-rendered pages and tests

mod http;
mod snapshot;
mod webdriver;

pub use http::{build_http_client, HttpRenderer};
pub use snapshot::{attribute, find_all_in, find_one, text, text_lines, PageSnapshot};
pub use webdriver::WebDriverRenderer;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Errors raised by a rendering backend
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Failed to start rendering session: {0}")]
    SessionStart(String),

    #[error("Rendering session lost: {0}")]
    SessionLost(String),

    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("Renderer command failed: {0}")]
    Command(String),
}

impl RenderError {
    /// Returns true if the session itself is unusable
    ///
    /// Session failures end the run; every other render error only fails the current
    /// load attempt.
    pub fn is_session_failure(&self) -> bool {
        matches!(self, Self::SessionStart(_) | Self::SessionLost(_))
    }
}

/// Result type for rendering operations
pub type RenderResult<T> = Result<T, RenderError>;

/// A single rendering session
///
/// A session is owned by exactly one crawl controller and driven strictly sequentially.
#[async_trait]
pub trait Renderer: Send {
    /// Loads `url` in the session
    async fn navigate(&mut self, url: &str) -> RenderResult<()>;

    /// Returns the URL the session currently shows (after any redirects)
    async fn current_url(&mut self) -> RenderResult<String>;

    /// Returns the current page title
    async fn title(&mut self) -> RenderResult<String>;

    /// Waits up to `timeout` for an element matching `selector` to be present
    async fn wait_for_selector(&mut self, selector: &str, timeout: Duration)
        -> RenderResult<bool>;

    /// Returns the current page markup
    async fn raw_markup(&mut self) -> RenderResult<String>;

    /// Releases the session; further calls fail with [`RenderError::SessionLost`]
    async fn close(&mut self) -> RenderResult<()>;
}
