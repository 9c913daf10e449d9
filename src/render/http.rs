//! Plain HTTP rendering backend
//!
//! Fetches the served markup without executing scripts. Redirects are followed so that
//! `current_url` reports where the site actually sent us, which is what the redirect
//! termination signal relies on. Non-success statuses are not errors here: the body is
//! kept and the title carries whatever the error page says.

use crate::config::RendererConfig;
use crate::render::{PageSnapshot, RenderError, RenderResult, Renderer};
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client};
use std::time::Duration;

/// User agent sent when the configuration does not override it
const DEFAULT_USER_AGENT: &str = concat!("review-harvest/", env!("CARGO_PKG_VERSION"));

/// Builds an HTTP client for fetching listing pages
///
/// # Arguments
///
/// * `config` - The renderer configuration (for the user agent override)
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &RendererConfig) -> Result<Client, reqwest::Error> {
    let user_agent = config
        .user_agent
        .clone()
        .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());

    Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// A page fetched by the HTTP backend
#[derive(Debug)]
struct LoadedPage {
    final_url: String,
    markup: String,
}

/// Rendering backend that fetches markup over HTTP
pub struct HttpRenderer {
    client: Option<Client>,
    page: Option<LoadedPage>,
}

impl HttpRenderer {
    /// Opens an HTTP "session"
    pub fn new(config: &RendererConfig) -> RenderResult<Self> {
        let client =
            build_http_client(config).map_err(|e| RenderError::SessionStart(e.to_string()))?;
        Ok(Self {
            client: Some(client),
            page: None,
        })
    }

    fn client(&self) -> RenderResult<&Client> {
        self.client
            .as_ref()
            .ok_or_else(|| RenderError::SessionLost("HTTP session already closed".to_string()))
    }

    fn page(&self) -> RenderResult<&LoadedPage> {
        self.client()?;
        self.page
            .as_ref()
            .ok_or_else(|| RenderError::Command("no page has been loaded".to_string()))
    }
}

#[async_trait]
impl Renderer for HttpRenderer {
    async fn navigate(&mut self, url: &str) -> RenderResult<()> {
        let navigation_error = |e: reqwest::Error| RenderError::Navigation {
            url: url.to_string(),
            message: e.to_string(),
        };

        let response = self
            .client()?
            .get(url)
            .send()
            .await
            .map_err(navigation_error)?;

        let status = response.status();
        let final_url = response.url().to_string();
        let markup = response.text().await.map_err(navigation_error)?;

        if !status.is_success() {
            tracing::debug!("{} answered HTTP {}", final_url, status.as_u16());
        }

        self.page = Some(LoadedPage { final_url, markup });
        Ok(())
    }

    async fn current_url(&mut self) -> RenderResult<String> {
        Ok(self.page()?.final_url.clone())
    }

    async fn title(&mut self) -> RenderResult<String> {
        let markup = &self.page()?.markup;
        Ok(PageSnapshot::parse(markup).title().unwrap_or_default())
    }

    async fn wait_for_selector(
        &mut self,
        selector: &str,
        _timeout: Duration,
    ) -> RenderResult<bool> {
        // Served markup never changes after the response, so there is nothing to wait for.
        let markup = &self.page()?.markup;
        Ok(PageSnapshot::parse(markup).contains(selector))
    }

    async fn raw_markup(&mut self) -> RenderResult<String> {
        Ok(self.page()?.markup.clone())
    }

    async fn close(&mut self) -> RenderResult<()> {
        self.client = None;
        self.page = None;
        Ok(())
    }
}
