//! Scripted renderer and page fixtures for crawler unit tests

use crate::render::{PageSnapshot, RenderError, RenderResult, Renderer};
use crate::url::page_number;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// What the renderer does when a page is requested
#[derive(Debug, Clone)]
pub enum Scripted {
    /// Serves `markup`, optionally pretending the site redirected to `served_as`
    Page {
        title: String,
        markup: String,
        served_as: Option<String>,
    },
    /// Navigation succeeds but review content never appears
    Blank { title: String },
    NavigationError,
    SessionGone,
}

impl Scripted {
    pub fn page(markup: String) -> Self {
        Self::Page {
            title: "Acme Reviews".to_string(),
            markup,
            served_as: None,
        }
    }

    pub fn blank(title: &str) -> Self {
        Self::Blank {
            title: title.to_string(),
        }
    }

    pub fn served_as(self, url: &str) -> Self {
        match self {
            Self::Page { title, markup, .. } => Self::Page {
                title,
                markup,
                served_as: Some(url.to_string()),
            },
            other => other,
        }
    }
}

/// Shared view of what the renderer was asked to do
#[derive(Debug, Clone, Default)]
pub struct ScriptLog {
    inner: Arc<Mutex<LogInner>>,
}

#[derive(Debug, Default)]
struct LogInner {
    navigations: Vec<String>,
    closed: bool,
}

impl ScriptLog {
    pub fn navigations(&self) -> Vec<String> {
        self.inner.lock().unwrap().navigations.clone()
    }

    pub fn requested_pages(&self) -> Vec<u32> {
        self.navigations()
            .iter()
            .map(|url| page_number(url).unwrap_or(1))
            .collect()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock().unwrap().closed
    }
}

/// A renderer that replays scripted responses keyed by the requested page number
///
/// Each page has a queue of responses; the last one repeats. Unscripted pages are
/// served as a 404 page.
#[derive(Debug, Default)]
pub struct ScriptedRenderer {
    script: HashMap<u32, VecDeque<Scripted>>,
    current: Option<(String, Scripted)>,
    log: ScriptLog,
}

impl ScriptedRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(self, page: u32, response: Scripted) -> Self {
        self.page_sequence(page, vec![response])
    }

    pub fn page_sequence(mut self, page: u32, responses: Vec<Scripted>) -> Self {
        self.script.insert(page, responses.into());
        self
    }

    pub fn log(&self) -> ScriptLog {
        self.log.clone()
    }

    pub fn navigations(&self) -> Vec<String> {
        self.log.navigations()
    }

    fn next_response(&mut self, page: u32) -> Scripted {
        match self.script.get_mut(&page) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) if !queue.is_empty() => queue[0].clone(),
            _ => Scripted::blank("404 Not Found"),
        }
    }

    fn loaded(&self) -> RenderResult<&(String, Scripted)> {
        if self.log.is_closed() {
            return Err(RenderError::SessionLost("closed".to_string()));
        }
        self.current
            .as_ref()
            .ok_or_else(|| RenderError::Command("nothing loaded".to_string()))
    }
}

#[async_trait]
impl Renderer for ScriptedRenderer {
    async fn navigate(&mut self, url: &str) -> RenderResult<()> {
        if self.log.is_closed() {
            return Err(RenderError::SessionLost("closed".to_string()));
        }
        self.log.inner.lock().unwrap().navigations.push(url.to_string());

        let response = self.next_response(page_number(url).unwrap_or(1));
        match response {
            Scripted::NavigationError => Err(RenderError::Navigation {
                url: url.to_string(),
                message: "net::ERR_CONNECTION_RESET".to_string(),
            }),
            Scripted::SessionGone => Err(RenderError::SessionLost("chrome not reachable".into())),
            other => {
                self.current = Some((url.to_string(), other));
                Ok(())
            }
        }
    }

    async fn current_url(&mut self) -> RenderResult<String> {
        let (requested, response) = self.loaded()?;
        Ok(match response {
            Scripted::Page {
                served_as: Some(url),
                ..
            } => url.clone(),
            _ => requested.clone(),
        })
    }

    async fn title(&mut self) -> RenderResult<String> {
        let (_, response) = self.loaded()?;
        Ok(match response {
            Scripted::Page { title, .. } | Scripted::Blank { title } => title.clone(),
            _ => String::new(),
        })
    }

    async fn wait_for_selector(&mut self, selector: &str, _timeout: Duration) -> RenderResult<bool> {
        let (_, response) = self.loaded()?;
        Ok(match response {
            Scripted::Page { markup, .. } => PageSnapshot::parse(markup).contains(selector),
            _ => false,
        })
    }

    async fn raw_markup(&mut self) -> RenderResult<String> {
        let (_, response) = self.loaded()?;
        Ok(match response {
            Scripted::Page { markup, .. } => markup.clone(),
            _ => String::new(),
        })
    }

    async fn close(&mut self) -> RenderResult<()> {
        self.log.inner.lock().unwrap().closed = true;
        self.current = None;
        Ok(())
    }
}

/// Markup of one review card in the current site layout
pub fn review_card(stars: u8, text: &str) -> String {
    format!(
        r#"<article>
            <div data-service-review-rating="{stars}"><img alt="Rated {stars} out of 5 stars"></div>
            <h2 data-service-review-title-typography="true">Review title</h2>
            <p data-service-review-text-typography="true">{text}</p>
            <span data-consumer-name-typography="true">Jane Doe</span>
            <time datetime="2024-03-01T10:00:00.000Z">Mar 1, 2024</time>
        </article>"#
    )
}

/// A listing page made of the given cards
pub fn listing_with(cards: &[String]) -> String {
    format!(
        "<html><head><title>Acme Reviews</title></head><body><main>{}</main></body></html>",
        cards.concat()
    )
}

/// A listing page with `count` five-star reviews
pub fn listing_page(count: usize) -> String {
    let cards: Vec<String> = (0..count)
        .map(|i| review_card(5, &format!("Review number {}", i + 1)))
        .collect();
    listing_with(&cards)
}
