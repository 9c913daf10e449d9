//! Static page snapshots
//!
//! Extraction never talks to the live session. Once a page has loaded, its markup is
//! captured and parsed into a [`PageSnapshot`], and every element query runs against that
//! immutable document, which keeps extraction deterministic and testable offline.

use scraper::{ElementRef, Html, Selector};

/// Parsed markup of one loaded page
pub struct PageSnapshot {
    document: Html,
}

impl PageSnapshot {
    /// Parses raw page markup into a snapshot
    pub fn parse(markup: &str) -> Self {
        Self {
            document: Html::parse_document(markup),
        }
    }

    /// Returns every element matching `selector`, in document order
    ///
    /// An unparseable selector matches nothing.
    pub fn find_all(&self, selector: &str) -> Vec<ElementRef<'_>> {
        match Selector::parse(selector) {
            Ok(selector) => self.document.select(&selector).collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Returns true if at least one element matches `selector`
    pub fn contains(&self, selector: &str) -> bool {
        match Selector::parse(selector) {
            Ok(selector) => self.document.select(&selector).next().is_some(),
            Err(_) => false,
        }
    }

    /// Tries `selectors` in order and returns the matches of the first one that finds
    /// anything
    pub fn find_first_matching(&self, selectors: &[&str]) -> Vec<ElementRef<'_>> {
        selectors
            .iter()
            .map(|selector| self.find_all(selector))
            .find(|found| !found.is_empty())
            .unwrap_or_default()
    }

    /// Returns the trimmed `<title>` text, if the page has one
    pub fn title(&self) -> Option<String> {
        self.find_all("title")
            .first()
            .map(|element| text(*element))
            .filter(|title| !title.is_empty())
    }
}

/// Returns the first descendant of `element` matching `selector`
pub fn find_one<'a>(element: ElementRef<'a>, selector: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(selector).ok()?;
    element.select(&selector).next()
}

/// Returns every descendant of `element` matching `selector`
pub fn find_all_in<'a>(element: ElementRef<'a>, selector: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(selector) {
        Ok(selector) => element.select(&selector).collect(),
        Err(_) => Vec::new(),
    }
}

/// Returns the value of attribute `name` on `element`
pub fn attribute<'a>(element: ElementRef<'a>, name: &str) -> Option<&'a str> {
    element.value().attr(name)
}

/// Returns the element's text with runs of whitespace collapsed to single spaces
///
/// Text nodes are joined as they are, so inline markup inside a word keeps it whole.
pub fn text(element: ElementRef<'_>) -> String {
    let content: String = element.text().collect();
    content.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Returns the element's text nodes as trimmed, non-empty lines
pub fn text_lines(element: ElementRef<'_>) -> Vec<String> {
    element
        .text()
        .map(|chunk| chunk.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect()
}
