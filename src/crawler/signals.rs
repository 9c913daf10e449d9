//! Page-level signals read from a snapshot
//!
//! These look at the page as a whole rather than at individual review elements: the
//! explicit "no results" message, the total review count the site claims, and the
//! highest page number its pagination controls offer.

use crate::render::{attribute, text, PageSnapshot};
use regex::Regex;
use scraper::{ElementRef, Node};
use std::sync::OnceLock;

/// Elements whose presence means the listing has nothing more to show
const NO_RESULTS_SELECTORS: &[&str] = &["div.noResultsContainer", "[data-no-reviews]"];

/// Phrases the site uses for an exhausted or empty listing
const NO_RESULTS_PHRASES: &[&str] = &["no reviews matching", "no reviews found"];

/// Elements whose text may carry a "no results" phrase
const NO_RESULTS_TEXT_ELEMENTS: &[&str] = &["p", "h1", "h2", "h3", "h4", "h5", "h6", "div"];

/// Elements whose text may state the claimed review total
const REVIEW_COUNT_TEXT_SELECTORS: &[&str] = &[
    "span[data-reviews-count-typography]",
    ".typography_body-l",
    ".typography_heading-s",
];

const REVIEW_COUNT_ATTRIBUTE: &str = "data-service-review-count";

const PAGINATION_SELECTORS: &[&str] = &[
    "nav[aria-label='Pagination'] a",
    "nav[aria-label='Pagination'] button",
    "[data-pagination-button-page]",
];

fn number_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"\d[\d,]*").ok())
        .as_ref()
}

/// Returns the first number in `text`, with thousands separators removed
///
/// # Examples
///
/// ```
/// use review_harvest::crawler::first_number;
///
/// assert_eq!(first_number("Based on 1,234 reviews"), Some(1234));
/// assert_eq!(first_number("no digits"), None);
/// ```
pub fn first_number(text: &str) -> Option<u32> {
    let found = number_pattern()?.find(text)?;
    found.as_str().replace(',', "").parse().ok()
}

/// Returns true if `element` sits inside a review article
fn inside_article(element: ElementRef<'_>) -> bool {
    element.ancestors().any(|node| {
        node.value()
            .as_element()
            .map_or(false, |e| e.name() == "article")
    })
}

/// Returns true if the page carries an explicit "no reviews" message
///
/// Text inside review articles is ignored, so a review that happens to quote the phrase
/// does not end the crawl.
pub fn has_no_results_marker(snapshot: &PageSnapshot) -> bool {
    if NO_RESULTS_SELECTORS
        .iter()
        .any(|selector| snapshot.contains(selector))
    {
        return true;
    }

    let Some(body) = snapshot.find_all("body").into_iter().next() else {
        return false;
    };

    body.descendants().any(|node| {
        let Node::Text(chunk) = node.value() else {
            return false;
        };
        let Some(parent) = node.parent().and_then(ElementRef::wrap) else {
            return false;
        };
        if !NO_RESULTS_TEXT_ELEMENTS.contains(&parent.value().name()) || inside_article(parent)
        {
            return false;
        }

        let lowered = chunk.to_lowercase();
        NO_RESULTS_PHRASES.iter().any(|phrase| lowered.contains(phrase))
    })
}

/// Reads the total review count the site claims for the listing
pub fn claimed_review_count(snapshot: &PageSnapshot) -> Option<u32> {
    let from_text = REVIEW_COUNT_TEXT_SELECTORS
        .iter()
        .flat_map(|selector| snapshot.find_all(selector))
        .filter(|element| !inside_article(*element))
        .map(text)
        .filter(|content| content.to_lowercase().contains("review"))
        .find_map(|content| first_number(&content));

    if from_text.is_some() {
        return from_text;
    }

    snapshot
        .find_all(&format!("[{}]", REVIEW_COUNT_ATTRIBUTE))
        .into_iter()
        .filter_map(|element| attribute(element, REVIEW_COUNT_ATTRIBUTE))
        .find_map(|value| value.trim().parse().ok())
}

/// Returns the highest page number offered by the pagination controls
pub fn highest_pagination_page(snapshot: &PageSnapshot) -> Option<u32> {
    PAGINATION_SELECTORS
        .iter()
        .flat_map(|selector| snapshot.find_all(selector))
        .filter_map(|element| {
            attribute(element, "data-pagination-button-page")
                .and_then(|value| value.trim().parse::<u32>().ok())
                .or_else(|| text(element).trim().parse::<u32>().ok())
        })
        .max()
}

/// Number of pages needed to show `total` reviews at `per_page` per page
pub fn estimate_pages(total: u32, per_page: u32) -> Option<u32> {
    if per_page == 0 {
        return None;
    }
    Some(total / per_page + u32::from(total % per_page != 0))
}

/// What page 1 says about the size of the listing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListingEstimate {
    pub claimed_total_reviews: Option<u32>,
    pub highest_pagination_page: Option<u32>,
    pub estimated_total_pages: Option<u32>,
}

/// Reads the listing size signals from the first page
///
/// Without a claimed total the estimate falls back to the pagination controls, and the
/// total is taken to be that many full pages.
pub fn estimate_listing(snapshot: &PageSnapshot, per_page: u32) -> ListingEstimate {
    let claimed = claimed_review_count(snapshot);
    let highest = highest_pagination_page(snapshot);

    match (claimed, highest) {
        (Some(total), _) => ListingEstimate {
            claimed_total_reviews: Some(total),
            highest_pagination_page: highest,
            estimated_total_pages: estimate_pages(total, per_page),
        },
        (None, Some(pages)) => ListingEstimate {
            claimed_total_reviews: Some(pages.saturating_mul(per_page)),
            highest_pagination_page: Some(pages),
            estimated_total_pages: Some(pages),
        },
        (None, None) => ListingEstimate::default(),
    }
}
