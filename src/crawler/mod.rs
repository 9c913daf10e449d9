//! Crawler module for walking a paginated review listing
//!
//! This module contains the core crawling logic, including:
//! - Page loading with retries and hard-stop detection
//! - Termination decisions from page signals
//! - Review record extraction with per-field fallbacks
//! - The crawl loop that ties them together

mod controller;
mod extractor;
mod navigator;
mod oracle;
mod report;
mod signals;

#[cfg(test)]
mod testing;

pub use controller::CrawlController;
pub use extractor::{
    split_company_reply, CompanyReply, ElementError, ElementExtraction, PageExtraction,
    RecordExtractor, ELEMENT_SELECTORS,
};
pub use navigator::{PageLoadResult, PageNavigator};
pub use oracle::{PageSignals, StopReason, TerminationOracle, Verdict};
pub use report::CrawlReport;
pub use signals::{
    claimed_review_count, estimate_listing, estimate_pages, first_number,
    has_no_results_marker, highest_pagination_page, ListingEstimate,
};

use crate::config::Config;
use crate::render::Renderer;
use url::Url;

/// Runs a complete crawl of the listing at `base_url`
///
/// This is the main entry point for a crawl. It will:
/// 1. Walk the listing page by page through `renderer`
/// 2. Extract and filter the reviews on every page
/// 3. Stop as soon as any termination signal fires or the session is lost
/// 4. Close the rendering session
///
/// The report always carries what was committed before the crawl stopped.
pub async fn crawl<R: Renderer>(config: Config, renderer: R, base_url: &Url) -> CrawlReport {
    CrawlController::new(config, renderer).run(base_url).await
}
