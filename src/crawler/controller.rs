//! The crawl loop
//!
//! One iteration per listing page: load it, ask the oracle whether the page may be
//! extracted, extract it, then ask the oracle whether to go on. Signals known before
//! extraction (hard stop, redirect, "no results") discard the page; signals that depend
//! on the element count stop the crawl only after the page has been committed. A session
//! that dies mid-run ends the crawl with whatever was committed before it.

use super::extractor::RecordExtractor;
use super::navigator::{PageLoadResult, PageNavigator};
use super::oracle::{PageSignals, StopReason, TerminationOracle, Verdict};
use super::report::CrawlReport;
use super::signals::{estimate_listing, has_no_results_marker, highest_pagination_page};
use crate::config::Config;
use crate::model::Review;
use crate::render::{PageSnapshot, Renderer};
use crate::state::{CrawlState, PageStats};
use crate::url::page_url;
use std::time::Instant;
use url::Url;

/// What has been committed so far
#[derive(Debug, Default)]
struct Harvest {
    reviews: Vec<Review>,
    pages: Vec<PageStats>,
}

/// Drives one crawl over one rendering session
///
/// The controller owns the session for the whole run and closes it when the run ends,
/// whichever way it ends.
pub struct CrawlController<R: Renderer> {
    config: Config,
    renderer: R,
    navigator: PageNavigator,
    oracle: TerminationOracle,
    extractor: RecordExtractor,
}

impl<R: Renderer> CrawlController<R> {
    pub fn new(config: Config, renderer: R) -> Self {
        Self {
            navigator: PageNavigator::new(&config),
            oracle: TerminationOracle::new(&config.crawler),
            extractor: RecordExtractor::new(config.filter.clone()),
            config,
            renderer,
        }
    }

    /// Crawls the listing at `base_url` until a stop signal fires
    ///
    /// Every way the crawl can end, a lost session included, is reported through
    /// [`CrawlReport::stop_reason`].
    pub async fn run(mut self, base_url: &Url) -> CrawlReport {
        let report = self.crawl(base_url).await;

        if let Err(e) = self.renderer.close().await {
            tracing::warn!("Failed to close rendering session: {}", e);
        }

        tracing::info!(
            "Crawl finished after {} pages in {:.1}s: {}",
            report.pages_visited,
            report.elapsed.as_secs_f64(),
            report.stop_reason
        );
        report
    }

    async fn crawl(&mut self, base_url: &Url) -> CrawlReport {
        let started = Instant::now();
        let mut state = CrawlState::new();
        let mut harvest = Harvest::default();

        tracing::info!("Starting crawl of {}", base_url);

        let stop_reason = loop {
            if state.beyond_cap(self.config.crawler.max_pages) {
                let cap = self.config.crawler.max_pages.unwrap_or(state.page - 1);
                break StopReason::MaxPagesReached { cap };
            }

            let url = page_url(base_url, state.page);
            tracing::info!("Processing page {}", state.page);

            let load = match self
                .navigator
                .load(&mut self.renderer, &url, state.page)
                .await
            {
                Ok(load) => load,
                Err(e) => {
                    tracing::error!("Session lost on page {}: {}", state.page, e);
                    break StopReason::SessionLost {
                        message: e.to_string(),
                    };
                }
            };
            state.pages_visited += 1;

            if let Verdict::Stop(reason) = self.process_load(&mut state, &load, &mut harvest) {
                break reason;
            }

            state.advance();
            tokio::time::sleep(self.config.crawler.page_delay()).await;
        };

        CrawlReport {
            reviews: harvest.reviews,
            pages: harvest.pages,
            stop_reason,
            pages_visited: state.pages_visited,
            last_page: state.page,
            claimed_total_reviews: state.claimed_total_reviews,
            estimated_total_pages: state.estimated_total_pages,
            highest_pagination_page_seen: state.highest_pagination_page_seen,
            reviews_per_page: self.config.crawler.reviews_per_page,
            elapsed: started.elapsed(),
        }
    }

    /// Applies one page load to the crawl state and returns the oracle's verdict
    fn process_load(
        &self,
        state: &mut CrawlState,
        load: &PageLoadResult,
        harvest: &mut Harvest,
    ) -> Verdict {
        let page = state.page;

        if load.is_hard_stop {
            return self.oracle.evaluate(&PageSignals {
                page_number: page,
                hard_stop: true,
                ..PageSignals::default()
            });
        }

        if !load.succeeded {
            let streak = state.record_failure();
            tracing::warn!(
                "Page {} failed to load after {} attempts ({} in a row)",
                page,
                load.attempts,
                streak
            );
            return self.oracle.evaluate(&PageSignals {
                page_number: page,
                consecutive_failures: streak,
                consecutive_empty_pages: state.consecutive_empty_pages,
                ..PageSignals::default()
            });
        }

        state.record_success();
        let snapshot = PageSnapshot::parse(load.markup.as_deref().unwrap_or_default());

        let mut signals = PageSignals {
            page_number: page,
            load_succeeded: true,
            redirected_to: load.redirected_to_page,
            no_results_marker: has_no_results_marker(&snapshot),
            consecutive_empty_pages: state.consecutive_empty_pages,
            ..PageSignals::default()
        };
        let verdict = self.oracle.evaluate(&signals);
        if verdict.is_terminal() {
            return verdict;
        }

        if let Some(highest) = highest_pagination_page(&snapshot) {
            state.highest_pagination_page_seen = state.highest_pagination_page_seen.max(highest);
        }
        if page == 1 {
            self.estimate(state, &snapshot);
        }

        let extraction = self
            .extractor
            .extract_page(&snapshot, page, load.source_url());
        let stats = extraction.stats;

        tracing::info!(
            "Page {}: {} elements, {} extracted, {} filtered, {} errors",
            page,
            stats.raw_element_count,
            stats.extracted,
            stats.filtered,
            stats.errors
        );
        if !stats.is_consistent() {
            tracing::warn!("Page {} statistics do not add up: {:?}", page, stats);
        }

        let empty = stats.raw_element_count > 0 && stats.yielded_nothing();
        signals.element_count = Some(stats.raw_element_count);
        signals.consecutive_empty_pages = state.record_page_yield(!empty);

        state.records += extraction.reviews.len();
        harvest.reviews.extend(extraction.reviews);
        harvest.pages.push(stats);

        self.oracle.evaluate(&signals)
    }

    fn estimate(&self, state: &mut CrawlState, snapshot: &PageSnapshot) {
        let estimate = estimate_listing(snapshot, self.config.crawler.reviews_per_page);
        state.claimed_total_reviews = estimate.claimed_total_reviews;
        state.estimated_total_pages = estimate.estimated_total_pages;

        match (estimate.claimed_total_reviews, estimate.estimated_total_pages) {
            (Some(total), Some(pages)) => {
                tracing::info!("Listing has about {} reviews over {} pages", total, pages)
            }
            _ => tracing::info!("Could not estimate the size of the listing"),
        }
    }
}
