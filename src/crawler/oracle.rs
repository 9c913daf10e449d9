//! Termination decisions
//!
//! The oracle is a pure function from the signals observed on one page to a
//! stop/continue verdict. Signals are disjunctive: any single one that fires ends the
//! crawl. The ambiguous ones (a short page, a page with nothing usable) only fire once
//! they cross a configured threshold.

use crate::config::CrawlerConfig;
use std::fmt;

/// Why the crawl stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// The configured page cap was reached
    MaxPagesReached { cap: u32 },

    /// The page was an error or blocked page
    HardStop,

    /// The site resolved the request to a different page number
    Redirected { requested: u32, resolved: u32 },

    /// A successfully loaded page had no review elements
    NoElements,

    /// The page shows an explicit "no reviews" message
    NoResultsMarker,

    /// Too many page loads failed in a row
    TooManyFailures { streak: u32 },

    /// Too many loaded pages in a row produced no parseable record
    TooManyEmptyPages { streak: u32 },

    /// A page past the first had fewer elements than a full page would
    ProbableLastPage { elements: usize },

    /// The rendering session died mid-run; what was committed before it is kept
    SessionLost { message: String },
}

impl StopReason {
    /// Returns true if the page that triggered this stop had its records kept
    pub fn commits_page(&self) -> bool {
        matches!(
            self,
            Self::NoElements | Self::TooManyEmptyPages { .. } | Self::ProbableLastPage { .. }
        )
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MaxPagesReached { cap } => write!(f, "reached maximum page limit ({})", cap),
            Self::HardStop => write!(f, "reached an error or blocked page"),
            Self::Redirected {
                requested,
                resolved,
            } => write!(
                f,
                "requested page {} but was redirected to page {}",
                requested, resolved
            ),
            Self::NoElements => write!(f, "page had no review elements"),
            Self::NoResultsMarker => write!(f, "page reported that no reviews match"),
            Self::TooManyFailures { streak } => {
                write!(f, "{} consecutive page loads failed", streak)
            }
            Self::TooManyEmptyPages { streak } => {
                write!(f, "{} consecutive pages produced no records", streak)
            }
            Self::ProbableLastPage { elements } => {
                write!(f, "only {} reviews on the page, probably the last one", elements)
            }
            Self::SessionLost { message } => write!(f, "{}", message),
        }
    }
}

/// The oracle's answer for one evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Continue,
    Stop(StopReason),
}

impl Verdict {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Stop(_))
    }
}

/// Everything the oracle looks at for one page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageSignals {
    /// The page number that was requested
    pub page_number: u32,

    /// The page loaded and its content appeared
    pub load_succeeded: bool,

    /// The page is an error or blocked page
    pub hard_stop: bool,

    /// The page number the site actually served, when it differs from the request
    pub redirected_to: Option<u32>,

    /// The page carries an explicit "no results" message
    pub no_results_marker: bool,

    /// Review elements on the page; `None` until the elements have been counted
    pub element_count: Option<usize>,

    pub consecutive_failures: u32,

    pub consecutive_empty_pages: u32,
}

/// Combines page signals into a stop/continue verdict
#[derive(Debug, Clone)]
pub struct TerminationOracle {
    failure_ceiling: u32,
    empty_page_ceiling: u32,
    last_page_threshold: usize,
}

impl TerminationOracle {
    pub fn new(config: &CrawlerConfig) -> Self {
        Self {
            failure_ceiling: config.max_consecutive_failures,
            empty_page_ceiling: config.max_consecutive_empty_pages,
            last_page_threshold: config.last_page_threshold() as usize,
        }
    }

    /// Evaluates every signal; the first one that fires names the stop reason
    pub fn evaluate(&self, signals: &PageSignals) -> Verdict {
        match self.first_firing(signals) {
            Some(reason) => Verdict::Stop(reason),
            None => Verdict::Continue,
        }
    }

    fn first_firing(&self, signals: &PageSignals) -> Option<StopReason> {
        if signals.hard_stop {
            return Some(StopReason::HardStop);
        }

        if let Some(resolved) = signals.redirected_to {
            if resolved != signals.page_number {
                return Some(StopReason::Redirected {
                    requested: signals.page_number,
                    resolved,
                });
            }
        }

        if signals.load_succeeded && signals.element_count == Some(0) {
            return Some(StopReason::NoElements);
        }

        if signals.no_results_marker {
            return Some(StopReason::NoResultsMarker);
        }

        if signals.consecutive_failures >= self.failure_ceiling {
            return Some(StopReason::TooManyFailures {
                streak: signals.consecutive_failures,
            });
        }

        if signals.consecutive_empty_pages >= self.empty_page_ceiling {
            return Some(StopReason::TooManyEmptyPages {
                streak: signals.consecutive_empty_pages,
            });
        }

        match signals.element_count {
            Some(elements)
                if signals.load_succeeded
                    && signals.page_number > 1
                    && elements < self.last_page_threshold =>
            {
                Some(StopReason::ProbableLastPage { elements })
            }
            _ => None,
        }
    }
}
