//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlState`: the run-wide counters the controller advances every iteration
//! - `PageStats`: extraction tallies for a single listing page

mod crawl_state;
mod page_stats;

// Re-export main types
pub use crawl_state::CrawlState;
pub use page_stats::PageStats;
