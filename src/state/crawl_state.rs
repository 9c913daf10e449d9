/// Mutable bookkeeping of a single crawl run
///
/// Created when the run starts, advanced once per loop iteration, and dropped when the
/// run ends. Nothing outside the controller mutates it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlState {
    /// The page number the current iteration works on; starts at 1, +1 per iteration
    pub page: u32,

    /// Failed page loads in a row
    pub consecutive_failures: u32,

    /// Loaded pages in a row that produced no parseable record
    pub consecutive_empty_pages: u32,

    /// Highest page number shown by the pagination controls
    pub highest_pagination_page_seen: u32,

    /// Total review count the site claims, when it could be read
    pub claimed_total_reviews: Option<u32>,

    /// ceil(claimed total / reviews per page), when determinable
    pub estimated_total_pages: Option<u32>,

    /// Pages actually loaded (successfully or not)
    pub pages_visited: u32,

    /// Reviews retained so far
    pub records: usize,
}

impl CrawlState {
    /// Creates the state for a fresh run, positioned at page 1
    pub fn new() -> Self {
        Self {
            page: 1,
            consecutive_failures: 0,
            consecutive_empty_pages: 0,
            highest_pagination_page_seen: 1,
            claimed_total_reviews: None,
            estimated_total_pages: None,
            pages_visited: 0,
            records: 0,
        }
    }

    /// Moves on to the next page number
    pub fn advance(&mut self) {
        self.page += 1;
    }

    /// Records a failed page load and returns the new failure streak
    pub fn record_failure(&mut self) -> u32 {
        self.consecutive_failures += 1;
        self.consecutive_failures
    }

    /// Records a successful page load
    pub fn record_success(&mut self) {
        self.consecutive_failures = 0;
    }

    /// Records whether a loaded page yielded any record and returns the empty streak
    pub fn record_page_yield(&mut self, yielded: bool) -> u32 {
        if yielded {
            self.consecutive_empty_pages = 0;
        } else {
            self.consecutive_empty_pages += 1;
        }
        self.consecutive_empty_pages
    }

    /// Returns true if the optional page cap forbids visiting the current page
    pub fn beyond_cap(&self, max_pages: Option<u32>) -> bool {
        max_pages.map_or(false, |cap| self.page > cap)
    }
}

impl Default for CrawlState {
    fn default() -> Self {
        Self::new()
    }
}
