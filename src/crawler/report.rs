use super::oracle::StopReason;
use crate::model::Review;
use crate::state::PageStats;
use std::time::Duration;

/// What a finished crawl produced and why it ended
#[derive(Debug, Clone)]
pub struct CrawlReport {
    /// Retained reviews, in page order then element order
    pub reviews: Vec<Review>,

    /// Statistics of every page whose extraction was committed, in page order
    pub pages: Vec<PageStats>,

    pub stop_reason: StopReason,

    /// Page loads performed, including failed ones
    pub pages_visited: u32,

    /// The last page number the crawl worked on
    pub last_page: u32,

    pub claimed_total_reviews: Option<u32>,

    pub estimated_total_pages: Option<u32>,

    pub highest_pagination_page_seen: u32,

    pub reviews_per_page: u32,

    pub elapsed: Duration,
}

impl CrawlReport {
    pub fn total_reviews(&self) -> usize {
        self.reviews.len()
    }

    pub fn total_raw_elements(&self) -> usize {
        self.pages.iter().map(|page| page.raw_element_count).sum()
    }

    pub fn total_filtered(&self) -> usize {
        self.pages.iter().map(|page| page.filtered).sum()
    }

    pub fn total_errors(&self) -> usize {
        self.pages.iter().map(|page| page.errors).sum()
    }

    /// Pages that had elements but produced no retained review
    pub fn unproductive_pages(&self) -> Vec<u32> {
        self.pages
            .iter()
            .filter(|page| page.raw_element_count > 0 && page.extracted == 0)
            .map(|page| page.page_number)
            .collect()
    }

    /// Reviews the estimate says the listing holds
    pub fn estimated_reviews(&self) -> Option<u64> {
        self.estimated_total_pages
            .map(|pages| u64::from(pages) * u64::from(self.reviews_per_page))
    }

    /// Retained reviews as a percentage of the total the site claims
    pub fn claimed_percentage(&self) -> Option<f64> {
        match self.claimed_total_reviews {
            Some(total) if total > 0 => {
                Some(self.total_reviews() as f64 / f64::from(total) * 100.0)
            }
            _ => None,
        }
    }

    /// Retained reviews as a percentage of the estimated review count
    pub fn coverage(&self) -> Option<f64> {
        match self.estimated_reviews() {
            Some(estimated) if estimated > 0 => {
                Some(self.total_reviews() as f64 / estimated as f64 * 100.0)
            }
            _ => None,
        }
    }
}
