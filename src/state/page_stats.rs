//! Per-page extraction statistics
//!
//! Every discovered element ends up in exactly one of the extracted, filtered or
//! errors buckets, so their sum never exceeds the raw element count.

use crate::model::{FieldFailure, ReviewField};
use std::collections::BTreeMap;

/// Extraction tallies for one listing page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageStats {
    /// The listing page these numbers belong to
    pub page_number: u32,

    /// Review elements discovered on the page
    pub raw_element_count: usize,

    /// Elements turned into retained reviews
    pub extracted: usize,

    /// Elements rejected by the retention rule
    pub filtered: usize,

    /// The part of `filtered` that never amounted to a review: blank or unrecognized
    /// elements, and records with neither text nor rating
    pub unusable: usize,

    /// Elements whose extraction failed outright
    pub errors: usize,

    /// Fields that fell back to their default, by field
    pub field_misses: BTreeMap<ReviewField, usize>,
}

impl PageStats {
    /// Creates empty statistics for a page with `raw_element_count` elements
    pub fn new(page_number: u32, raw_element_count: usize) -> Self {
        Self {
            page_number,
            raw_element_count,
            ..Self::default()
        }
    }

    pub fn record_extracted(&mut self) {
        self.extracted += 1;
    }

    pub fn record_filtered(&mut self) {
        self.filtered += 1;
    }

    /// Counts a rejected element that carried no usable review at all
    pub fn record_unusable(&mut self) {
        self.filtered += 1;
        self.unusable += 1;
    }

    pub fn record_error(&mut self) {
        self.errors += 1;
    }

    /// Tallies the fields of one element that fell back to their default
    pub fn record_field_failures(&mut self, failures: &[FieldFailure]) {
        for failure in failures {
            *self.field_misses.entry(failure.field).or_insert(0) += 1;
        }
    }

    /// Returns true if the bucket counts fit within the raw element count
    pub fn is_consistent(&self) -> bool {
        self.extracted + self.filtered + self.errors <= self.raw_element_count
    }

    /// Returns true if no element on the page amounted to a review
    ///
    /// Reviews rejected only by the star filter still count as usable.
    pub fn yielded_nothing(&self) -> bool {
        self.extracted == 0 && self.filtered == self.unusable
    }

    /// Returns extracted / raw as a percentage
    pub fn extraction_rate(&self) -> f64 {
        if self.raw_element_count == 0 {
            return 0.0;
        }
        (self.extracted as f64 / self.raw_element_count as f64) * 100.0
    }
}
