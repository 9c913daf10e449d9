//! Review record model
//!
//! A [`Review`] is produced once by the extractor and never modified afterwards. The
//! nested `reviewer`/`date`/`metadata` layout is the layout of the structured output.

mod field;
mod review;

pub use field::{FieldFailure, MissReason, ReviewField};
pub use review::{Review, ReviewDates, ReviewMetadata, Reviewer};
