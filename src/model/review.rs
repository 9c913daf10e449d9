use serde::{Deserialize, Serialize};

/// One customer review harvested from a listing page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    /// Star rating, 1 to 5
    pub stars: Option<u8>,

    pub title: String,

    pub text: String,

    /// The business's public reply, without its "Reply from" header
    pub company_response: Option<String>,

    pub reviewer: Reviewer,

    pub date: ReviewDates,

    pub metadata: ReviewMetadata,
}

/// Who wrote the review
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reviewer {
    pub name: String,

    pub location: Option<String>,

    /// How many reviews this reviewer has written on the site
    pub reviews_count: Option<u32>,
}

/// When the review was published and when the experience happened
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewDates {
    /// Publication timestamp as the site exposes it (usually ISO-8601)
    pub published: String,

    /// Free-form "date of experience" text
    pub experience: Option<String>,
}

/// Bookkeeping attached to every review
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewMetadata {
    pub verified: bool,

    pub useful_votes: u32,

    /// Listing page the review was found on
    pub page_number: u32,

    /// Resolved URL of that page
    pub source_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_reply_name: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl Review {
    /// Returns true if the review carries either text or a rating
    pub fn has_substance(&self) -> bool {
        !self.text.is_empty() || self.stars.is_some()
    }
}
