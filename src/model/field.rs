use std::fmt;

/// The semantic fields extracted from a review element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ReviewField {
    Stars,
    Title,
    Text,
    CompanyResponse,
    ReviewerName,
    ReviewerLocation,
    ReviewerReviewsCount,
    DatePublished,
    DateExperience,
    Verified,
    UsefulVotes,
    Tags,
}

impl ReviewField {
    pub const ALL: [ReviewField; 12] = [
        Self::Stars,
        Self::Title,
        Self::Text,
        Self::CompanyResponse,
        Self::ReviewerName,
        Self::ReviewerLocation,
        Self::ReviewerReviewsCount,
        Self::DatePublished,
        Self::DateExperience,
        Self::Verified,
        Self::UsefulVotes,
        Self::Tags,
    ];

    /// Returns the column-style name of the field
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stars => "stars",
            Self::Title => "title",
            Self::Text => "text",
            Self::CompanyResponse => "company_response",
            Self::ReviewerName => "reviewer_name",
            Self::ReviewerLocation => "reviewer_location",
            Self::ReviewerReviewsCount => "reviewer_reviews_count",
            Self::DatePublished => "date_published",
            Self::DateExperience => "date_experience",
            Self::Verified => "verified",
            Self::UsefulVotes => "useful_votes",
            Self::Tags => "tags",
        }
    }
}

impl fmt::Display for ReviewField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Why a field fell back to its default
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MissReason {
    /// No strategy found anything for the field
    Missing,
    /// Something was found but could not be turned into a value
    Malformed,
}

/// A field that could not be extracted from one element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldFailure {
    pub field: ReviewField,
    pub reason: MissReason,
}

impl FieldFailure {
    pub fn missing(field: ReviewField) -> Self {
        Self {
            field,
            reason: MissReason::Missing,
        }
    }

    pub fn malformed(field: ReviewField) -> Self {
        Self {
            field,
            reason: MissReason::Malformed,
        }
    }
}
