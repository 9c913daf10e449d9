use super::traits::{OutputFormat, OutputResult, ResultSink};
use crate::model::Review;
use serde::Serialize;
use std::io::Write;

/// Column order of the tabular encoding
pub const CSV_COLUMNS: [&str; 12] = [
    "stars",
    "title",
    "text",
    "company_response",
    "reviewer_name",
    "reviewer_location",
    "reviewer_reviews_count",
    "date_published",
    "date_experience",
    "verified",
    "useful_votes",
    "page_number",
];

/// One review flattened into a row; field order matches [`CSV_COLUMNS`]
#[derive(Serialize)]
struct FlatReview<'a> {
    stars: Option<u8>,
    title: &'a str,
    text: &'a str,
    company_response: Option<&'a str>,
    reviewer_name: &'a str,
    reviewer_location: Option<&'a str>,
    reviewer_reviews_count: Option<u32>,
    date_published: &'a str,
    date_experience: Option<&'a str>,
    verified: bool,
    useful_votes: u32,
    page_number: u32,
}

impl<'a> From<&'a Review> for FlatReview<'a> {
    fn from(review: &'a Review) -> Self {
        Self {
            stars: review.stars,
            title: &review.title,
            text: &review.text,
            company_response: review.company_response.as_deref(),
            reviewer_name: &review.reviewer.name,
            reviewer_location: review.reviewer.location.as_deref(),
            reviewer_reviews_count: review.reviewer.reviews_count,
            date_published: &review.date.published,
            date_experience: review.date.experience.as_deref(),
            verified: review.metadata.verified,
            useful_votes: review.metadata.useful_votes,
            page_number: review.metadata.page_number,
        }
    }
}

/// Writes reviews as CSV with a header row
#[derive(Debug, Clone, Default)]
pub struct CsvSink;

impl ResultSink for CsvSink {
    fn format(&self) -> OutputFormat {
        OutputFormat::Csv
    }

    fn write(&self, reviews: &[Review], out: &mut dyn Write) -> OutputResult<()> {
        // header written by hand so an empty result set still gets one
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(out);

        writer.write_record(CSV_COLUMNS)?;
        for review in reviews {
            writer.serialize(FlatReview::from(review))?;
        }
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ReviewDates, ReviewMetadata, Reviewer};

    fn review(stars: Option<u8>, text: &str) -> Review {
        Review {
            stars,
            title: "Title, with comma".to_string(),
            text: text.to_string(),
            company_response: None,
            reviewer: Reviewer {
                name: "Jane".to_string(),
                location: None,
                reviews_count: Some(4),
            },
            date: ReviewDates {
                published: "2024-03-01".to_string(),
                experience: Some("February 27, 2024".to_string()),
            },
            metadata: ReviewMetadata {
                verified: false,
                useful_votes: 0,
                page_number: 3,
                ..ReviewMetadata::default()
            },
        }
    }

    fn write(reviews: &[Review]) -> String {
        let mut out = Vec::new();
        CsvSink.write(reviews, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_header_and_rows() {
        let output = write(&[review(Some(4), "Fine"), review(None, "No rating")]);
        let mut lines = output.lines();

        assert_eq!(lines.next(), Some(CSV_COLUMNS.join(",").as_str()));
        assert_eq!(
            lines.next(),
            Some("4,\"Title, with comma\",Fine,,Jane,,4,2024-03-01,\"February 27, 2024\",false,0,3")
        );
        assert_eq!(
            lines.next(),
            Some(",\"Title, with comma\",No rating,,Jane,,4,2024-03-01,\"February 27, 2024\",false,0,3")
        );
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_empty_result_set_has_header() {
        assert_eq!(write(&[]), format!("{}\n", CSV_COLUMNS.join(",")));
    }

    #[test]
    fn test_rows_read_back() {
        let output = write(&[review(Some(1), "Line one\nline two")]);
        let mut reader = csv::Reader::from_reader(output.as_bytes());

        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.len(), CSV_COLUMNS.len());

        let row = reader.records().next().unwrap().unwrap();
        assert_eq!(&row[2], "Line one\nline two");
        assert_eq!(&row[9], "false");
    }
}
