use super::traits::{OutputFormat, OutputResult, ResultSink};
use crate::model::Review;
use serde::Serialize;
use std::io::Write;

/// Version tag written into every structured document
pub const DOCUMENT_VERSION: &str = "2.0";

#[derive(Serialize)]
struct Document<'a> {
    metadata: DocumentMetadata,
    reviews: &'a [Review],
}

#[derive(Serialize)]
struct DocumentMetadata {
    total_reviews: usize,
    extracted_date: String,
    version: &'static str,
}

/// Writes reviews as one pretty-printed JSON document
#[derive(Debug, Clone, Default)]
pub struct JsonSink;

impl ResultSink for JsonSink {
    fn format(&self) -> OutputFormat {
        OutputFormat::Json
    }

    fn write(&self, reviews: &[Review], out: &mut dyn Write) -> OutputResult<()> {
        let document = Document {
            metadata: DocumentMetadata {
                total_reviews: reviews.len(),
                extracted_date: chrono::Local::now()
                    .format("%Y-%m-%dT%H:%M:%S")
                    .to_string(),
                version: DOCUMENT_VERSION,
            },
            reviews,
        };

        serde_json::to_writer_pretty(&mut *out, &document)?;
        writeln!(out)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ReviewDates, ReviewMetadata, Reviewer};

    fn review() -> Review {
        Review {
            stars: Some(5),
            title: "Great".to_string(),
            text: "Would buy again".to_string(),
            company_response: None,
            reviewer: Reviewer {
                name: "Jane".to_string(),
                location: Some("GB".to_string()),
                reviews_count: None,
            },
            date: ReviewDates {
                published: "2024-03-01T10:00:00.000Z".to_string(),
                experience: None,
            },
            metadata: ReviewMetadata {
                verified: true,
                useful_votes: 2,
                page_number: 1,
                source_url: "https://reviews.test/review/acme".to_string(),
                ..ReviewMetadata::default()
            },
        }
    }

    #[test]
    fn test_document_layout() {
        let mut out = Vec::new();
        JsonSink.write(&[review(), review()], &mut out).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["metadata"]["total_reviews"], 2);
        assert_eq!(value["metadata"]["version"], "2.0");

        let date = value["metadata"]["extracted_date"].as_str().unwrap();
        assert!(chrono::NaiveDateTime::parse_from_str(date, "%Y-%m-%dT%H:%M:%S").is_ok());

        let first = &value["reviews"][0];
        assert_eq!(first["stars"], 5);
        assert_eq!(first["reviewer"]["name"], "Jane");
        assert!(first["reviewer"]["reviews_count"].is_null());
        assert!(first["company_response"].is_null());
        assert_eq!(first["date"]["published"], "2024-03-01T10:00:00.000Z");
        assert_eq!(first["metadata"]["verified"], true);
        assert_eq!(first["metadata"]["page_number"], 1);
    }

    #[test]
    fn test_output_is_indented() {
        let mut out = Vec::new();
        JsonSink.write(&[review()], &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("\n  \"metadata\""));
        assert!(text.ends_with("}\n"));
    }

    #[test]
    fn test_empty_result_set() {
        let mut out = Vec::new();
        JsonSink.write(&[], &mut out).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["metadata"]["total_reviews"], 0);
        assert_eq!(value["reviews"], serde_json::json!([]));
    }
}
