//! Review record extraction
//!
//! Every field of a review is read through an ordered chain of strategies, one per
//! markup generation the site has used. The first strategy to produce a value wins; if
//! all of them fail the field keeps its default and the miss is recorded. A failing field
//! never affects the others, and a failing element never affects the rest of the page.
//! Elements that do not amount to a review are rejected and counted as filtered.

use super::signals::first_number;
use crate::config::FilterConfig;
use crate::model::{
    FieldFailure, MissReason, Review, ReviewDates, ReviewField, ReviewMetadata, Reviewer,
};
use crate::render::{attribute, find_all_in, find_one, text, text_lines, PageSnapshot};
use crate::state::PageStats;
use scraper::ElementRef;
use thiserror::Error;

/// Selectors that discover review elements; the first one that matches anything wins
pub const ELEMENT_SELECTORS: &[&str] = &["article", "div.styles_reviewCard__hcAvl", "div.review-card"];

/// Markup that carries a rating, used to tell placeholder cards apart from reviews
const RATING_MARKUP: &str =
    "[data-service-review-rating], div.star-rating, img[alt^='Rated'], img.star-rating__star";

/// One way of reading a field from a review element
type Strategy<T> = fn(ElementRef<'_>) -> Result<T, MissReason>;

/// Why an element could not be read as a review
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ElementError {
    #[error("element is blank")]
    Blank,

    #[error("element has no recognizable review field")]
    Unrecognized,
}

/// A parsed element before the retention rule is applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementExtraction {
    pub review: Review,
    pub failures: Vec<FieldFailure>,
}

/// Everything extracted from one page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageExtraction {
    /// Reviews that passed the retention rule, in page order
    pub reviews: Vec<Review>,
    pub stats: PageStats,
}

/// Runs `strategies` in order and returns the first value found
///
/// The miss is reported as malformed if any strategy found something it could not use.
fn first_match<T>(element: ElementRef<'_>, strategies: &[Strategy<T>]) -> Result<T, MissReason> {
    let mut reason = MissReason::Missing;
    for strategy in strategies {
        match strategy(element) {
            Ok(value) => return Ok(value),
            Err(MissReason::Malformed) => reason = MissReason::Malformed,
            Err(MissReason::Missing) => {}
        }
    }
    Err(reason)
}

fn text_at(element: ElementRef<'_>, selector: &str) -> Result<String, MissReason> {
    let found = find_one(element, selector).ok_or(MissReason::Missing)?;
    let content = text(found);
    if content.is_empty() {
        return Err(MissReason::Missing);
    }
    Ok(content)
}

fn attribute_at<'a>(
    element: ElementRef<'a>,
    selector: &str,
    name: &str,
) -> Result<&'a str, MissReason> {
    let found = find_one(element, selector).ok_or(MissReason::Missing)?;
    attribute(found, name)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or(MissReason::Missing)
}

fn number_at(element: ElementRef<'_>, selector: &str) -> Result<u32, MissReason> {
    let content = text_at(element, selector)?;
    first_number(&content).ok_or(MissReason::Malformed)
}

fn star_value(raw: &str) -> Result<u8, MissReason> {
    match first_number(raw) {
        Some(stars @ 1..=5) => Ok(stars as u8),
        _ => Err(MissReason::Malformed),
    }
}

// stars

fn stars_from_rating_attribute(element: ElementRef<'_>) -> Result<u8, MissReason> {
    let rating = attribute_at(
        element,
        "[data-service-review-rating]",
        "data-service-review-rating",
    )?;
    star_value(rating)
}

fn stars_from_star_rating_label(element: ElementRef<'_>) -> Result<u8, MissReason> {
    star_value(attribute_at(element, "div.star-rating", "aria-label")?)
}

fn stars_from_rated_image(element: ElementRef<'_>) -> Result<u8, MissReason> {
    star_value(attribute_at(element, "img[alt^='Rated']", "alt")?)
}

fn stars_from_filled_icons(element: ElementRef<'_>) -> Result<u8, MissReason> {
    let icons = find_all_in(element, "img.star-rating__star");
    if icons.is_empty() {
        return Err(MissReason::Missing);
    }
    let filled = icons
        .iter()
        .filter(|icon| attribute(**icon, "alt").map_or(false, |alt| alt.contains("filled")))
        .count();
    match filled {
        1..=5 => Ok(filled as u8),
        _ => Err(MissReason::Malformed),
    }
}

const STARS: &[Strategy<u8>] = &[
    stars_from_rating_attribute,
    stars_from_star_rating_label,
    stars_from_rated_image,
    stars_from_filled_icons,
];

// title

fn title_from_typography(element: ElementRef<'_>) -> Result<String, MissReason> {
    text_at(element, "h2[data-service-review-title-typography]")
}

fn title_from_review_content(element: ElementRef<'_>) -> Result<String, MissReason> {
    text_at(element, ".review-content__title")
}

fn title_from_heading_class(element: ElementRef<'_>) -> Result<String, MissReason> {
    text_at(element, ".typography_heading-s")
}

const TITLE: &[Strategy<String>] = &[
    title_from_typography,
    title_from_review_content,
    title_from_heading_class,
];

// text

fn text_from_typography(element: ElementRef<'_>) -> Result<String, MissReason> {
    text_at(element, "p[data-service-review-text-typography]")
}

fn text_from_review_content(element: ElementRef<'_>) -> Result<String, MissReason> {
    text_at(element, "p.review-content__text")
}

fn text_from_body_class(element: ElementRef<'_>) -> Result<String, MissReason> {
    text_at(element, ".typography_body-l")
}

const TEXT: &[Strategy<String>] = &[
    text_from_typography,
    text_from_review_content,
    text_from_body_class,
];

// company response

/// A business reply split into its author and body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanyReply {
    pub name: Option<String>,
    pub text: String,
}

/// Splits the "Reply from <name>" header off the lines of a business reply
pub fn split_company_reply(lines: Vec<String>) -> Option<CompanyReply> {
    let mut lines = lines.into_iter().peekable();
    let mut name = None;

    let header = lines
        .peek()
        .and_then(|first| first.strip_prefix("Reply from"))
        .map(|rest| rest.trim().trim_end_matches(':').trim().to_string());
    if let Some(rest) = header {
        lines.next();
        name = if rest.is_empty() { lines.next() } else { Some(rest) };
    }

    let body = lines.collect::<Vec<_>>().join(" ");
    if body.is_empty() {
        return None;
    }
    Some(CompanyReply { name, text: body })
}

fn reply_at(element: ElementRef<'_>, selector: &str) -> Result<CompanyReply, MissReason> {
    let found = find_one(element, selector).ok_or(MissReason::Missing)?;
    split_company_reply(text_lines(found)).ok_or(MissReason::Missing)
}

fn reply_from_business_response(element: ElementRef<'_>) -> Result<CompanyReply, MissReason> {
    reply_at(element, "div[data-service-review-business-response]")
}

fn reply_from_business_reply(element: ElementRef<'_>) -> Result<CompanyReply, MissReason> {
    reply_at(element, "div.review-business-reply")
}

const COMPANY_REPLY: &[Strategy<CompanyReply>] =
    &[reply_from_business_response, reply_from_business_reply];

// reviewer

fn name_from_typography(element: ElementRef<'_>) -> Result<String, MissReason> {
    text_at(element, "span[data-consumer-name-typography]")
}

fn name_from_heading_class(element: ElementRef<'_>) -> Result<String, MissReason> {
    text_at(element, "span.typography_heading-xxs")
}

fn name_from_consumer_information(element: ElementRef<'_>) -> Result<String, MissReason> {
    text_at(element, ".consumer-information__name")
}

const REVIEWER_NAME: &[Strategy<String>] = &[
    name_from_typography,
    name_from_heading_class,
    name_from_consumer_information,
];

fn location_from_typography(element: ElementRef<'_>) -> Result<String, MissReason> {
    text_at(element, "[data-consumer-country-typography]")
}

fn location_from_consumer_information(element: ElementRef<'_>) -> Result<String, MissReason> {
    text_at(element, ".consumer-information__location")
}

const REVIEWER_LOCATION: &[Strategy<String>] =
    &[location_from_typography, location_from_consumer_information];

fn count_from_typography(element: ElementRef<'_>) -> Result<u32, MissReason> {
    number_at(element, "[data-consumer-reviews-count-typography]")
}

fn count_from_consumer_information(element: ElementRef<'_>) -> Result<u32, MissReason> {
    number_at(element, ".consumer-information__review-count")
}

const REVIEWER_REVIEWS_COUNT: &[Strategy<u32>] =
    &[count_from_typography, count_from_consumer_information];

// dates

fn published_from_time(element: ElementRef<'_>) -> Result<String, MissReason> {
    attribute_at(element, "time[datetime]", "datetime").map(str::to_string)
}

fn published_from_time_ago(element: ElementRef<'_>) -> Result<String, MissReason> {
    let found =
        find_one(element, "[data-service-review-date-time-ago]").ok_or(MissReason::Missing)?;
    attribute(found, "datetime")
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .or_else(|| Some(text(found)).filter(|content| !content.is_empty()))
        .ok_or(MissReason::Missing)
}

const DATE_PUBLISHED: &[Strategy<String>] = &[published_from_time, published_from_time_ago];

/// Removes a leading "Date of experience:" label
fn strip_experience_label(content: &str) -> String {
    match content.find("Date of experience") {
        Some(index) => content[index + "Date of experience".len()..]
            .trim_start_matches(':')
            .trim()
            .to_string(),
        None => content.trim().to_string(),
    }
}

fn experience_from_typography(element: ElementRef<'_>) -> Result<String, MissReason> {
    let content = text_at(element, "[data-service-review-date-of-experience-typography]")?;
    let date = strip_experience_label(&content);
    if date.is_empty() {
        return Err(MissReason::Malformed);
    }
    Ok(date)
}

fn experience_from_header_dates(element: ElementRef<'_>) -> Result<String, MissReason> {
    let content = find_all_in(element, ".review-content-header__dates")
        .into_iter()
        .map(text)
        .find(|content| content.contains("Date of experience"))
        .ok_or(MissReason::Missing)?;
    let date = strip_experience_label(&content);
    if date.is_empty() {
        return Err(MissReason::Malformed);
    }
    Ok(date)
}

const DATE_EXPERIENCE: &[Strategy<String>] =
    &[experience_from_typography, experience_from_header_dates];

// metadata

fn verified_at(element: ElementRef<'_>, selector: &str) -> Result<bool, MissReason> {
    let found = find_one(element, selector).ok_or(MissReason::Missing)?;
    Ok(text(found).to_lowercase().contains("verified"))
}

fn verified_from_header(element: ElementRef<'_>) -> Result<bool, MissReason> {
    verified_at(element, ".review-content-header__verification")
}

fn verified_from_label(element: ElementRef<'_>) -> Result<bool, MissReason> {
    verified_at(element, "[data-review-label-tooltip-trigger-typography]")
}

const VERIFIED: &[Strategy<bool>] = &[verified_from_header, verified_from_label];

fn useful_from_count_attribute(element: ElementRef<'_>) -> Result<u32, MissReason> {
    number_at(element, "[data-service-review-useful-count]")
}

fn useful_from_count_class(element: ElementRef<'_>) -> Result<u32, MissReason> {
    number_at(element, ".useful-count")
}

const USEFUL_VOTES: &[Strategy<u32>] = &[useful_from_count_attribute, useful_from_count_class];

fn tags_from_review_tags(element: ElementRef<'_>) -> Result<Vec<String>, MissReason> {
    let tags: Vec<String> = find_all_in(element, ".review-tag")
        .into_iter()
        .map(text)
        .filter(|tag| !tag.is_empty())
        .collect();
    if tags.is_empty() {
        return Err(MissReason::Missing);
    }
    Ok(tags)
}

const TAGS: &[Strategy<Vec<String>>] = &[tags_from_review_tags];

/// Collects field values and the misses along the way
#[derive(Default)]
struct FieldReader {
    failures: Vec<FieldFailure>,
}

impl FieldReader {
    fn read<T>(
        &mut self,
        element: ElementRef<'_>,
        field: ReviewField,
        strategies: &[Strategy<T>],
    ) -> Option<T> {
        match first_match(element, strategies) {
            Ok(value) => Some(value),
            Err(reason) => {
                self.failures.push(FieldFailure { field, reason });
                None
            }
        }
    }
}

/// Turns review elements into review records
#[derive(Debug, Clone, Default)]
pub struct RecordExtractor {
    filter: FilterConfig,
}

impl RecordExtractor {
    pub fn new(filter: FilterConfig) -> Self {
        Self { filter }
    }

    /// Returns the review elements on the page
    pub fn discover<'a>(&self, snapshot: &'a PageSnapshot) -> Vec<ElementRef<'a>> {
        snapshot.find_first_matching(ELEMENT_SELECTORS)
    }

    /// Reads every field of one element
    pub fn extract_element(
        &self,
        element: ElementRef<'_>,
        page_number: u32,
        source_url: &str,
    ) -> Result<ElementExtraction, ElementError> {
        if text(element).is_empty() && find_one(element, RATING_MARKUP).is_none() {
            return Err(ElementError::Blank);
        }

        let mut reader = FieldReader::default();
        let stars = reader.read(element, ReviewField::Stars, STARS);
        let title = reader.read(element, ReviewField::Title, TITLE);
        let body = reader.read(element, ReviewField::Text, TEXT);
        let reply = reader.read(element, ReviewField::CompanyResponse, COMPANY_REPLY);
        let name = reader.read(element, ReviewField::ReviewerName, REVIEWER_NAME);
        let location = reader.read(element, ReviewField::ReviewerLocation, REVIEWER_LOCATION);
        let reviews_count = reader.read(
            element,
            ReviewField::ReviewerReviewsCount,
            REVIEWER_REVIEWS_COUNT,
        );
        let published = reader.read(element, ReviewField::DatePublished, DATE_PUBLISHED);
        let experience = reader.read(element, ReviewField::DateExperience, DATE_EXPERIENCE);
        let verified = reader.read(element, ReviewField::Verified, VERIFIED);
        let useful_votes = reader.read(element, ReviewField::UsefulVotes, USEFUL_VOTES);
        let tags = reader.read(element, ReviewField::Tags, TAGS);

        if reader.failures.len() == ReviewField::ALL.len() {
            return Err(ElementError::Unrecognized);
        }

        let (company_response, company_reply_name) = match reply {
            Some(reply) => (Some(reply.text), reply.name),
            None => (None, None),
        };

        let review = Review {
            stars,
            title: title.unwrap_or_default(),
            text: body.unwrap_or_default(),
            company_response,
            reviewer: Reviewer {
                name: name.unwrap_or_default(),
                location,
                reviews_count,
            },
            date: ReviewDates {
                published: published.unwrap_or_default(),
                experience,
            },
            metadata: ReviewMetadata {
                verified: verified.unwrap_or(false),
                useful_votes: useful_votes.unwrap_or(0),
                page_number,
                source_url: source_url.to_string(),
                company_reply_name,
                tags: tags.unwrap_or_default(),
            },
        };

        Ok(ElementExtraction {
            review,
            failures: reader.failures,
        })
    }

    /// Returns true if the review passes the star filter and carries text or a rating
    pub fn retains(&self, review: &Review) -> bool {
        self.filter.admits(review.stars) && review.has_substance()
    }

    /// Extracts every review element of a page
    pub fn extract_page(
        &self,
        snapshot: &PageSnapshot,
        page_number: u32,
        source_url: &str,
    ) -> PageExtraction {
        let elements = self.discover(snapshot);
        let mut stats = PageStats::new(page_number, elements.len());
        let mut reviews = Vec::new();

        for (index, element) in elements.into_iter().enumerate() {
            match self.extract_element(element, page_number, source_url) {
                Ok(extraction) => {
                    stats.record_field_failures(&extraction.failures);
                    if !extraction.review.has_substance() {
                        stats.record_unusable();
                    } else if self.retains(&extraction.review) {
                        stats.record_extracted();
                        reviews.push(extraction.review);
                    } else {
                        stats.record_filtered();
                    }
                }
                Err(e) => {
                    tracing::debug!(
                        "Rejecting element {} on page {}: {}",
                        index + 1,
                        page_number,
                        e
                    );
                    stats.record_unusable();
                }
            }
        }

        PageExtraction { reviews, stats }
    }
}
