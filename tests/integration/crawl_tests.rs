//! Integration tests for the crawler
//!
//! These tests use wiremock to serve a paginated review listing and run the full crawl
//! cycle end-to-end through the HTTP rendering backend.

use review_harvest::config::{Config, FilterConfig, RendererBackend};
use review_harvest::crawler::{crawl, CrawlReport, StopReason};
use review_harvest::output::{save_reviews, OutputFormat};
use review_harvest::render::HttpRenderer;
use review_harvest::url::with_star_filter;
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LISTING_PATH: &str = "/review/acme.com";

/// Creates a fast test configuration for the HTTP backend
fn create_test_config() -> Config {
    let mut config = Config::default();
    config.renderer.backend = RendererBackend::Http;
    config.crawler.max_retries = 1;
    config.crawler.retry_delay_ms = 0;
    config.crawler.page_delay_ms = 0;
    config
}

fn review_card(index: usize, stars: u8) -> String {
    format!(
        r#"<article class="styles_reviewCard__hcAvl">
            <div data-service-review-rating="{stars}"></div>
            <h2 data-service-review-title-typography="true">Review {index}</h2>
            <p data-service-review-text-typography="true">Body of review {index}</p>
            <span data-consumer-name-typography="true">Customer {index}</span>
            <span data-consumer-country-typography="true">US</span>
            <time datetime="2024-05-0{day}T09:30:00.000Z">May {day}</time>
            <p data-service-review-date-of-experience-typography="true">Date of experience: May 1, 2024</p>
        </article>"#,
        day = index % 9 + 1
    )
}

fn listing(cards: &[String], extra: &str) -> String {
    format!(
        r#"<html><head><title>Acme is rated "Great" | Reviews</title></head>
        <body>
            <span data-reviews-count-typography="true">47 reviews</span>
            <section>{}</section>
            {}
        </body></html>"#,
        cards.concat(),
        extra
    )
}

fn full_page(page: u32, count: usize) -> String {
    let cards: Vec<String> = (0..count)
        .map(|i| review_card((page as usize - 1) * 20 + i + 1, 4))
        .collect();
    listing(&cards, "")
}

async fn mount_page(server: &MockServer, page: u32, template: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(LISTING_PATH))
        .and(query_param("page", page.to_string()))
        .respond_with(template)
        .mount(server)
        .await;
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body)
        .insert_header("content-type", "text/html; charset=utf-8")
}

async fn run_crawl(config: Config, base_url: &Url) -> CrawlReport {
    let renderer = HttpRenderer::new(&config.renderer).expect("Failed to open HTTP session");
    crawl(config, renderer, base_url).await
}

fn listing_url(server: &MockServer) -> Url {
    Url::parse(&format!("{}{}", server.uri(), LISTING_PATH)).expect("Failed to parse base URL")
}

#[tokio::test]
async fn test_full_crawl_until_short_last_page() {
    let server = MockServer::start().await;
    mount_page(&server, 1, html(full_page(1, 20))).await;
    mount_page(&server, 2, html(full_page(2, 20))).await;
    mount_page(&server, 3, html(full_page(3, 7))).await;

    let report = run_crawl(create_test_config(), &listing_url(&server)).await;

    assert_eq!(report.stop_reason, StopReason::ProbableLastPage { elements: 7 });
    assert_eq!(report.total_reviews(), 47);
    assert_eq!(report.pages_visited, 3);
    assert_eq!(report.claimed_total_reviews, Some(47));
    assert_eq!(report.estimated_total_pages, Some(3));

    let first = &report.reviews[0];
    assert_eq!(first.stars, Some(4));
    assert_eq!(first.title, "Review 1");
    assert_eq!(first.reviewer.name, "Customer 1");
    assert_eq!(first.reviewer.location.as_deref(), Some("US"));
    assert_eq!(first.date.published, "2024-05-02T09:30:00.000Z");
    assert_eq!(first.date.experience.as_deref(), Some("May 1, 2024"));
    assert_eq!(first.metadata.page_number, 1);
    assert!(first.metadata.source_url.ends_with("page=1"));

    let last = report.reviews.last().unwrap();
    assert_eq!(last.title, "Review 47");
    assert_eq!(last.metadata.page_number, 3);
}

#[tokio::test]
async fn test_error_page_stops_crawl() {
    let server = MockServer::start().await;
    mount_page(&server, 1, html(full_page(1, 20))).await;
    mount_page(
        &server,
        2,
        ResponseTemplate::new(404).set_body_string(
            "<html><head><title>404 - Page not found</title></head><body></body></html>",
        ),
    )
    .await;

    let report = run_crawl(create_test_config(), &listing_url(&server)).await;

    assert_eq!(report.stop_reason, StopReason::HardStop);
    assert_eq!(report.total_reviews(), 20);
    assert_eq!(report.pages.len(), 1);
}

#[tokio::test]
async fn test_redirect_past_last_page() {
    let server = MockServer::start().await;
    mount_page(&server, 1, html(full_page(1, 20))).await;
    mount_page(&server, 2, html(full_page(2, 20))).await;
    mount_page(
        &server,
        3,
        ResponseTemplate::new(302)
            .insert_header("location", format!("{}?page=1", LISTING_PATH).as_str()),
    )
    .await;

    let report = run_crawl(create_test_config(), &listing_url(&server)).await;

    assert_eq!(
        report.stop_reason,
        StopReason::Redirected {
            requested: 3,
            resolved: 1
        }
    );
    assert_eq!(report.total_reviews(), 40);
    assert!(report.reviews.iter().all(|r| r.metadata.page_number <= 2));
}

#[tokio::test]
async fn test_no_results_marker_stops_crawl() {
    let server = MockServer::start().await;
    mount_page(&server, 1, html(full_page(1, 20))).await;
    mount_page(
        &server,
        2,
        html(listing(
            &[review_card(99, 5)],
            r#"<div class="noResultsContainer"><p>No reviews found</p></div>"#,
        )),
    )
    .await;

    let report = run_crawl(create_test_config(), &listing_url(&server)).await;

    assert_eq!(report.stop_reason, StopReason::NoResultsMarker);
    assert_eq!(report.total_reviews(), 20);
}

#[tokio::test]
async fn test_unreachable_pages_exhaust_failure_budget() {
    let server = MockServer::start().await;
    mount_page(&server, 1, html(full_page(1, 20))).await;
    // every other page falls through to wiremock's empty 404

    let report = run_crawl(create_test_config(), &listing_url(&server)).await;

    assert_eq!(report.stop_reason, StopReason::TooManyFailures { streak: 3 });
    assert_eq!(report.total_reviews(), 20);
    assert_eq!(report.pages_visited, 4);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 4);
}

#[tokio::test]
async fn test_max_pages_cap() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(LISTING_PATH))
        .respond_with(html(full_page(1, 20)))
        .mount(&server)
        .await;

    let mut config = create_test_config();
    config.crawler.max_pages = Some(3);
    let report = run_crawl(config, &listing_url(&server)).await;

    assert_eq!(report.stop_reason, StopReason::MaxPagesReached { cap: 3 });
    assert_eq!(report.total_reviews(), 60);
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_star_filter_in_url_and_records() {
    let server = MockServer::start().await;
    let cards = vec![review_card(1, 5), review_card(2, 3), review_card(3, 1)];
    Mock::given(method("GET"))
        .and(path(LISTING_PATH))
        .and(query_param("stars", "1"))
        .and(query_param("stars", "5"))
        .and(query_param("page", "1"))
        .respond_with(html(listing(&cards, "")))
        .mount(&server)
        .await;

    let mut config = create_test_config();
    config.filter = FilterConfig::new(vec![1, 5]);
    let base_url = with_star_filter(&listing_url(&server), &config.filter.stars);

    let report = run_crawl(config, &base_url).await;

    let stars: Vec<_> = report.reviews.iter().map(|r| r.stars).collect();
    assert_eq!(stars, vec![Some(5), Some(1)]);
    assert_eq!(report.total_filtered(), 1);
}

#[tokio::test]
async fn test_results_are_saved_in_both_formats() {
    let server = MockServer::start().await;
    mount_page(&server, 1, html(full_page(1, 20))).await;
    mount_page(&server, 2, html(full_page(2, 3))).await;

    let report = run_crawl(create_test_config(), &listing_url(&server)).await;
    assert_eq!(report.total_reviews(), 23);

    let dir = TempDir::new().expect("Failed to create temp dir");

    let json_path = save_reviews(&report.reviews, &dir.path().join("reviews.csv"), OutputFormat::Json)
        .expect("Failed to save JSON");
    assert_eq!(json_path.extension().unwrap(), "json");
    let document: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(document["metadata"]["total_reviews"], 23);
    assert_eq!(document["metadata"]["version"], "2.0");
    assert_eq!(document["reviews"][22]["metadata"]["page_number"], 2);

    let csv_path = save_reviews(&report.reviews, &dir.path().join("reviews"), OutputFormat::Csv)
        .expect("Failed to save CSV");
    let mut reader = csv::Reader::from_path(&csv_path).expect("Failed to open CSV");
    assert_eq!(
        reader.headers().unwrap().iter().collect::<Vec<_>>(),
        vec![
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
            "page_number"
        ]
    );
    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 23);
    assert_eq!(&rows[0][0], "4");
    assert_eq!(&rows[0][3], "");
    assert_eq!(&rows[0][9], "false");
}
