//! Run statistics display
//!
//! This module renders a finished crawl's report for the terminal.

use crate::crawler::CrawlReport;
use std::fmt::Write;

/// Renders the report as the text block printed at the end of a run
pub fn format_statistics(report: &CrawlReport) -> String {
    let mut out = String::new();
    // writing to a String cannot fail
    let _ = render(report, &mut out);
    out
}

fn render(report: &CrawlReport, out: &mut String) -> std::fmt::Result {
    writeln!(out, "=== Crawl Statistics ===\n")?;

    writeln!(out, "Overview:")?;
    writeln!(out, "  Pages processed: {}", report.pages.len())?;
    writeln!(out, "  Page loads: {}", report.pages_visited)?;
    writeln!(out, "  Reviews extracted: {}", report.total_reviews())?;
    if let (Some(total), Some(percentage)) =
        (report.claimed_total_reviews, report.claimed_percentage())
    {
        writeln!(out, "  Site claims {} reviews ({:.1}% extracted)", total, percentage)?;
    }
    if let Some(pages) = report.estimated_total_pages {
        writeln!(out, "  Estimated total pages: {}", pages)?;
    }
    writeln!(
        out,
        "  Highest pagination page seen: {}",
        report.highest_pagination_page_seen
    )?;
    writeln!(out, "  Stopped because: {}", report.stop_reason)?;
    writeln!(out, "  Duration: {:.1}s", report.elapsed.as_secs_f64())?;
    writeln!(out)?;

    if !report.pages.is_empty() {
        writeln!(out, "Pages:")?;
        for page in &report.pages {
            writeln!(
                out,
                "  Page {}: {} elements, {} extracted, {} filtered, {} errors ({:.1}%)",
                page.page_number,
                page.raw_element_count,
                page.extracted,
                page.filtered,
                page.errors,
                page.extraction_rate()
            )?;
        }
        writeln!(out)?;
    }

    writeln!(out, "Totals:")?;
    writeln!(out, "  Raw elements: {}", report.total_raw_elements())?;
    writeln!(out, "  Filtered: {}", report.total_filtered())?;
    writeln!(out, "  Errors: {}", report.total_errors())?;
    if let (Some(estimated), Some(coverage)) = (report.estimated_reviews(), report.coverage()) {
        writeln!(
            out,
            "  Coverage: {:.1}% of about {} reviews",
            coverage, estimated
        )?;
    }

    let unproductive = report.unproductive_pages();
    if !unproductive.is_empty() {
        writeln!(out)?;
        let pages: Vec<String> = unproductive.iter().map(u32::to_string).collect();
        writeln!(
            out,
            "Warning: pages with elements but no extracted reviews: {}",
            pages.join(", ")
        )?;
    }

    Ok(())
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `report` - The report of the finished crawl
pub fn print_statistics(report: &CrawlReport) {
    print!("{}", format_statistics(report));
}
