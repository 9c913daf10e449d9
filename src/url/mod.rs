//! URL handling module for Review-Harvest
//!
//! This module turns the user's listing URL into the sequence of page URLs the crawl
//! visits, and reads back the page number a rendered page actually resolved to.

mod page;

use crate::UrlError;
use url::Url;

// Re-export main functions
pub use page::{page_number, page_url, with_star_filter};

/// Parses the target listing URL
///
/// # Arguments
///
/// * `target` - The URL given on the command line
///
/// # Returns
///
/// * `Ok(Url)` - A parsed HTTP(S) URL with a host
/// * `Err(UrlError)` - The URL is malformed, not HTTP(S), or has no host
pub fn parse_target(target: &str) -> Result<Url, UrlError> {
    let url = Url::parse(target.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingHost);
    }

    Ok(url)
}
