use url::Url;

/// Query parameter carrying the listing page number
const PAGE_PARAM: &str = "page";

/// Query parameter carrying a star-rating filter
const STARS_PARAM: &str = "stars";

/// Builds the URL of listing page `page` from the base listing URL
///
/// Any existing `page` parameter is replaced; every other query parameter is kept in
/// its original order.
///
/// # Examples
///
/// ```
/// use review_harvest::url::page_url;
/// use url::Url;
///
/// let base = Url::parse("https://example.com/review/acme?stars=5").unwrap();
/// assert_eq!(
///     page_url(&base, 3).as_str(),
///     "https://example.com/review/acme?stars=5&page=3"
/// );
/// ```
pub fn page_url(base: &Url, page: u32) -> Url {
    let kept: Vec<(String, String)> = base
        .query_pairs()
        .filter(|(key, _)| key != PAGE_PARAM)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    let mut url = base.clone();
    url.query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair(PAGE_PARAM, &page.to_string());
    url
}

/// Reads the page number from a URL's `page` query parameter
///
/// Returns `None` when the parameter is missing or not a number.
pub fn page_number(url: &str) -> Option<u32> {
    let url = Url::parse(url).ok()?;
    let value = url
        .query_pairs()
        .find(|(key, _)| key == PAGE_PARAM)
        .map(|(_, value)| value.into_owned())?;
    value.parse().ok()
}

/// Appends one `stars` parameter per rating, unless the URL already filters by stars
pub fn with_star_filter(base: &Url, stars: &[u8]) -> Url {
    if stars.is_empty() || base.query_pairs().any(|(key, _)| key == STARS_PARAM) {
        return base.clone();
    }

    let mut url = base.clone();
    {
        let mut pairs = url.query_pairs_mut();
        for star in stars {
            pairs.append_pair(STARS_PARAM, &star.to_string());
        }
    }
    url
}
