//! URL handling module for Listing Harvester
//!
//! Catalog pages follow the `{base}/{page_num}` scheme. This module validates
//! base catalog URLs and builds the URL of a given page index.

use crate::{UrlError, UrlResult};
use url::Url;

/// Parses and validates a base catalog URL
///
/// Only `http` and `https` URLs are accepted. Query strings and fragments are
/// rejected because the page index is appended to the path.
///
/// # Arguments
///
/// * `raw` - The catalog URL as written in config or on the command line
///
/// # Returns
///
/// * `Ok(Url)` - The parsed base URL
/// * `Err(UrlError)` - The URL could not be parsed or uses an unsupported scheme
pub fn parse_catalog_url(raw: &str) -> UrlResult<Url> {
    let url = Url::parse(raw.trim()).map_err(|e| UrlError::Parse(format!("{}: {}", raw, e)))?;

    match url.scheme() {
        "http" | "https" => {}
        other => return Err(UrlError::InvalidScheme(other.to_string())),
    }

    if url.query().is_some() || url.fragment().is_some() {
        return Err(UrlError::Parse(format!(
            "catalog URL '{}' must not carry a query or fragment",
            raw
        )));
    }

    Ok(url)
}

/// Builds the URL of one catalog page
///
/// # Arguments
///
/// * `base` - The base catalog URL
/// * `page` - The page index, starting at 1
///
/// # Returns
///
/// * `Ok(Url)` - `{base}/{page}`
/// * `Err(UrlError::InvalidPage)` - The page index was zero
///
/// # Example
///
/// ```
/// use listing_harvester::url::page_url;
/// use url::Url;
///
/// let base = Url::parse("https://example.com/apartments/riyadh").unwrap();
/// let url = page_url(&base, 3).unwrap();
/// assert_eq!(url.as_str(), "https://example.com/apartments/riyadh/3");
/// ```
pub fn page_url(base: &Url, page: u32) -> UrlResult<Url> {
    if page == 0 {
        return Err(UrlError::InvalidPage(page));
    }

    let base = base.as_str().trim_end_matches('/');
    Url::parse(&format!("{}/{}", base, page)).map_err(|e| UrlError::Parse(e.to_string()))
}
