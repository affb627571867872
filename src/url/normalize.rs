use crate::UrlError;
use url::{form_urlencoded, Url};

/// Query parameters that never change page content and are dropped during normalization
const TRACKING_PARAMS: &[&str] = &["fbclid", "gclid", "mc_eid"];

/// Normalizes a raw URL or link into its identity form
///
/// # Normalization Steps
///
/// 1. Resolve `raw` against `base` (absolute input ignores the base)
/// 2. Lowercase the host (done by the parser for http/https)
/// 3. Resolve dot segments; an empty path becomes `/`
/// 4. Remove the fragment
/// 5. Remove tracking query parameters and sort the rest by key
/// 6. Remove an empty query string
///
/// A trailing slash is part of the identity: `/docs` and `/docs/` stay distinct.
///
/// Non-HTTP schemes pass through untouched apart from fragment removal; the
/// scope filter is what rejects them.
///
/// # Arguments
///
/// * `raw` - The URL or href to normalize
/// * `base` - The URL of the page the link was found on
///
/// # Returns
///
/// * `Ok(Url)` - Normalized URL
/// * `Err(UrlError::Malformed)` - The input could not be parsed; callers discard the link
///
/// # Examples
///
/// ```
/// use meta_crawl::url::normalize_url;
/// use url::Url;
///
/// let base = Url::parse("https://example.com/docs/").unwrap();
/// let url = normalize_url("../About?utm_source=x#team", &base).unwrap();
/// assert_eq!(url.as_str(), "https://example.com/About");
/// ```
pub fn normalize_url(raw: &str, base: &Url) -> Result<Url, UrlError> {
    let raw = raw.trim();
    let mut url = base
        .join(raw)
        .map_err(|e| UrlError::Malformed(format!("{}: {}", raw, e)))?;

    url.set_fragment(None);

    if url.cannot_be_a_base() {
        return Ok(url);
    }

    if let Some(query) = url.query().map(str::to_owned) {
        let segments = filter_and_sort_query_segments(&query);
        if segments.is_empty() {
            url.set_query(None);
        } else {
            url.set_query(Some(&segments.join("&")));
        }
    }

    Ok(url)
}

/// Parses and normalizes an absolute URL, such as the crawl seed
pub fn normalize_absolute(raw: &str) -> Result<Url, UrlError> {
    let url = Url::parse(raw.trim()).map_err(|e| UrlError::Malformed(format!("{}: {}", raw, e)))?;
    normalize_url(url.as_str(), &url)
}

/// Filters out tracking parameters and sorts the remaining segments by key
///
/// Segments are kept byte for byte: `?id` stays `?id` and `%20` is not
/// re-encoded as `+`. Only the key is decoded, to compare against the
/// tracking list and to order the segments.
fn filter_and_sort_query_segments(query: &str) -> Vec<&str> {
    let mut segments: Vec<(String, &str)> = query
        .split('&')
        .filter(|segment| !segment.is_empty())
        .map(|segment| (decoded_key(segment), segment))
        .filter(|(key, _)| !is_tracking_param(key))
        .collect();

    // Stable sort keeps repeated keys in their original order
    segments.sort_by(|a, b| a.0.cmp(&b.0));

    segments.into_iter().map(|(_, segment)| segment).collect()
}

fn decoded_key(segment: &str) -> String {
    form_urlencoded::parse(segment.as_bytes())
        .next()
        .map(|(key, _)| key.into_owned())
        .unwrap_or_default()
}

/// Checks if a query parameter is a tracking parameter
fn is_tracking_param(key: &str) -> bool {
    TRACKING_PARAMS.contains(&key) || key.starts_with("utm_")
}
