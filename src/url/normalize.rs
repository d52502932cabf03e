use crate::UrlError;
use url::Url;

/// Parses and validates a seed URL
///
/// # Validation Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Only `http` and `https` schemes are accepted
/// 3. A host must be present
/// 4. Remove the fragment
///
/// # Examples
///
/// ```
/// use polite_crawler::url::parse_seed;
///
/// let url = parse_seed("http://example.com/#top").unwrap();
/// assert_eq!(url.as_str(), "http://example.com/");
/// assert!(parse_seed("ftp://example.com/").is_err());
/// ```
pub fn parse_seed(url_str: &str) -> Result<Url, UrlError> {
    let url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingDomain);
    }

    normalize_link(url).ok_or(UrlError::MissingDomain)
}

/// Normalizes a discovered link before it is deduplicated
///
/// Fragments never change what is fetched, so they are removed. Links that
/// are not `http`/`https` are dropped.
pub fn normalize_link(mut url: Url) -> Option<Url> {
    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }
    url.set_fragment(None);
    Some(url)
}
