use url::Url;

/// Returns the root of the URL's origin (`scheme://host[:port]/`)
///
/// This is the base domain a set of crawling rules is keyed on, and the
/// URL `robots.txt` is resolved against.
pub fn domain_root(url: &Url) -> Url {
    let mut root = url.clone();
    root.set_path("/");
    root.set_query(None);
    root.set_fragment(None);
    // Credentials never take part in the domain identity. Clearing them only
    // fails on cannot-be-a-base URLs, which have no host to crawl anyway.
    let _ = root.set_username("");
    let _ = root.set_password(None);
    root
}

/// Checks whether a link stays within the crawled domain
///
/// True when the link's hostname equals the domain's hostname, or when the
/// link carries no hostname at all.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use polite_crawler::url::same_subdomain;
///
/// let domain = Url::parse("http://example.com/").unwrap();
/// assert!(same_subdomain(&domain, &Url::parse("http://example.com/a").unwrap()));
/// assert!(!same_subdomain(&domain, &Url::parse("http://other.com/b").unwrap()));
/// assert!(!same_subdomain(&domain, &Url::parse("http://blog.example.com/").unwrap()));
/// ```
pub fn same_subdomain(domain: &Url, link: &Url) -> bool {
    match link.host_str() {
        None => true,
        Some(host) => domain
            .host_str()
            .is_some_and(|base| base.eq_ignore_ascii_case(host)),
    }
}
