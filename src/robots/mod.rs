//! Robots.txt handling module
//!
//! This module provides the robots rule model ([`Rule`], [`Group`]), builds a
//! group for a user agent from robots.txt content, and loads it for a domain
//! through the fetch capability.

mod parser;
mod rules;

pub use parser::parse_group;
pub use rules::{Group, Rule};

use crate::crawler::Fetcher;
use url::Url;

/// Returns the robots.txt URL for the domain of `url`
pub fn robots_url(url: &Url) -> Option<Url> {
    url.join("/robots.txt").ok()
}

/// Fetches and parses robots.txt for a domain
///
/// Any failure (unreachable server, non-2xx status, nothing declared for the
/// agent) yields `None`, which the crawl rules treat as "everything allowed".
///
/// # Arguments
///
/// * `fetcher` - The fetch capability used for the request
/// * `domain` - Any URL on the domain
/// * `user_agent` - The user agent whose group should be selected
pub async fn load_group<F>(fetcher: &F, domain: &Url, user_agent: &str) -> Option<Group>
where
    F: Fetcher + ?Sized,
{
    let robots = robots_url(domain)?;

    let (elapsed, response) = fetcher.fetch(&robots).await;
    let response = match response {
        Ok(response) => response,
        Err(e) => {
            tracing::debug!("No robots.txt for {} ({:?}): {}", domain, elapsed, e);
            return None;
        }
    };

    if !response.is_success() {
        tracing::debug!(
            "robots.txt for {} answered HTTP {}, allowing all",
            domain,
            response.status
        );
        return None;
    }

    let group = parse_group(&response.body, user_agent);
    match &group {
        Some(g) => tracing::debug!(
            "Loaded robots.txt for {}: {} rules for '{}', crawl-delay {:?}",
            domain,
            g.rules().len(),
            g.agent(),
            g.crawl_delay()
        ),
        None => tracing::debug!("robots.txt for {} declares nothing for this agent", domain),
    }
    group
}
