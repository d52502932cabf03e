use crate::config::types::{Config, CrawlerConfig, CrawlerSettings};
use crate::ConfigError;
use std::time::Duration;

/// Upper bound on the number of concurrent fetches
const MAX_CONCURRENCY: usize = 1024;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)
}

/// Validates crawler configuration as read from a file
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    validate_settings(&CrawlerSettings::from(config))
}

/// Validates a settings snapshot before a crawler is built from it
///
/// Concurrency and depth of zero are valid and mean "unbounded".
pub fn validate_settings(settings: &CrawlerSettings) -> Result<(), ConfigError> {
    validate_user_agent(&settings.user_agent)?;

    if settings.fetch_timeout == Duration::ZERO {
        return Err(ConfigError::Validation(
            "fetch_timeout must be greater than zero".to_string(),
        ));
    }

    if settings.crawl_timeout == Duration::ZERO {
        return Err(ConfigError::Validation(
            "crawl_timeout must be greater than zero".to_string(),
        ));
    }

    if settings.concurrency > MAX_CONCURRENCY {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 0 and {}, got {}",
            MAX_CONCURRENCY, settings.concurrency
        )));
    }

    Ok(())
}

/// Validates the user agent: non-empty and usable as a header value
fn validate_user_agent(user_agent: &str) -> Result<(), ConfigError> {
    if user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if user_agent.chars().any(|c| c.is_control()) {
        return Err(ConfigError::Validation(format!(
            "user_agent must not contain control characters, got '{}'",
            user_agent.escape_debug()
        )));
    }

    Ok(())
}
