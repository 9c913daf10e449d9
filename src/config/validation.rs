use crate::config::types::{Config, CrawlerConfig, DebugConfig, FilterConfig, RendererConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_renderer_config(&config.renderer)?;
    validate_filter_config(&config.filter)?;
    validate_debug_config(&config.debug)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_retries < 1 {
        return Err(ConfigError::Validation(format!(
            "max_retries must be >= 1, got {}",
            config.max_retries
        )));
    }

    if config.page_load_timeout_ms < 1000 {
        return Err(ConfigError::Validation(format!(
            "page_load_timeout_ms must be >= 1000ms, got {}ms",
            config.page_load_timeout_ms
        )));
    }

    if config.reviews_per_page < 1 {
        return Err(ConfigError::Validation(format!(
            "reviews_per_page must be >= 1, got {}",
            config.reviews_per_page
        )));
    }

    if config.max_consecutive_failures < 1 {
        return Err(ConfigError::Validation(format!(
            "max_consecutive_failures must be >= 1, got {}",
            config.max_consecutive_failures
        )));
    }

    if config.max_consecutive_empty_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max_consecutive_empty_pages must be >= 1, got {}",
            config.max_consecutive_empty_pages
        )));
    }

    if config.max_pages == Some(0) {
        return Err(ConfigError::Validation(
            "max_pages must be >= 1 when set".to_string(),
        ));
    }

    Ok(())
}

/// Validates renderer configuration
fn validate_renderer_config(config: &RendererConfig) -> Result<(), ConfigError> {
    Url::parse(&config.webdriver_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid webdriver_url: {}", e)))?;

    if let Some(agent) = &config.user_agent {
        if agent.trim().is_empty() {
            return Err(ConfigError::Validation(
                "user_agent cannot be blank".to_string(),
            ));
        }
    }

    Ok(())
}

/// Validates the star filter
fn validate_filter_config(config: &FilterConfig) -> Result<(), ConfigError> {
    if let Some(bad) = config.stars.iter().find(|s| !(1..=5).contains(*s)) {
        return Err(ConfigError::Validation(format!(
            "star filter values must be between 1 and 5, got {}",
            bad
        )));
    }
    Ok(())
}

/// Validates debug configuration
fn validate_debug_config(config: &DebugConfig) -> Result<(), ConfigError> {
    if config.save_html && config.html_path.is_empty() {
        return Err(ConfigError::Validation(
            "html_path cannot be empty when save_html is enabled".to_string(),
        ));
    }
    Ok(())
}

/// Validates the listing URL the crawl starts from
pub fn validate_target_url(target: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(target)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid target URL '{}': {}", target, e)))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::Validation(format!(
            "Target URL '{}' must use HTTP or HTTPS",
            target
        )));
    }

    Ok(url)
}
