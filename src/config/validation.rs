use crate::config::types::{BrowserSettings, Config, CrawlerConfig, UserAgentConfig};
use crate::ConfigError;

/// Upper bound for the delay between fetch starts (seconds)
const MAX_DELAY_SECS: f64 = 3600.0;

/// Upper bound for a single fetch (seconds)
const MAX_TIMEOUT_SECS: u64 = 3600;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_browser_settings(&config.browser, &config.crawler)?;
    validate_output_path(config.output.path.as_deref())?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if let Some(delay) = config.delay {
        if !delay.is_finite() || delay < 0.0 {
            return Err(ConfigError::Validation(format!(
                "delay must be a non-negative number of seconds, got {}",
                delay
            )));
        }
        if delay > MAX_DELAY_SECS {
            return Err(ConfigError::Validation(format!(
                "delay must be at most {} seconds, got {}",
                MAX_DELAY_SECS, delay
            )));
        }
    }

    if config.timeout < 1 {
        return Err(ConfigError::Validation(
            "timeout must be at least 1 second".to_string(),
        ));
    }

    if config.timeout > MAX_TIMEOUT_SECS {
        return Err(ConfigError::Validation(format!(
            "timeout must be at most {} seconds, got {}",
            MAX_TIMEOUT_SECS, config.timeout
        )));
    }

    if config.max_redirects > 20 {
        return Err(ConfigError::Validation(format!(
            "max_redirects must be between 0 and 20, got {}",
            config.max_redirects
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.value.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user agent cannot be empty".to_string(),
        ));
    }

    // Header values cannot carry control characters
    if config.value.chars().any(|c| c.is_control()) {
        return Err(ConfigError::Validation(
            "user agent must not contain control characters".to_string(),
        ));
    }

    Ok(())
}

fn validate_browser_settings(
    settings: &BrowserSettings,
    crawler: &CrawlerConfig,
) -> Result<(), ConfigError> {
    if settings.settle_time() > crawler.timeout() {
        return Err(ConfigError::Validation(format!(
            "settle_time ({}ms) cannot exceed the fetch timeout ({}s)",
            settings.settle_time, crawler.timeout
        )));
    }
    Ok(())
}

/// Validates the output path, if one was given
pub(crate) fn validate_output_path(path: Option<&str>) -> Result<(), ConfigError> {
    if let Some(path) = path {
        if path.trim().is_empty() {
            return Err(ConfigError::Validation(
                "output path cannot be empty".to_string(),
            ));
        }
    }
    Ok(())
}
