use crate::config::types::{Config, DiscoveryConfig, RetrievalConfig, UserAgentConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_discovery_config(&config.discovery)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    validate_retrieval_config(&config.retrieval)?;
    Ok(())
}

/// Validates discovery configuration
fn validate_discovery_config(config: &DiscoveryConfig) -> Result<(), ConfigError> {
    let base = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url: {}", e)))?;
    validate_http_scheme(&base, "base_url")?;

    if config.seed_paths.is_empty() && config.seeds.is_empty() {
        return Err(ConfigError::Validation(
            "at least one seed path or seed URL is required".to_string(),
        ));
    }

    for path in &config.seed_paths {
        if path.trim().is_empty() {
            return Err(ConfigError::Validation(
                "seed_paths cannot contain empty entries".to_string(),
            ));
        }
    }

    for seed in &config.seeds {
        let url = Url::parse(seed)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", seed, e)))?;
        validate_http_scheme(&url, "seed")?;
    }

    if config.max_concurrent_fetches < 1 || config.max_concurrent_fetches > 100 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_fetches must be between 1 and 100, got {}",
            config.max_concurrent_fetches
        )));
    }

    if config.fetch_timeout_ms < 100 {
        return Err(ConfigError::Validation(format!(
            "fetch_timeout_ms must be >= 100ms, got {}ms",
            config.fetch_timeout_ms
        )));
    }

    Ok(())
}

fn validate_http_scheme(url: &Url, field: &str) -> Result<(), ConfigError> {
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "{} '{}' must use HTTP or HTTPS",
            field, url
        )));
    }
    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &crate::config::types::OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    if config.summary_path.is_empty() {
        return Err(ConfigError::Validation(
            "summary_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_retrieval_config(config: &RetrievalConfig) -> Result<(), ConfigError> {
    if config.max_concurrent_pages < 1 || config.max_concurrent_pages > 100 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_pages must be between 1 and 100, got {}",
            config.max_concurrent_pages
        )));
    }
    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    if email.is_empty() {
        return Err(ConfigError::Validation(
            "contact_email cannot be empty".to_string(),
        ));
    }

    let Some((local, domain)) = email.split_once('@') else {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    };

    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !domain.contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}
