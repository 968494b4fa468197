use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads, parses and validates a configuration file
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use sumi_sift::config::load_config;
///
/// let config = load_config(Path::new("sift.toml")).unwrap();
/// println!("Base URL: {}", config.discovery.base_url);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses and validates configuration from TOML text
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// The hash is stored on each run record so runs against different
/// configurations can be told apart.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    const VALID_CONFIG: &str = r#"
[discovery]
base-url = "https://www.example.com/"
max-concurrent-fetches = 4
fetch-timeout-ms = 5000

[user-agent]
crawler-name = "TestSifter"
crawler-version = "1.0"
contact-url = "https://example.com/about"
contact-email = "admin@example.com"

[output]
database-path = "./test.db"
summary-path = "./summary.md"
"#;

    #[test]
    fn test_load_valid_config() {
        let file = create_temp_config(VALID_CONFIG);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.discovery.base_url, "https://www.example.com/");
        assert_eq!(config.discovery.max_concurrent_fetches, 4);
        assert_eq!(config.discovery.fetch_timeout_ms, 5000);
        assert_eq!(config.discovery.max_depth, None);
        assert_eq!(config.user_agent.crawler_name, "TestSifter");
    }

    #[test]
    fn test_defaults_applied() {
        let config = parse_config(VALID_CONFIG).unwrap();

        assert_eq!(
            config.discovery.seed_paths,
            vec!["sitemap.xml", "sitemap_index.xml", "sitemaps/sitemap.xml"]
        );
        assert!(config.discovery.seeds.is_empty());
        assert_eq!(config.retrieval.max_concurrent_pages, 32);
        assert_eq!(config.retrieval.preview_chars, 500);
    }

    #[test]
    fn test_explicit_seeds_and_depth() {
        let content = VALID_CONFIG.replace(
            "fetch-timeout-ms = 5000",
            "fetch-timeout-ms = 5000\nmax-depth = 3\nseeds = [\"https://cdn.example.com/sitemap-news.xml\"]",
        );
        let config = parse_config(&content).unwrap();

        assert_eq!(config.discovery.max_depth, Some(3));
        assert_eq!(
            config.discovery.seeds,
            vec!["https://cdn.example.com/sitemap-news.xml"]
        );
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/sift.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let content = VALID_CONFIG.replace("max-concurrent-fetches = 4", "max-concurrent-fetches = 0");
        let file = create_temp_config(&content);
        let result = load_config(file.path());
        assert!(matches!(result.unwrap_err(), ConfigError::Validation(_)));
    }

    #[test]
    fn test_compute_config_hash() {
        let file = create_temp_config("test content");

        let hash1 = compute_config_hash(file.path()).unwrap();
        let hash2 = compute_config_hash(file.path()).unwrap();

        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn test_different_content_different_hash() {
        let file1 = create_temp_config("content 1");
        let file2 = create_temp_config("content 2");

        let hash1 = compute_config_hash(file1.path()).unwrap();
        let hash2 = compute_config_hash(file2.path()).unwrap();

        assert_ne!(hash1, hash2);
    }
}
