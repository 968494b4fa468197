//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests made during discovery and retrieval:
//! - The `Fetcher` capability the traversal is written against
//! - Building HTTP clients with proper user agent strings
//! - Error classification into timeouts, connect failures and the rest

use crate::config::UserAgentConfig;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

/// Transport-level fetch failure
///
/// Non-2xx statuses are not errors at this layer; callers inspect
/// `FetchResponse::status_code`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("Request to {url} timed out")]
    Timeout { url: String },

    #[error("Connection to {url} failed: {message}")]
    Connect { url: String, message: String },

    #[error("Request to {url} failed: {message}")]
    Other { url: String, message: String },
}

/// Response of a completed fetch
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// HTTP status code
    pub status_code: u16,
    /// Final URL after redirects
    pub final_url: String,
    /// Content-Type header value
    pub content_type: Option<String>,
    /// Raw body bytes
    pub body: Vec<u8>,
}

impl FetchResponse {
    /// Returns true for a 2xx status
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    /// Decodes the body as UTF-8, replacing invalid sequences
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Retrieves raw content for a URL
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<FetchResponse, FetchError>;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use sumi_sift::config::UserAgentConfig;
/// use sumi_sift::crawler::build_http_client;
///
/// let config = UserAgentConfig {
///     crawler_name: "SumiSift".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&config).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent_string(config))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Formats `CrawlerName/Version (+ContactURL; ContactEmail)`
pub fn user_agent_string(config: &UserAgentConfig) -> String {
    format!(
        "{}/{} (+{}; {})",
        config.crawler_name, config.crawler_version, config.contact_url, config.contact_email
    )
}

/// `Fetcher` backed by a reqwest client
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds a fetcher with a client configured from the user agent section
    pub fn from_config(config: &UserAgentConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::new(build_http_client(config)?))
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<FetchResponse, FetchError> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify_error(url, e))?;

        let status_code = response.status().as_u16();
        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = response
            .bytes()
            .await
            .map_err(|e| classify_error(url, e))?
            .to_vec();

        Ok(FetchResponse {
            status_code,
            final_url,
            content_type,
            body,
        })
    }
}

fn classify_error(url: &str, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else if error.is_connect() {
        FetchError::Connect {
            url: url.to_string(),
            message: error.to_string(),
        }
    } else {
        FetchError::Other {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_config() -> UserAgentConfig {
        UserAgentConfig {
            crawler_name: "TestSifter".to_string(),
            crawler_version: "1.0".to_string(),
            contact_url: "https://example.com/about".to_string(),
            contact_email: "admin@example.com".to_string(),
        }
    }

    #[test]
    fn test_build_http_client() {
        let config = create_test_config();
        let client = build_http_client(&config);
        assert!(client.is_ok());
    }

    #[test]
    fn test_user_agent_format() {
        let config = create_test_config();
        assert_eq!(
            user_agent_string(&config),
            "TestSifter/1.0 (+https://example.com/about; admin@example.com)"
        );
    }

    #[test]
    fn test_response_success_range() {
        let mut response = FetchResponse {
            status_code: 200,
            final_url: "https://example.com/".to_string(),
            content_type: None,
            body: b"ok".to_vec(),
        };
        assert!(response.is_success());
        assert_eq!(response.text(), "ok");

        response.status_code = 299;
        assert!(response.is_success());

        response.status_code = 301;
        assert!(!response.is_success());

        response.status_code = 404;
        assert!(!response.is_success());
    }

    #[tokio::test]
    async fn test_unreachable_host_is_an_error() {
        let fetcher = HttpFetcher::from_config(&create_test_config()).unwrap();

        // Port 9 on loopback is discard; nothing listens there in CI
        let result = fetcher
            .fetch("http://127.0.0.1:9/sitemap.xml", Duration::from_secs(2))
            .await;
        assert!(result.is_err());
    }
}
