//! Sumi-Sift: a sitemap sifter
//!
//! This crate discovers every content URL a site declares through its XML
//! sitemaps. It walks nested sitemap indexes of any depth, records each URL
//! exactly once in a durable ledger, and can retrieve the cleaned text of the
//! discovered pages for downstream indexing.

pub mod config;
pub mod crawler;
pub mod output;
pub mod retrieval;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Sumi-Sift operations
///
/// Only configuration and storage failures reach the caller as run-fatal.
/// Per-branch fetch failures are logged and counted inside the traversal.
#[derive(Debug, Error)]
pub enum SiftError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] crawler::FetchError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    StorageError(#[from] storage::StorageError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Cannot build seed '{path}' from base {base}: {message}")]
    Seed {
        base: String,
        path: String,
        message: String,
    },
}

/// Result type alias for Sumi-Sift operations
pub type Result<T> = std::result::Result<T, SiftError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{DiscoveryReport, Fetcher, HttpFetcher, TraversalEngine};
pub use state::{DiscoveredUrl, TraversalState, UrlKind};
pub use storage::{InsertOutcome, Ledger, SqliteStorage};
pub use url::{build_seed_urls, classify};
