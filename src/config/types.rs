use serde::Deserialize;

/// Main configuration structure for Sumi-Sift
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub discovery: DiscoveryConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
}

/// Sitemap discovery configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DiscoveryConfig {
    /// Site root that conventional sitemap paths are joined onto
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Conventional sitemap paths, resolved against `base_url`
    #[serde(rename = "seed-paths", default = "default_seed_paths")]
    pub seed_paths: Vec<String>,

    /// Extra absolute sitemap URLs to seed the traversal with
    #[serde(default)]
    pub seeds: Vec<String>,

    /// Maximum number of sitemap fetches in flight
    #[serde(rename = "max-concurrent-fetches", default = "default_max_concurrent_fetches")]
    pub max_concurrent_fetches: u32,

    /// Per-fetch timeout (milliseconds)
    #[serde(rename = "fetch-timeout-ms", default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,

    /// Deepest level whose children are still recorded; unlimited when unset
    #[serde(rename = "max-depth", default)]
    pub max_depth: Option<u32>,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite ledger file
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Path to the markdown summary file
    #[serde(rename = "summary-path")]
    pub summary_path: String,
}

/// Page text retrieval configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RetrievalConfig {
    /// Maximum number of page fetches in flight
    #[serde(rename = "max-concurrent-pages", default = "default_max_concurrent_pages")]
    pub max_concurrent_pages: u32,

    /// Number of characters of each page shown in logs
    #[serde(rename = "preview-chars", default = "default_preview_chars")]
    pub preview_chars: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            max_concurrent_pages: default_max_concurrent_pages(),
            preview_chars: default_preview_chars(),
        }
    }
}

fn default_seed_paths() -> Vec<String> {
    vec![
        "sitemap.xml".to_string(),
        "sitemap_index.xml".to_string(),
        "sitemaps/sitemap.xml".to_string(),
    ]
}

fn default_max_concurrent_fetches() -> u32 {
    8
}

fn default_fetch_timeout_ms() -> u64 {
    30_000
}

fn default_max_concurrent_pages() -> u32 {
    32
}

fn default_preview_chars() -> usize {
    500
}
