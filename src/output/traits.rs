//! Output error and summary types

use std::collections::BTreeMap;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] crate::storage::StorageError),

    #[error("No discovery runs found in database")]
    NoRuns,
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Summary of the ledger as of the latest run
#[derive(Debug, Clone, Default)]
pub struct DiscoverySummary {
    // Run metadata
    pub run_id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub duration_seconds: Option<u64>,
    pub status: String,
    pub config_hash: String,

    // Ledger totals
    pub total_urls: u64,
    pub total_pages: u64,
    pub total_sitemaps: u64,
    pub pages_with_text: u64,

    // Sitemaps listed directly by a seed vs. deeper in the tree
    pub first_level_sitemaps: Vec<String>,
    pub nested_sitemaps: Vec<String>,

    // Level -> count
    pub page_levels: BTreeMap<u32, u64>,
    pub sitemap_levels: BTreeMap<u32, u64>,
}

impl DiscoverySummary {
    /// Deepest level holding any record
    pub fn max_level(&self) -> Option<u32> {
        self.page_levels
            .keys()
            .chain(self.sitemap_levels.keys())
            .max()
            .copied()
    }

    /// Share of pages whose text has been retrieved, as a percentage
    pub fn retrieval_coverage(&self) -> f64 {
        if self.total_pages == 0 {
            return 0.0;
        }
        (self.pages_with_text as f64 / self.total_pages as f64) * 100.0
    }
}
