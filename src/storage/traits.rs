//! Storage traits and error types
//!
//! This module defines the ledger interface the traversal depends on and
//! the error type shared by storage backends.

use crate::state::{DiscoveredUrl, UrlKind};
use crate::storage::{PageText, RunRecord, RunStatus};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors that can occur during storage operations
///
/// Every variant is fatal for a discovery run: without a working ledger
/// the traversal cannot guarantee that each URL is recorded once.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("Corrupt record for {url}: {message}")]
    CorruptRecord { url: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Outcome of a ledger insert
///
/// A duplicate is an expected result, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The record was new and is now stored
    Inserted,

    /// A record for the URL already existed; nothing was written
    AlreadyExists,
}

impl InsertOutcome {
    pub fn is_inserted(&self) -> bool {
        matches!(self, Self::Inserted)
    }
}

/// The dedup ledger used by the traversal
///
/// Implementations must make `insert` an indivisible test-and-set enforced
/// by the store itself, so concurrent writers (including other processes
/// sharing the same store) can never produce two records for one URL.
pub trait Ledger {
    /// Returns true if a record for the URL exists
    fn exists(&self, url: &str) -> StorageResult<bool>;

    /// Inserts a record unless one already exists for its URL
    fn insert(&mut self, record: &DiscoveredUrl) -> StorageResult<InsertOutcome>;

    /// Gets the record for a URL
    fn get(&self, url: &str) -> StorageResult<Option<DiscoveredUrl>>;

    /// Gets the records listed by an expanded sitemap, in listing order
    ///
    /// This includes children whose winning insert came from another parent.
    fn children_of(&self, sitemap: &str) -> StorageResult<Vec<DiscoveredUrl>>;

    /// Records that a sitemap's children have all been recorded
    ///
    /// The marker and the listing are written together. First write wins;
    /// later calls for the same sitemap are no-ops.
    fn record_expansion(&mut self, url: &str, run_id: i64, children: &[String])
        -> StorageResult<()>;

    /// Returns true if the sitemap's expansion was recorded by any run
    fn is_expanded(&self, url: &str) -> StorageResult<bool>;

    /// Counts records of one kind
    fn count_by_kind(&self, kind: UrlKind) -> StorageResult<u64>;

    /// Counts records within the first `prefix` levels (`level < prefix`)
    fn count_by_level_prefix(&self, prefix: u32) -> StorageResult<u64>;

    /// Counts all records
    fn count_total(&self) -> StorageResult<u64>;

    /// Gets the number of records of a kind at each level
    fn level_breakdown(&self, kind: UrlKind) -> StorageResult<BTreeMap<u32, u64>>;

    /// Gets every recorded URL of a kind, ordered by level then URL
    fn urls_by_kind(&self, kind: UrlKind) -> StorageResult<Vec<DiscoveredUrl>>;
}

/// Run bookkeeping, kept separate from the ledger proper
pub trait RunStore {
    /// Creates a new run in the `running` state
    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent run
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;

    /// Sets a terminal status and the finish timestamp
    fn finish_run(&mut self, run_id: i64, status: RunStatus) -> StorageResult<()>;
}

/// Storage for retrieved page text
pub trait PageTextStore {
    /// Stores or replaces the text for a page
    fn save_page_text(&mut self, page: &PageText) -> StorageResult<()>;

    /// Gets the stored text for a page
    fn get_page_text(&self, url: &str) -> StorageResult<Option<PageText>>;

    /// Counts stored pages
    fn count_page_texts(&self) -> StorageResult<u64>;
}
