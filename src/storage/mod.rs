//! Storage module for the discovery ledger
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - The uniqueness-constrained ledger of discovered URLs
//! - Sitemap expansion markers that make runs resumable
//! - Run tracking
//! - Retrieved page text for downstream indexing

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{InsertOutcome, Ledger, PageTextStore, RunStore, StorageError, StorageResult};

use crate::SiftError;
use std::path::Path;

/// Opens (creating if needed) a storage database
pub fn open_storage(path: &Path) -> Result<SqliteStorage, SiftError> {
    SqliteStorage::new(path)
}

/// Represents a discovery run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub status: RunStatus,
}

/// Status of a discovery run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Interrupted,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Interrupted => "interrupted",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "interrupted" => Some(Self::Interrupted),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// Cleaned text of one retrieved page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    pub url: String,
    pub status_code: u16,
    pub text: String,
    pub fetched_at: String,
}
