//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the ledger, run and
//! page text stores. URL uniqueness is enforced by a `UNIQUE` constraint, so
//! several processes sharing one database file still record each URL once.

use crate::state::{DiscoveredUrl, UrlKind};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{
    InsertOutcome, Ledger, PageTextStore, RunStore, StorageError, StorageResult,
};
use crate::storage::{PageText, RunRecord, RunStatus};
use crate::SiftError;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

/// How long a writer waits on a lock held by another connection
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const RECORD_COLUMNS: &str = "url, kind, level, parent, discovered_run, discovered_at";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens or creates the database at `path`
    pub fn new(path: &Path) -> Result<Self, SiftError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;
        conn.busy_timeout(BUSY_TIMEOUT)?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> Result<Self, SiftError> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

/// Maps a `RECORD_COLUMNS` row to a record
fn record_from_row(row: &Row<'_>) -> rusqlite::Result<(DiscoveredUrl, String)> {
    let kind: String = row.get(1)?;
    let record = DiscoveredUrl {
        url: row.get(0)?,
        kind: UrlKind::Page,
        level: row.get(2)?,
        parent: row.get(3)?,
        discovered_run: row.get(4)?,
        discovered_at: row.get(5)?,
    };
    Ok((record, kind))
}

/// Resolves the kind column, rejecting values this version does not know
fn resolve_kind((mut record, kind): (DiscoveredUrl, String)) -> StorageResult<DiscoveredUrl> {
    record.kind = UrlKind::from_db_string(&kind).ok_or_else(|| StorageError::CorruptRecord {
        url: record.url.clone(),
        message: format!("unknown kind '{}'", kind),
    })?;
    Ok(record)
}

impl Ledger for SqliteStorage {
    fn exists(&self, url: &str) -> StorageResult<bool> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM discovered_urls WHERE url = ?1",
                params![url],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn insert(&mut self, record: &DiscoveredUrl) -> StorageResult<InsertOutcome> {
        let changed = self.conn.execute(
            "INSERT INTO discovered_urls (url, kind, level, parent, discovered_run, discovered_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(url) DO NOTHING",
            params![
                record.url,
                record.kind.to_db_string(),
                record.level,
                record.parent,
                record.discovered_run,
                record.discovered_at,
            ],
        )?;

        if changed == 0 {
            Ok(InsertOutcome::AlreadyExists)
        } else {
            Ok(InsertOutcome::Inserted)
        }
    }

    fn get(&self, url: &str) -> StorageResult<Option<DiscoveredUrl>> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {} FROM discovered_urls WHERE url = ?1", RECORD_COLUMNS),
                params![url],
                record_from_row,
            )
            .optional()?;

        row.map(resolve_kind).transpose()
    }

    fn children_of(&self, sitemap: &str) -> StorageResult<Vec<DiscoveredUrl>> {
        let mut stmt = self.conn.prepare(
            "SELECT d.url, d.kind, d.level, d.parent, d.discovered_run, d.discovered_at
             FROM sitemap_entries e
             JOIN discovered_urls d ON d.url = e.url
             WHERE e.sitemap = ?1
             ORDER BY e.position",
        )?;

        let rows = stmt
            .query_map(params![sitemap], record_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(resolve_kind).collect()
    }

    fn record_expansion(
        &mut self,
        url: &str,
        run_id: i64,
        children: &[String],
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;

        let marked = tx.execute(
            "INSERT OR IGNORE INTO sitemap_expansions (url, run_id, child_count, expanded_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![url, run_id, children.len() as i64, now],
        )?;

        if marked > 0 {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO sitemap_entries (sitemap, position, url)
                 VALUES (?1, ?2, ?3)",
            )?;
            for (position, child) in children.iter().enumerate() {
                stmt.execute(params![url, position as i64, child])?;
            }
            drop(stmt);
        }

        tx.commit()?;
        Ok(())
    }

    fn is_expanded(&self, url: &str) -> StorageResult<bool> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM sitemap_expansions WHERE url = ?1",
                params![url],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn count_by_kind(&self, kind: UrlKind) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM discovered_urls WHERE kind = ?1",
            params![kind.to_db_string()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn count_by_level_prefix(&self, prefix: u32) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM discovered_urls WHERE level < ?1",
            params![prefix],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn count_total(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM discovered_urls", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn level_breakdown(&self, kind: UrlKind) -> StorageResult<BTreeMap<u32, u64>> {
        let mut stmt = self.conn.prepare(
            "SELECT level, COUNT(*) FROM discovered_urls WHERE kind = ?1 GROUP BY level",
        )?;

        let rows = stmt.query_map(params![kind.to_db_string()], |row| {
            Ok((row.get::<_, u32>(0)?, row.get::<_, i64>(1)?))
        })?;

        let mut breakdown = BTreeMap::new();
        for row in rows {
            let (level, count) = row?;
            breakdown.insert(level, count as u64);
        }

        Ok(breakdown)
    }

    fn urls_by_kind(&self, kind: UrlKind) -> StorageResult<Vec<DiscoveredUrl>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM discovered_urls WHERE kind = ?1 ORDER BY level, url",
            RECORD_COLUMNS
        ))?;

        let rows = stmt
            .query_map(params![kind.to_db_string()], record_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(resolve_kind).collect()
    }
}

impl RunStore for SqliteStorage {
    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (started_at, config_hash, status) VALUES (?1, ?2, ?3)",
            params![now, config_hash, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        self.conn
            .query_row(
                "SELECT id, started_at, finished_at, config_hash, status FROM runs WHERE id = ?1",
                params![run_id],
                run_from_row,
            )
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let run = self
            .conn
            .query_row(
                "SELECT id, started_at, finished_at, config_hash, status FROM runs ORDER BY id DESC LIMIT 1",
                [],
                run_from_row,
            )
            .optional()?;

        Ok(run)
    }

    fn finish_run(&mut self, run_id: i64, status: RunStatus) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let changed = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2 WHERE id = ?3",
            params![status.to_db_string(), now, run_id],
        )?;
        if changed == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        started_at: row.get(1)?,
        finished_at: row.get(2)?,
        config_hash: row.get(3)?,
        status: RunStatus::from_db_string(&row.get::<_, String>(4)?)
            .unwrap_or(RunStatus::Running),
    })
}

impl PageTextStore for SqliteStorage {
    fn save_page_text(&mut self, page: &PageText) -> StorageResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO page_texts (url, status_code, text, fetched_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![page.url, page.status_code, page.text, page.fetched_at],
        )?;
        Ok(())
    }

    fn get_page_text(&self, url: &str) -> StorageResult<Option<PageText>> {
        let page = self
            .conn
            .query_row(
                "SELECT url, status_code, text, fetched_at FROM page_texts WHERE url = ?1",
                params![url],
                |row| {
                    Ok(PageText {
                        url: row.get(0)?,
                        status_code: row.get(1)?,
                        text: row.get(2)?,
                        fetched_at: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(page)
    }

    fn count_page_texts(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM page_texts", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}
