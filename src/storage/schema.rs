//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the Sumi-Sift ledger.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Track discovery runs
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    status TEXT NOT NULL
);

-- The ledger: every URL ever discovered, recorded once
CREATE TABLE IF NOT EXISTS discovered_urls (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL UNIQUE,
    kind TEXT NOT NULL,
    level INTEGER NOT NULL,
    parent TEXT,
    discovered_run INTEGER NOT NULL,
    discovered_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_discovered_kind ON discovered_urls(kind);
CREATE INDEX IF NOT EXISTS idx_discovered_level ON discovered_urls(level);
CREATE INDEX IF NOT EXISTS idx_discovered_parent ON discovered_urls(parent);

-- Sitemaps whose children have all been recorded
CREATE TABLE IF NOT EXISTS sitemap_expansions (
    url TEXT PRIMARY KEY,
    run_id INTEGER NOT NULL,
    child_count INTEGER NOT NULL,
    expanded_at TEXT NOT NULL
);

-- Full listing of each expanded sitemap, in document order
CREATE TABLE IF NOT EXISTS sitemap_entries (
    sitemap TEXT NOT NULL,
    position INTEGER NOT NULL,
    url TEXT NOT NULL,
    PRIMARY KEY (sitemap, url)
);

-- Cleaned page text for downstream indexing
CREATE TABLE IF NOT EXISTS page_texts (
    url TEXT PRIMARY KEY,
    status_code INTEGER NOT NULL,
    text TEXT NOT NULL,
    fetched_at TEXT NOT NULL
);
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
