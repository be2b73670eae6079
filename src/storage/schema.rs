//! Database schema definitions
//!
//! All statements are idempotent so the schema can be ensured before every
//! dataset crawl.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Track crawl runs
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    dataset TEXT NOT NULL,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    status TEXT NOT NULL,
    pages_fetched INTEGER NOT NULL DEFAULT 0,
    pages_failed INTEGER NOT NULL DEFAULT 0,
    pages_skipped INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_runs_dataset ON runs(dataset);

-- One record per fetched (or attempted) page
CREATE TABLE IF NOT EXISTS pages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    dataset TEXT NOT NULL,
    url TEXT NOT NULL,
    status INTEGER NOT NULL,
    html TEXT,
    out_links TEXT NOT NULL DEFAULT '[]',
    fetched_at TEXT NOT NULL,
    error TEXT
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_pages_dataset_url ON pages(dataset, url);

-- Link graph between in-boundary pages
CREATE TABLE IF NOT EXISTS edges (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    dataset TEXT NOT NULL,
    from_url TEXT NOT NULL,
    to_url TEXT NOT NULL,
    CHECK (from_url <> to_url)
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_edges_dataset_from_to ON edges(dataset, from_url, to_url);
CREATE INDEX IF NOT EXISTS idx_edges_dataset_to ON edges(dataset, to_url);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
