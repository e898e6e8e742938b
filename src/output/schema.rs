//! Report database schema
//!
//! The `pages` and `links` tables are the two sheets of the audit workbook;
//! `diff_pages` and `diffs` hold compare-mode results.

/// SQL schema for the report database
pub const SCHEMA_SQL: &str = r#"
-- One row per crawl or compare run
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    mode TEXT NOT NULL,
    start_url TEXT NOT NULL,
    phase TEXT NOT NULL,
    started_at TEXT NOT NULL,
    finished_at TEXT NOT NULL,
    config_hash TEXT NOT NULL
);

-- Crawl summary sheet
CREATE TABLE IF NOT EXISTS pages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id INTEGER NOT NULL REFERENCES runs(id),
    page_order INTEGER NOT NULL,
    url TEXT NOT NULL,
    final_url TEXT,
    title TEXT NOT NULL,
    fetch_status TEXT NOT NULL,
    error_message TEXT,
    links_captured INTEGER NOT NULL,
    depth INTEGER NOT NULL,
    UNIQUE(run_id, page_order)
);

CREATE INDEX IF NOT EXISTS idx_pages_run ON pages(run_id);

-- Links sheet
CREATE TABLE IF NOT EXISTS links (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id INTEGER NOT NULL REFERENCES runs(id),
    position INTEGER NOT NULL,
    source_url TEXT NOT NULL,
    source_title TEXT NOT NULL,
    screenshot BLOB,
    link_text TEXT NOT NULL,
    raw_href TEXT NOT NULL,
    absolute_url TEXT,
    resolved_url TEXT,
    http_status TEXT,
    error_message TEXT,
    target TEXT NOT NULL,
    rel TEXT NOT NULL,
    scope TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_links_run ON links(run_id);
CREATE INDEX IF NOT EXISTS idx_links_source ON links(source_url);

-- Compare mode: per-page counts
CREATE TABLE IF NOT EXISTS diff_pages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id INTEGER NOT NULL REFERENCES runs(id),
    page_order INTEGER NOT NULL,
    baseline_url TEXT NOT NULL,
    upgraded_url TEXT NOT NULL,
    baseline_title TEXT NOT NULL,
    upgraded_title TEXT NOT NULL,
    baseline_status TEXT NOT NULL,
    upgraded_status TEXT NOT NULL,
    missing INTEGER NOT NULL,
    extra INTEGER NOT NULL,
    wrong INTEGER NOT NULL
);

-- Compare mode: one row per difference
CREATE TABLE IF NOT EXISTS diffs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id INTEGER NOT NULL REFERENCES runs(id),
    page_order INTEGER NOT NULL,
    kind TEXT NOT NULL,
    link_text TEXT NOT NULL,
    baseline_target TEXT NOT NULL,
    upgraded_target TEXT NOT NULL,
    baseline_status TEXT NOT NULL,
    upgraded_status TEXT NOT NULL,
    note TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_diffs_run ON diffs(run_id);
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
