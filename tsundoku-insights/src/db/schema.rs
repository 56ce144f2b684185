//! Database schema and migrations
//!
//! Uses SQLite with embedded migrations managed via PRAGMA user_version.

use rusqlite::Connection;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// SQL migrations, indexed by version number
const MIGRATIONS: &[&str] = &[
    // Version 1: Initial schema
    r#"
    -- ============================================
    -- LAYER 1: Catalog snapshot (host-owned data)
    -- ============================================
    -- The host application ingests and owns these tables; the engine only
    -- reads them through aggregate queries.

    CREATE TABLE IF NOT EXISTS authors (
        id               TEXT PRIMARY KEY,
        name             TEXT NOT NULL,
        created_at       DATETIME NOT NULL
    );

    CREATE TABLE IF NOT EXISTS novels (
        id               TEXT PRIMARY KEY,
        title            TEXT NOT NULL,
        author_id        TEXT REFERENCES authors(id),
        chapter_count    INTEGER NOT NULL DEFAULT 0,
        created_at       DATETIME NOT NULL,
        metadata         JSON
    );

    CREATE INDEX IF NOT EXISTS idx_novels_author ON novels(author_id);

    CREATE TABLE IF NOT EXISTS genres (
        id               TEXT PRIMARY KEY,
        name             TEXT NOT NULL UNIQUE
    );

    CREATE TABLE IF NOT EXISTS novel_genres (
        novel_id         TEXT NOT NULL REFERENCES novels(id),
        genre_id         TEXT NOT NULL REFERENCES genres(id),
        PRIMARY KEY (novel_id, genre_id)
    );

    CREATE INDEX IF NOT EXISTS idx_novel_genres_genre ON novel_genres(genre_id);

    CREATE TABLE IF NOT EXISTS tags (
        id               TEXT PRIMARY KEY,
        name             TEXT NOT NULL UNIQUE
    );

    CREATE TABLE IF NOT EXISTS novel_tags (
        novel_id         TEXT NOT NULL REFERENCES novels(id),
        tag_id           TEXT NOT NULL REFERENCES tags(id),
        votes            INTEGER NOT NULL DEFAULT 0,
        PRIMARY KEY (novel_id, tag_id)
    );

    CREATE INDEX IF NOT EXISTS idx_novel_tags_tag ON novel_tags(tag_id);

    -- One shelf row per (reader, novel); status drives completion stats
    CREATE TABLE IF NOT EXISTS library_entries (
        id               INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id          TEXT NOT NULL,
        novel_id         TEXT NOT NULL REFERENCES novels(id),
        status           TEXT NOT NULL,      -- 'reading', 'completed', 'dropped', 'plan_to_read'
        added_at         DATETIME NOT NULL,

        UNIQUE(user_id, novel_id)
    );

    CREATE INDEX IF NOT EXISTS idx_library_entries_novel ON library_entries(novel_id);
    CREATE INDEX IF NOT EXISTS idx_library_entries_status ON library_entries(status);

    -- One row per chapter read; reading_time in seconds, NULL when unknown
    CREATE TABLE IF NOT EXISTS reading_history (
        id               INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id          TEXT NOT NULL,
        novel_id         TEXT NOT NULL REFERENCES novels(id),
        chapter          INTEGER NOT NULL,
        read_at          DATETIME NOT NULL,
        reading_time     INTEGER
    );

    CREATE INDEX IF NOT EXISTS idx_reading_history_novel ON reading_history(novel_id);
    CREATE INDEX IF NOT EXISTS idx_reading_history_user ON reading_history(user_id);
    CREATE INDEX IF NOT EXISTS idx_reading_history_read_at ON reading_history(read_at);

    CREATE TABLE IF NOT EXISTS reviews (
        id               INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id          TEXT NOT NULL,
        novel_id         TEXT NOT NULL REFERENCES novels(id),
        rating           REAL NOT NULL,      -- 1.0 to 5.0
        created_at       DATETIME NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_reviews_novel ON reviews(novel_id);

    -- ============================================
    -- LAYER 2: Derived (regenerable)
    -- ============================================

    -- Append-only: each computation run inserts new rows
    CREATE TABLE IF NOT EXISTS metrics (
        id               INTEGER PRIMARY KEY AUTOINCREMENT,
        metric_type      TEXT NOT NULL,
        name             TEXT NOT NULL,
        value            REAL NOT NULL,
        computed_at      DATETIME NOT NULL,
        metadata         JSON
    );

    CREATE INDEX IF NOT EXISTS idx_metrics_type_name ON metrics(metric_type, name);

    CREATE TABLE IF NOT EXISTS recommendations (
        id               INTEGER PRIMARY KEY AUTOINCREMENT,
        rec_type         TEXT NOT NULL,
        title            TEXT NOT NULL,
        description      TEXT NOT NULL,
        priority         INTEGER NOT NULL,
        confidence       REAL NOT NULL,
        created_at       DATETIME NOT NULL,
        is_read          INTEGER NOT NULL DEFAULT 0,
        is_implemented   INTEGER NOT NULL DEFAULT 0,
        metadata         JSON
    );

    -- Dedup key among rows not yet implemented; implemented rows may be
    -- re-proposed under the same title
    CREATE UNIQUE INDEX IF NOT EXISTS ux_recommendations_open
        ON recommendations(rec_type, title) WHERE is_implemented = 0;

    CREATE INDEX IF NOT EXISTS idx_recommendations_state
        ON recommendations(is_implemented, is_read);

    CREATE TABLE IF NOT EXISTS patterns (
        id               INTEGER PRIMARY KEY AUTOINCREMENT,
        pattern_type     TEXT NOT NULL,
        name             TEXT NOT NULL,
        value            TEXT NOT NULL,
        frequency        INTEGER NOT NULL,
        confidence       REAL NOT NULL,
        identified_at    DATETIME NOT NULL,
        metadata         JSON,

        UNIQUE(pattern_type, name)
    );

    CREATE TABLE IF NOT EXISTS analysis_runs (
        id                  INTEGER PRIMARY KEY AUTOINCREMENT,
        batch_id            TEXT NOT NULL,
        analyzer            TEXT NOT NULL,
        started_at          DATETIME NOT NULL,
        duration_ms         INTEGER NOT NULL,
        status              TEXT NOT NULL,
        error_message       TEXT,
        candidates_produced INTEGER,
        saved_count         INTEGER
    );

    CREATE INDEX IF NOT EXISTS idx_analysis_runs_analyzer ON analysis_runs(analyzer, started_at);
    CREATE INDEX IF NOT EXISTS idx_analysis_runs_status ON analysis_runs(status) WHERE status != 'success';
    "#,
];

/// Run all pending migrations
pub fn run_migrations(conn: &Connection) -> crate::error::Result<()> {
    let current_version: i32 = conn
        .query_row("PRAGMA user_version", [], |r| r.get(0))
        .unwrap_or(0);

    tracing::info!(
        current_version,
        target_version = SCHEMA_VERSION,
        "Checking database migrations"
    );

    for (i, migration) in MIGRATIONS.iter().enumerate() {
        let version = (i + 1) as i32;
        if version > current_version {
            tracing::info!(version, "Running migration");
            conn.execute_batch(migration)?;
            conn.execute(&format!("PRAGMA user_version = {}", version), [])?;
        }
    }

    if current_version < SCHEMA_VERSION {
        tracing::info!(
            from = current_version,
            to = SCHEMA_VERSION,
            "Migrations complete"
        );
    }

    Ok(())
}

/// Get the current schema version from the database
pub fn get_schema_version(conn: &Connection) -> crate::error::Result<i32> {
    let version: i32 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
    Ok(version)
}
