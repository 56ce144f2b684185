//! Database repository layer
//!
//! Provides the aggregate read queries consumed by the analyzers and the
//! write operations on the derived tables (metrics, recommendations,
//! patterns, analysis runs).

use crate::error::{Error, Result};
use crate::types::*;
use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Mutex;

/// Read counts for a single novel, joined with its average rating.
#[derive(Debug, Clone)]
pub struct NovelReadCount {
    /// Novel ID
    pub novel_id: String,
    /// Novel title
    pub title: String,
    /// Average review rating, 0 when unreviewed
    pub rating: f64,
    /// Total reading events
    pub read_count: i64,
}

/// Read counts for a named entity (genre or author).
#[derive(Debug, Clone)]
pub struct EntityReadCount {
    /// Genre or author name
    pub name: String,
    /// Total reading events across the entity's novels
    pub read_count: i64,
}

/// Genre-level demand aggregate.
#[derive(Debug, Clone)]
pub struct GenreDemandRow {
    /// Genre name
    pub genre: String,
    /// Novels carrying this genre
    pub novel_count: i64,
    /// Distinct readers with at least one read in the genre
    pub user_interest: i64,
    /// Total reading events in the genre
    pub read_count: i64,
}

/// Author-level engagement aggregate.
#[derive(Debug, Clone)]
pub struct AuthorEngagementRow {
    /// Author name
    pub author: String,
    /// Novels by this author
    pub novel_count: i64,
    /// Total reading events across the author's novels
    pub read_count: i64,
    /// Average review rating across the author's novels, 0 when unreviewed
    pub avg_rating: f64,
    /// Distinct readers across the author's novels
    pub unique_readers: i64,
}

/// Aggregate for a novel rated below the quality threshold.
#[derive(Debug, Clone)]
pub struct LowRatedNovelRow {
    /// Novel ID
    pub novel_id: String,
    /// Novel title
    pub title: String,
    /// Average review rating
    pub rating: f64,
    /// Library entries with status 'dropped'
    pub dropped_count: i64,
    /// Total library entries
    pub total_in_library: i64,
}

/// Chapter-count bucket aggregate.
#[derive(Debug, Clone)]
pub struct LengthBucketRow {
    /// Bucket label ('short', 'medium', 'long')
    pub category: String,
    /// Novels in the bucket
    pub novel_count: i64,
    /// Total reading events across the bucket's novels
    pub read_count: i64,
    /// Completed library entries across the bucket's novels
    pub completed_count: i64,
}

/// Tag-level demand aggregate.
#[derive(Debug, Clone)]
pub struct TagDemandRow {
    /// Tag name
    pub tag: String,
    /// Novels carrying this tag
    pub novel_count: i64,
    /// Total reader votes across the tag's novels
    pub total_votes: i64,
}

/// Completion-status distribution over the whole library.
#[derive(Debug, Clone, Default)]
pub struct CompletionDistribution {
    /// Total library entries
    pub total: i64,
    /// Entries with status 'completed'
    pub completed: i64,
    /// Entries with status 'reading'
    pub reading: i64,
    /// Entries with status 'dropped'
    pub dropped: i64,
    /// Entries with status 'plan_to_read'
    pub plan_to_read: i64,
}

/// Database handle with connection pooling (single connection for now)
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open or create a database at the given path
    pub fn open(path: &PathBuf) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        // Enable foreign keys and WAL mode for better concurrency
        conn.execute_batch(
            "
            PRAGMA foreign_keys = ON;
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            ",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run migrations on this database
    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        super::schema::run_migrations(&conn)
    }

    /// Get the underlying connection (for advanced use)
    pub fn connection(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap()
    }

    /// Parse an RFC3339 timestamp from storage, falling back to now.
    fn parse_ts(value: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(value)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now())
    }

    /// Parse a metadata column from SQLite's dynamic type into JSON.
    ///
    /// Metadata is stored as JSON text but old rows may hold NULL; decode
    /// tolerantly rather than failing the whole read.
    fn parse_metadata(value_ref: rusqlite::types::ValueRef<'_>) -> serde_json::Value {
        match value_ref {
            rusqlite::types::ValueRef::Text(s) => {
                let s = std::str::from_utf8(s).unwrap_or("null");
                serde_json::from_str(s).unwrap_or(serde_json::json!({}))
            }
            _ => serde_json::json!({}),
        }
    }

    // ============================================
    // Catalog snapshot writes (host ingestion)
    // ============================================

    /// Insert or update an author
    pub fn upsert_author(&self, id: &str, name: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            r#"
            INSERT INTO authors (id, name, created_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(id) DO UPDATE SET name = excluded.name
            "#,
            params![id, name, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    /// Insert or update a novel
    pub fn upsert_novel(
        &self,
        id: &str,
        title: &str,
        author_id: Option<&str>,
        chapter_count: i64,
    ) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            r#"
            INSERT INTO novels (id, title, author_id, chapter_count, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                author_id = excluded.author_id,
                chapter_count = excluded.chapter_count
            "#,
            params![id, title, author_id, chapter_count, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    /// Insert or update a genre
    pub fn upsert_genre(&self, id: &str, name: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO genres (id, name) VALUES (?1, ?2) ON CONFLICT(id) DO UPDATE SET name = excluded.name",
            params![id, name],
        )?;
        Ok(())
    }

    /// Attach a genre to a novel
    pub fn link_novel_genre(&self, novel_id: &str, genre_id: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT OR IGNORE INTO novel_genres (novel_id, genre_id) VALUES (?1, ?2)",
            params![novel_id, genre_id],
        )?;
        Ok(())
    }

    /// Insert or update a tag
    pub fn upsert_tag(&self, id: &str, name: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO tags (id, name) VALUES (?1, ?2) ON CONFLICT(id) DO UPDATE SET name = excluded.name",
            params![id, name],
        )?;
        Ok(())
    }

    /// Attach a tag to a novel with its vote count
    pub fn upsert_novel_tag(&self, novel_id: &str, tag_id: &str, votes: i64) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            r#"
            INSERT INTO novel_tags (novel_id, tag_id, votes)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(novel_id, tag_id) DO UPDATE SET votes = excluded.votes
            "#,
            params![novel_id, tag_id, votes],
        )?;
        Ok(())
    }

    /// Insert or update a reader's shelf entry for a novel
    pub fn upsert_library_entry(
        &self,
        user_id: &str,
        novel_id: &str,
        status: LibraryStatus,
    ) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            r#"
            INSERT INTO library_entries (user_id, novel_id, status, added_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(user_id, novel_id) DO UPDATE SET status = excluded.status
            "#,
            params![user_id, novel_id, status.as_str(), Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    /// Record one chapter read; `reading_time` in seconds, None when unknown
    pub fn insert_reading_event(
        &self,
        user_id: &str,
        novel_id: &str,
        chapter: i64,
        read_at: DateTime<Utc>,
        reading_time: Option<i64>,
    ) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            r#"
            INSERT INTO reading_history (user_id, novel_id, chapter, read_at, reading_time)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![user_id, novel_id, chapter, read_at.to_rfc3339(), reading_time],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Record a review
    pub fn insert_review(&self, user_id: &str, novel_id: &str, rating: f64) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            r#"
            INSERT INTO reviews (user_id, novel_id, rating, created_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![user_id, novel_id, rating, Utc::now().to_rfc3339()],
        )?;
        Ok(conn.last_insert_rowid())
    }

    // ============================================
    // Aggregate reads (scalar)
    // ============================================

    /// Mean of positive reading times across all reading events, in seconds.
    ///
    /// Records with NULL or non-positive times are excluded; 0 with no data.
    pub fn average_reading_time(&self) -> Result<f64> {
        let conn = self.conn.lock().unwrap();
        let avg: f64 = conn.query_row(
            "SELECT COALESCE(AVG(reading_time), 0) FROM reading_history WHERE reading_time > 0",
            [],
            |r| r.get(0),
        )?;
        Ok(avg)
    }

    /// Percentage of library entries with status 'dropped'; 0 with no entries.
    pub fn abandonment_rate(&self) -> Result<f64> {
        let conn = self.conn.lock().unwrap();
        let (total, dropped): (i64, i64) = conn.query_row(
            r#"
            SELECT COUNT(*),
                   COALESCE(SUM(CASE WHEN status = 'dropped' THEN 1 ELSE 0 END), 0)
            FROM library_entries
            "#,
            [],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )?;

        if total == 0 {
            return Ok(0.0);
        }
        Ok(dropped as f64 / total as f64 * 100.0)
    }

    /// Distinct readers with a reading event in the trailing window.
    pub fn active_users(&self, window_days: u32) -> Result<i64> {
        let cutoff = Utc::now() - Duration::days(window_days as i64);
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row(
            "SELECT COUNT(DISTINCT user_id) FROM reading_history WHERE read_at >= ?",
            [cutoff.to_rfc3339()],
            |r| r.get(0),
        )?;
        Ok(count)
    }

    /// Mean reading-event count per distinct reader; 0 with no readers.
    pub fn average_chapters_read(&self) -> Result<f64> {
        let conn = self.conn.lock().unwrap();
        let avg: f64 = conn.query_row(
            r#"
            SELECT COALESCE(AVG(cnt), 0)
            FROM (SELECT COUNT(*) AS cnt FROM reading_history GROUP BY user_id)
            "#,
            [],
            |r| r.get(0),
        )?;
        Ok(avg)
    }

    // ============================================
    // Aggregate reads (ranked lists)
    // ============================================

    /// Top novels by read count, outer-joined so unread novels rank last.
    pub fn top_novels(&self, limit: usize) -> Result<Vec<NovelReadCount>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            r#"
            SELECT n.id, n.title,
                   COALESCE(r.avg_rating, 0) AS rating,
                   COALESCE(h.reads, 0) AS reads
            FROM novels n
            LEFT JOIN (SELECT novel_id, COUNT(*) AS reads FROM reading_history GROUP BY novel_id) h
                ON h.novel_id = n.id
            LEFT JOIN (SELECT novel_id, AVG(rating) AS avg_rating FROM reviews GROUP BY novel_id) r
                ON r.novel_id = n.id
            ORDER BY reads DESC
            LIMIT ?
            "#,
        )?;

        let rows = stmt
            .query_map([limit as i64], |row| {
                Ok(NovelReadCount {
                    novel_id: row.get(0)?,
                    title: row.get(1)?,
                    rating: row.get(2)?,
                    read_count: row.get(3)?,
                })
            })?
            .filter_map(|r| r.ok())
            .collect();

        Ok(rows)
    }

    /// Top genres by read count.
    pub fn top_genres(&self, limit: usize) -> Result<Vec<EntityReadCount>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            r#"
            SELECT g.name, COUNT(h.id) AS reads
            FROM genres g
            LEFT JOIN novel_genres ng ON ng.genre_id = g.id
            LEFT JOIN reading_history h ON h.novel_id = ng.novel_id
            GROUP BY g.id
            ORDER BY reads DESC
            LIMIT ?
            "#,
        )?;

        let rows = stmt
            .query_map([limit as i64], |row| {
                Ok(EntityReadCount {
                    name: row.get(0)?,
                    read_count: row.get(1)?,
                })
            })?
            .filter_map(|r| r.ok())
            .collect();

        Ok(rows)
    }

    /// Top authors by read count.
    pub fn top_authors(&self, limit: usize) -> Result<Vec<EntityReadCount>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            r#"
            SELECT a.name, COUNT(h.id) AS reads
            FROM authors a
            LEFT JOIN novels n ON n.author_id = a.id
            LEFT JOIN reading_history h ON h.novel_id = n.id
            GROUP BY a.id
            ORDER BY reads DESC
            LIMIT ?
            "#,
        )?;

        let rows = stmt
            .query_map([limit as i64], |row| {
                Ok(EntityReadCount {
                    name: row.get(0)?,
                    read_count: row.get(1)?,
                })
            })?
            .filter_map(|r| r.ok())
            .collect();

        Ok(rows)
    }

    // ============================================
    // Aggregate reads (analyzer inputs)
    // ============================================

    /// Per-genre demand aggregate, most-read genres first.
    pub fn genre_demand(&self) -> Result<Vec<GenreDemandRow>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            r#"
            SELECT g.name,
                   COUNT(DISTINCT ng.novel_id) AS novel_count,
                   COUNT(DISTINCT h.user_id) AS user_interest,
                   COUNT(h.id) AS read_count
            FROM genres g
            LEFT JOIN novel_genres ng ON ng.genre_id = g.id
            LEFT JOIN reading_history h ON h.novel_id = ng.novel_id
            GROUP BY g.id
            ORDER BY read_count DESC
            "#,
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok(GenreDemandRow {
                    genre: row.get(0)?,
                    novel_count: row.get(1)?,
                    user_interest: row.get(2)?,
                    read_count: row.get(3)?,
                })
            })?
            .filter_map(|r| r.ok())
            .collect();

        Ok(rows)
    }

    /// Per-author engagement aggregate, most-read authors first.
    pub fn author_engagement(&self) -> Result<Vec<AuthorEngagementRow>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            r#"
            SELECT a.name,
                   (SELECT COUNT(*) FROM novels n WHERE n.author_id = a.id) AS novel_count,
                   (SELECT COUNT(*) FROM reading_history h
                     JOIN novels n ON n.id = h.novel_id WHERE n.author_id = a.id) AS read_count,
                   (SELECT COALESCE(AVG(r.rating), 0) FROM reviews r
                     JOIN novels n ON n.id = r.novel_id WHERE n.author_id = a.id) AS avg_rating,
                   (SELECT COUNT(DISTINCT h.user_id) FROM reading_history h
                     JOIN novels n ON n.id = h.novel_id WHERE n.author_id = a.id) AS unique_readers
            FROM authors a
            ORDER BY read_count DESC
            "#,
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok(AuthorEngagementRow {
                    author: row.get(0)?,
                    novel_count: row.get(1)?,
                    read_count: row.get(2)?,
                    avg_rating: row.get(3)?,
                    unique_readers: row.get(4)?,
                })
            })?
            .filter_map(|r| r.ok())
            .collect();

        Ok(rows)
    }

    /// Novels averaging below `max_rating` that appear in at least one library.
    pub fn low_rated_novels(&self, max_rating: f64) -> Result<Vec<LowRatedNovelRow>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            r#"
            SELECT n.id, n.title, r.avg_rating,
                   COALESCE(le.dropped, 0) AS dropped_count,
                   COALESCE(le.total, 0) AS total_in_library
            FROM novels n
            JOIN (SELECT novel_id, AVG(rating) AS avg_rating FROM reviews GROUP BY novel_id) r
                ON r.novel_id = n.id
            LEFT JOIN (SELECT novel_id,
                              SUM(CASE WHEN status = 'dropped' THEN 1 ELSE 0 END) AS dropped,
                              COUNT(*) AS total
                       FROM library_entries GROUP BY novel_id) le
                ON le.novel_id = n.id
            WHERE r.avg_rating < ?1 AND COALESCE(le.total, 0) > 0
            ORDER BY r.avg_rating ASC
            "#,
        )?;

        let rows = stmt
            .query_map([max_rating], |row| {
                Ok(LowRatedNovelRow {
                    novel_id: row.get(0)?,
                    title: row.get(1)?,
                    rating: row.get(2)?,
                    dropped_count: row.get(3)?,
                    total_in_library: row.get(4)?,
                })
            })?
            .filter_map(|r| r.ok())
            .collect();

        Ok(rows)
    }

    /// Chapter-count bucket aggregate, most-read buckets first.
    ///
    /// Buckets: short (under 50 chapters), medium (50-200), long (over 200).
    pub fn chapter_length_buckets(&self) -> Result<Vec<LengthBucketRow>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            r#"
            SELECT category,
                   COUNT(*) AS novel_count,
                   SUM(reads) AS read_count,
                   SUM(completed) AS completed_count
            FROM (
                SELECT CASE
                         WHEN n.chapter_count < 50 THEN 'short'
                         WHEN n.chapter_count <= 200 THEN 'medium'
                         ELSE 'long'
                       END AS category,
                       (SELECT COUNT(*) FROM reading_history h WHERE h.novel_id = n.id) AS reads,
                       (SELECT COUNT(*) FROM library_entries le
                         WHERE le.novel_id = n.id AND le.status = 'completed') AS completed
                FROM novels n
            )
            GROUP BY category
            ORDER BY read_count DESC
            "#,
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok(LengthBucketRow {
                    category: row.get(0)?,
                    novel_count: row.get(1)?,
                    read_count: row.get(2)?,
                    completed_count: row.get(3)?,
                })
            })?
            .filter_map(|r| r.ok())
            .collect();

        Ok(rows)
    }

    /// Per-tag demand aggregate, most-voted tags first.
    pub fn tag_demand(&self) -> Result<Vec<TagDemandRow>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            r#"
            SELECT t.name,
                   COUNT(nt.novel_id) AS novel_count,
                   COALESCE(SUM(nt.votes), 0) AS total_votes
            FROM tags t
            LEFT JOIN novel_tags nt ON nt.tag_id = t.id
            GROUP BY t.id
            ORDER BY total_votes DESC
            "#,
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok(TagDemandRow {
                    tag: row.get(0)?,
                    novel_count: row.get(1)?,
                    total_votes: row.get(2)?,
                })
            })?
            .filter_map(|r| r.ok())
            .collect();

        Ok(rows)
    }

    /// Completion-status distribution over all library entries.
    pub fn completion_distribution(&self) -> Result<CompletionDistribution> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            r#"
            SELECT COUNT(*),
                   COALESCE(SUM(CASE WHEN status = 'completed' THEN 1 ELSE 0 END), 0),
                   COALESCE(SUM(CASE WHEN status = 'reading' THEN 1 ELSE 0 END), 0),
                   COALESCE(SUM(CASE WHEN status = 'dropped' THEN 1 ELSE 0 END), 0),
                   COALESCE(SUM(CASE WHEN status = 'plan_to_read' THEN 1 ELSE 0 END), 0)
            FROM library_entries
            "#,
            [],
            |row| {
                Ok(CompletionDistribution {
                    total: row.get(0)?,
                    completed: row.get(1)?,
                    reading: row.get(2)?,
                    dropped: row.get(3)?,
                    plan_to_read: row.get(4)?,
                })
            },
        )
        .map_err(Error::from)
    }

    // ============================================
    // Metric operations
    // ============================================

    /// Append a metric row. Metrics are never updated in place.
    ///
    /// Returns the ID of the inserted row.
    pub fn insert_metric(&self, metric: &Metric) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            r#"
            INSERT INTO metrics (metric_type, name, value, computed_at, metadata)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                metric.metric_type.as_str(),
                metric.name,
                metric.value,
                metric.computed_at.to_rfc3339(),
                serde_json::to_string(&metric.metadata).unwrap_or_else(|_| "{}".to_string()),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// List stored metrics, newest first, optionally filtered by type.
    pub fn list_metrics(&self, metric_type: Option<MetricType>, limit: usize) -> Result<Vec<Metric>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            r#"
            SELECT id, metric_type, name, value, computed_at, metadata
            FROM metrics
            WHERE (?1 IS NULL OR metric_type = ?1)
            ORDER BY computed_at DESC, id DESC
            LIMIT ?2
            "#,
        )?;

        let rows = stmt
            .query_map(
                params![metric_type.map(|t| t.as_str()), limit as i64],
                Self::row_to_metric,
            )?
            .filter_map(|r| r.ok())
            .collect();

        Ok(rows)
    }

    fn row_to_metric(row: &Row) -> rusqlite::Result<Metric> {
        let type_str: String = row.get("metric_type")?;
        let computed_at_str: String = row.get("computed_at")?;

        Ok(Metric {
            id: row.get("id")?,
            metric_type: MetricType::from_str(&type_str).unwrap_or(MetricType::Engagement),
            name: row.get("name")?,
            value: row.get("value")?,
            computed_at: Self::parse_ts(&computed_at_str),
            metadata: Self::parse_metadata(row.get_ref("metadata")?),
        })
    }

    // ============================================
    // Recommendation operations
    // ============================================

    /// Save a candidate recommendation, skipping duplicates.
    ///
    /// `(rec_type, title)` is unique among rows not yet implemented; a
    /// candidate matching an open row is silently dropped and `None` is
    /// returned. The conflict target is the partial unique index, so the
    /// check and the insert are a single atomic statement.
    pub fn save_recommendation(
        &self,
        candidate: &NewRecommendation,
    ) -> Result<Option<Recommendation>> {
        let created_at = Utc::now();
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute(
            r#"
            INSERT INTO recommendations
                (rec_type, title, description, priority, confidence, created_at, is_read, is_implemented, metadata)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, 0, ?7)
            ON CONFLICT(rec_type, title) WHERE is_implemented = 0 DO NOTHING
            "#,
            params![
                candidate.rec_type.as_str(),
                candidate.title,
                candidate.description,
                candidate.priority.as_i64(),
                candidate.confidence,
                created_at.to_rfc3339(),
                serde_json::to_string(&candidate.metadata).unwrap_or_else(|_| "{}".to_string()),
            ],
        )?;

        if changed == 0 {
            return Ok(None);
        }

        Ok(Some(Recommendation {
            id: conn.last_insert_rowid(),
            rec_type: candidate.rec_type,
            title: candidate.title.clone(),
            description: candidate.description.clone(),
            priority: candidate.priority,
            confidence: candidate.confidence,
            created_at,
            is_read: false,
            is_implemented: false,
            metadata: candidate.metadata.clone(),
        }))
    }

    /// Get a recommendation by ID
    pub fn get_recommendation(&self, id: i64) -> Result<Option<Recommendation>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT id, rec_type, title, description, priority, confidence, created_at, is_read, is_implemented, metadata
             FROM recommendations WHERE id = ?",
            [id],
            Self::row_to_recommendation,
        )
        .optional()
        .map_err(Error::from)
    }

    /// List recommendations matching a status filter, highest priority first.
    pub fn list_recommendations(&self, filter: StatusFilter) -> Result<Vec<Recommendation>> {
        let conn = self.conn.lock().unwrap();
        let sql = format!(
            "SELECT id, rec_type, title, description, priority, confidence, created_at, is_read, is_implemented, metadata
             FROM recommendations WHERE {}
             ORDER BY priority DESC, confidence DESC, created_at DESC",
            filter.as_predicate()
        );
        let mut stmt = conn.prepare(&sql)?;

        let rows = stmt
            .query_map([], Self::row_to_recommendation)?
            .filter_map(|r| r.ok())
            .collect();

        Ok(rows)
    }

    /// Count recommendations matching a status filter.
    pub fn count_recommendations(&self, filter: StatusFilter) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        let sql = format!(
            "SELECT COUNT(*) FROM recommendations WHERE {}",
            filter.as_predicate()
        );
        let count: i64 = conn.query_row(&sql, [], |r| r.get(0))?;
        Ok(count)
    }

    /// Mark a recommendation as read.
    ///
    /// Returns false when the row does not exist.
    pub fn mark_recommendation_read(&self, id: i64) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute("UPDATE recommendations SET is_read = 1 WHERE id = ?", [id])?;
        Ok(changed > 0)
    }

    /// Mark a recommendation as implemented. Implemented implies read.
    pub fn mark_recommendation_implemented(&self, id: i64) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute(
            "UPDATE recommendations SET is_implemented = 1, is_read = 1 WHERE id = ?",
            [id],
        )?;
        Ok(changed > 0)
    }

    /// Revert an implemented recommendation back to read.
    pub fn revert_recommendation_to_read(&self, id: i64) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute(
            "UPDATE recommendations SET is_implemented = 0, is_read = 1 WHERE id = ?",
            [id],
        )?;
        Ok(changed > 0)
    }

    /// Revert a recommendation to pending (unread, unimplemented).
    pub fn revert_recommendation_to_pending(&self, id: i64) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute(
            "UPDATE recommendations SET is_implemented = 0, is_read = 0 WHERE id = ?",
            [id],
        )?;
        Ok(changed > 0)
    }

    /// Delete recommendations matching a status filter.
    ///
    /// Returns the number of deleted rows.
    pub fn delete_recommendations(&self, filter: StatusFilter) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        let sql = format!(
            "DELETE FROM recommendations WHERE {}",
            filter.as_predicate()
        );
        let deleted = conn.execute(&sql, [])?;
        Ok(deleted)
    }

    fn row_to_recommendation(row: &Row) -> rusqlite::Result<Recommendation> {
        let type_str: String = row.get("rec_type")?;
        let created_at_str: String = row.get("created_at")?;
        let priority: i64 = row.get("priority")?;

        Ok(Recommendation {
            id: row.get("id")?,
            rec_type: RecommendationType::from_str(&type_str)
                .unwrap_or(RecommendationType::Quality),
            title: row.get("title")?,
            description: row.get("description")?,
            priority: Priority::from_i64(priority),
            confidence: row.get("confidence")?,
            created_at: Self::parse_ts(&created_at_str),
            is_read: row.get::<_, i64>("is_read")? != 0,
            is_implemented: row.get::<_, i64>("is_implemented")? != 0,
            metadata: Self::parse_metadata(row.get_ref("metadata")?),
        })
    }

    // ============================================
    // Pattern operations
    // ============================================

    /// Save a pattern observation, refreshing duplicates in place.
    ///
    /// `(pattern_type, name)` is unique; an observation for an existing key
    /// overwrites value, confidence, frequency, timestamp and metadata in
    /// one atomic upsert. Returns the stored row.
    pub fn save_pattern(&self, observation: &PatternObservation) -> Result<Pattern> {
        let identified_at = Utc::now();
        {
            let conn = self.conn.lock().unwrap();
            conn.execute(
                r#"
                INSERT INTO patterns (pattern_type, name, value, frequency, confidence, identified_at, metadata)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                ON CONFLICT(pattern_type, name) DO UPDATE SET
                    value = excluded.value,
                    frequency = excluded.frequency,
                    confidence = excluded.confidence,
                    identified_at = excluded.identified_at,
                    metadata = excluded.metadata
                "#,
                params![
                    observation.pattern_type.as_str(),
                    observation.name,
                    observation.value,
                    observation.frequency,
                    observation.confidence,
                    identified_at.to_rfc3339(),
                    serde_json::to_string(&observation.metadata)
                        .unwrap_or_else(|_| "{}".to_string()),
                ],
            )?;
        }

        self.get_pattern(observation.pattern_type, &observation.name)?
            .ok_or_else(|| Error::Config("pattern missing after upsert".to_string()))
    }

    /// Get a pattern by its upsert key
    pub fn get_pattern(&self, pattern_type: PatternType, name: &str) -> Result<Option<Pattern>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT id, pattern_type, name, value, frequency, confidence, identified_at, metadata
             FROM patterns WHERE pattern_type = ?1 AND name = ?2",
            params![pattern_type.as_str(), name],
            Self::row_to_pattern,
        )
        .optional()
        .map_err(Error::from)
    }

    /// List all stored patterns
    pub fn list_patterns(&self) -> Result<Vec<Pattern>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, pattern_type, name, value, frequency, confidence, identified_at, metadata
             FROM patterns ORDER BY pattern_type, name",
        )?;

        let rows = stmt
            .query_map([], Self::row_to_pattern)?
            .filter_map(|r| r.ok())
            .collect();

        Ok(rows)
    }

    /// Count stored patterns
    pub fn count_patterns(&self) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM patterns", [], |r| r.get(0))?;
        Ok(count)
    }

    /// Delete all stored patterns.
    ///
    /// Patterns carry no lifecycle flags, so there is no narrower filter.
    /// Returns the number of deleted rows.
    pub fn delete_patterns(&self) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        let deleted = conn.execute("DELETE FROM patterns", [])?;
        Ok(deleted)
    }

    fn row_to_pattern(row: &Row) -> rusqlite::Result<Pattern> {
        let type_str: String = row.get("pattern_type")?;
        let identified_at_str: String = row.get("identified_at")?;

        Ok(Pattern {
            id: row.get("id")?,
            pattern_type: PatternType::from_str(&type_str)
                .unwrap_or(PatternType::EngagementPattern),
            name: row.get("name")?,
            value: row.get("value")?,
            frequency: row.get("frequency")?,
            confidence: row.get("confidence")?,
            identified_at: Self::parse_ts(&identified_at_str),
            metadata: Self::parse_metadata(row.get_ref("metadata")?),
        })
    }

    // ============================================
    // Analysis run records
    // ============================================

    /// Insert an analysis run record for observability.
    ///
    /// Returns the ID of the inserted record.
    pub fn insert_analysis_run(&self, run: &crate::analytics::AnalysisRunResult) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            r#"
            INSERT INTO analysis_runs (batch_id, analyzer, started_at, duration_ms, status, error_message, candidates_produced, saved_count)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                run.batch_id,
                run.analyzer,
                run.started_at.to_rfc3339(),
                run.duration_ms,
                run.status.as_str(),
                run.error_message,
                run.candidates_produced as i64,
                run.saved_count as i64,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Get recent runs for a specific analyzer.
    pub fn get_analysis_runs(
        &self,
        analyzer: &str,
        limit: usize,
    ) -> Result<Vec<crate::analytics::AnalysisRunResult>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            r#"
            SELECT batch_id, analyzer, started_at, duration_ms, status, error_message, candidates_produced, saved_count
            FROM analysis_runs
            WHERE analyzer = ?
            ORDER BY started_at DESC, id DESC
            LIMIT ?
            "#,
        )?;

        let runs = stmt
            .query_map(params![analyzer, limit as i64], |row| {
                let started_at_str: String = row.get(2)?;
                let status_str: String = row.get(4)?;
                Ok(crate::analytics::AnalysisRunResult {
                    batch_id: row.get(0)?,
                    analyzer: row.get(1)?,
                    started_at: Self::parse_ts(&started_at_str),
                    duration_ms: row.get(3)?,
                    status: crate::analytics::RunStatus::from_storage(&status_str),
                    error_message: row.get(5)?,
                    candidates_produced: row.get::<_, i64>(6)? as usize,
                    saved_count: row.get::<_, i64>(7)? as usize,
                })
            })?
            .filter_map(|r| r.ok())
            .collect();

        Ok(runs)
    }

    /// Get run statistics for observability.
    ///
    /// Returns (success_count, error_count, avg_duration_ms) for each analyzer.
    pub fn get_analyzer_stats(&self) -> Result<Vec<(String, i64, i64, f64)>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            r#"
            SELECT
                analyzer,
                SUM(CASE WHEN status = 'success' THEN 1 ELSE 0 END) as success_count,
                SUM(CASE WHEN status = 'error' THEN 1 ELSE 0 END) as error_count,
                AVG(duration_ms) as avg_duration
            FROM analysis_runs
            GROUP BY analyzer
            ORDER BY analyzer
            "#,
        )?;

        let stats = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, f64>(3)?,
                ))
            })?
            .filter_map(|r| r.ok())
            .collect();

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn test_db() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.migrate().unwrap();
        db
    }

    fn candidate(rec_type: RecommendationType, title: &str) -> NewRecommendation {
        NewRecommendation {
            rec_type,
            title: title.to_string(),
            description: "test description".to_string(),
            priority: Priority::Medium,
            confidence: 0.75,
            metadata: serde_json::json!({}),
        }
    }

    fn observation(name: &str, frequency: i64) -> PatternObservation {
        PatternObservation {
            pattern_type: PatternType::CompletionPattern,
            name: name.to_string(),
            value: format!("observed {} times", frequency),
            frequency,
            confidence: 0.95,
            metadata: serde_json::json!({}),
        }
    }

    // ============================================
    // Recommendation dedup and lifecycle
    // ============================================

    #[test]
    fn test_save_recommendation_skips_duplicate() {
        let db = test_db();

        let first = db
            .save_recommendation(&candidate(RecommendationType::Genre, "Expand Isekai"))
            .unwrap();
        assert!(first.is_some());

        // Same (type, title) while unimplemented: skipped, no error
        let second = db
            .save_recommendation(&candidate(RecommendationType::Genre, "Expand Isekai"))
            .unwrap();
        assert!(second.is_none());

        // Same title under a different type is a different key
        let other_type = db
            .save_recommendation(&candidate(RecommendationType::TagDemand, "Expand Isekai"))
            .unwrap();
        assert!(other_type.is_some());

        assert_eq!(db.count_recommendations(StatusFilter::All).unwrap(), 2);
    }

    #[test]
    fn test_dedup_is_case_sensitive() {
        let db = test_db();

        db.save_recommendation(&candidate(RecommendationType::Genre, "Expand Isekai"))
            .unwrap()
            .unwrap();
        let lowercase = db
            .save_recommendation(&candidate(RecommendationType::Genre, "expand isekai"))
            .unwrap();
        assert!(lowercase.is_some());
    }

    #[test]
    fn test_implemented_rows_exempt_from_dedup() {
        let db = test_db();

        let rec = db
            .save_recommendation(&candidate(RecommendationType::Author, "Feature Yuki Sato"))
            .unwrap()
            .unwrap();
        assert!(db.mark_recommendation_implemented(rec.id).unwrap());

        // Implemented rows leave the dedup index; the same proposal may return
        let again = db
            .save_recommendation(&candidate(RecommendationType::Author, "Feature Yuki Sato"))
            .unwrap();
        assert!(again.is_some());
    }

    #[test]
    fn test_implemented_implies_read() {
        let db = test_db();

        let rec = db
            .save_recommendation(&candidate(RecommendationType::Quality, "Review Cursed Blade"))
            .unwrap()
            .unwrap();
        assert!(!rec.is_read);

        // Implement straight from pending: read must be set too
        assert!(db.mark_recommendation_implemented(rec.id).unwrap());
        let stored = db.get_recommendation(rec.id).unwrap().unwrap();
        assert!(stored.is_read);
        assert!(stored.is_implemented);
    }

    #[test]
    fn test_lifecycle_reverts() {
        let db = test_db();

        let rec = db
            .save_recommendation(&candidate(RecommendationType::Length, "Acquire longer series"))
            .unwrap()
            .unwrap();
        db.mark_recommendation_implemented(rec.id).unwrap();

        db.revert_recommendation_to_read(rec.id).unwrap();
        let stored = db.get_recommendation(rec.id).unwrap().unwrap();
        assert!(stored.is_read);
        assert!(!stored.is_implemented);

        db.revert_recommendation_to_pending(rec.id).unwrap();
        let stored = db.get_recommendation(rec.id).unwrap().unwrap();
        assert!(!stored.is_read);
        assert!(!stored.is_implemented);
    }

    #[test]
    fn test_count_and_delete_by_filter() {
        let db = test_db();

        let pending = db
            .save_recommendation(&candidate(RecommendationType::Genre, "a"))
            .unwrap()
            .unwrap();
        let read = db
            .save_recommendation(&candidate(RecommendationType::Genre, "b"))
            .unwrap()
            .unwrap();
        let implemented = db
            .save_recommendation(&candidate(RecommendationType::Genre, "c"))
            .unwrap()
            .unwrap();
        db.mark_recommendation_read(read.id).unwrap();
        db.mark_recommendation_implemented(implemented.id).unwrap();

        assert_eq!(db.count_recommendations(StatusFilter::Pending).unwrap(), 1);
        assert_eq!(db.count_recommendations(StatusFilter::Read).unwrap(), 1);
        assert_eq!(
            db.count_recommendations(StatusFilter::Implemented).unwrap(),
            1
        );
        assert_eq!(db.count_recommendations(StatusFilter::All).unwrap(), 3);

        assert_eq!(db.delete_recommendations(StatusFilter::Read).unwrap(), 1);
        assert_eq!(db.count_recommendations(StatusFilter::All).unwrap(), 2);
        assert!(db.get_recommendation(pending.id).unwrap().is_some());
        assert!(db.get_recommendation(read.id).unwrap().is_none());

        assert_eq!(db.delete_recommendations(StatusFilter::All).unwrap(), 2);
        assert_eq!(db.count_recommendations(StatusFilter::All).unwrap(), 0);
    }

    // ============================================
    // Pattern upsert
    // ============================================

    #[test]
    fn test_save_pattern_refreshes_in_place() {
        let db = test_db();

        let first = db.save_pattern(&observation("library_completion", 100)).unwrap();
        assert_eq!(first.frequency, 100);

        let second = db.save_pattern(&observation("library_completion", 250)).unwrap();
        // Same row, refreshed fields, timestamp advanced or equal
        assert_eq!(second.id, first.id);
        assert_eq!(second.frequency, 250);
        assert_eq!(second.value, "observed 250 times");
        assert!(second.identified_at >= first.identified_at);

        assert_eq!(db.count_patterns().unwrap(), 1);
    }

    #[test]
    fn test_delete_patterns() {
        let db = test_db();
        db.save_pattern(&observation("a", 1)).unwrap();
        db.save_pattern(&observation("b", 2)).unwrap();

        assert_eq!(db.delete_patterns().unwrap(), 2);
        assert_eq!(db.count_patterns().unwrap(), 0);
    }

    // ============================================
    // Metrics
    // ============================================

    #[test]
    fn test_metrics_append_only() {
        let db = test_db();

        let metric = Metric {
            id: 0,
            metric_type: MetricType::Abandonment,
            name: "abandonment_rate".to_string(),
            value: 12.5,
            computed_at: Utc::now(),
            metadata: serde_json::json!({"window": "all"}),
        };

        db.insert_metric(&metric).unwrap();
        db.insert_metric(&metric).unwrap();

        // Two computation runs, two rows
        let stored = db.list_metrics(Some(MetricType::Abandonment), 10).unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].name, "abandonment_rate");
        assert_eq!(stored[0].metadata["window"], "all");
    }

    // ============================================
    // Aggregate reads
    // ============================================

    fn seed_catalog(db: &Database) {
        db.upsert_author("a1", "Yuki Sato").unwrap();
        db.upsert_author("a2", "Ren Aoki").unwrap();
        db.upsert_novel("n1", "Blade of Dawn", Some("a1"), 120).unwrap();
        db.upsert_novel("n2", "Tea Shop Chronicles", Some("a1"), 30).unwrap();
        db.upsert_novel("n3", "Cursed Blade", Some("a2"), 300).unwrap();
        db.upsert_genre("g1", "Isekai").unwrap();
        db.upsert_genre("g2", "Slice of Life").unwrap();
        db.link_novel_genre("n1", "g1").unwrap();
        db.link_novel_genre("n2", "g2").unwrap();
        db.link_novel_genre("n3", "g1").unwrap();
        db.upsert_tag("t1", "Time Travel").unwrap();
        db.upsert_novel_tag("n1", "t1", 7).unwrap();
        db.upsert_novel_tag("n3", "t1", 5).unwrap();
    }

    #[test]
    fn test_scalar_aggregates_empty_database() {
        let db = test_db();

        assert_eq!(db.average_reading_time().unwrap(), 0.0);
        assert_eq!(db.abandonment_rate().unwrap(), 0.0);
        assert_eq!(db.active_users(30).unwrap(), 0);
        assert_eq!(db.average_chapters_read().unwrap(), 0.0);

        let dist = db.completion_distribution().unwrap();
        assert_eq!(dist.total, 0);
    }

    #[test]
    fn test_average_reading_time_ignores_missing_times() {
        let db = test_db();
        seed_catalog(&db);

        let now = Utc::now();
        db.insert_reading_event("u1", "n1", 1, now, Some(300)).unwrap();
        db.insert_reading_event("u1", "n1", 2, now, Some(500)).unwrap();
        db.insert_reading_event("u1", "n1", 3, now, None).unwrap();
        db.insert_reading_event("u2", "n1", 1, now, Some(0)).unwrap();

        // NULL and non-positive times excluded: (300 + 500) / 2
        assert_eq!(db.average_reading_time().unwrap(), 400.0);
    }

    #[test]
    fn test_abandonment_rate() {
        let db = test_db();
        seed_catalog(&db);

        db.upsert_library_entry("u1", "n1", LibraryStatus::Completed).unwrap();
        db.upsert_library_entry("u2", "n1", LibraryStatus::Dropped).unwrap();
        db.upsert_library_entry("u3", "n1", LibraryStatus::Reading).unwrap();
        db.upsert_library_entry("u4", "n1", LibraryStatus::Dropped).unwrap();

        assert_eq!(db.abandonment_rate().unwrap(), 50.0);
    }

    #[test]
    fn test_active_users_window() {
        let db = test_db();
        seed_catalog(&db);

        let now = Utc::now();
        db.insert_reading_event("u1", "n1", 1, now, Some(60)).unwrap();
        db.insert_reading_event("u1", "n1", 2, now, Some(60)).unwrap();
        db.insert_reading_event("u2", "n1", 1, now - Duration::days(10), Some(60))
            .unwrap();
        db.insert_reading_event("u3", "n1", 1, now - Duration::days(45), Some(60))
            .unwrap();

        // u3 is outside the 30-day window; u1 counted once
        assert_eq!(db.active_users(30).unwrap(), 2);
        assert_eq!(db.active_users(60).unwrap(), 3);
    }

    #[test]
    fn test_top_novels_outer_join() {
        let db = test_db();
        seed_catalog(&db);

        let now = Utc::now();
        db.insert_reading_event("u1", "n1", 1, now, Some(60)).unwrap();
        db.insert_reading_event("u2", "n1", 1, now, Some(60)).unwrap();
        db.insert_reading_event("u1", "n2", 1, now, Some(60)).unwrap();
        db.insert_review("u1", "n1", 4.5).unwrap();
        db.insert_review("u2", "n1", 3.5).unwrap();

        let top = db.top_novels(10).unwrap();
        // All three novels present, unread n3 ranks last with zero reads
        assert_eq!(top.len(), 3);
        assert_eq!(top[0].novel_id, "n1");
        assert_eq!(top[0].read_count, 2);
        assert_eq!(top[0].rating, 4.0);
        assert_eq!(top[2].read_count, 0);
    }

    #[test]
    fn test_genre_demand_rows() {
        let db = test_db();
        seed_catalog(&db);

        let now = Utc::now();
        db.insert_reading_event("u1", "n1", 1, now, Some(60)).unwrap();
        db.insert_reading_event("u2", "n1", 2, now, Some(60)).unwrap();
        db.insert_reading_event("u1", "n3", 1, now, Some(60)).unwrap();

        let rows = db.genre_demand().unwrap();
        assert_eq!(rows.len(), 2);
        let isekai = rows.iter().find(|r| r.genre == "Isekai").unwrap();
        assert_eq!(isekai.novel_count, 2);
        assert_eq!(isekai.read_count, 3);
        assert_eq!(isekai.user_interest, 2);
    }

    #[test]
    fn test_author_engagement_rows() {
        let db = test_db();
        seed_catalog(&db);

        let now = Utc::now();
        db.insert_reading_event("u1", "n1", 1, now, Some(60)).unwrap();
        db.insert_reading_event("u2", "n2", 1, now, Some(60)).unwrap();
        db.insert_review("u1", "n1", 5.0).unwrap();
        db.insert_review("u2", "n2", 4.0).unwrap();

        let rows = db.author_engagement().unwrap();
        let sato = rows.iter().find(|r| r.author == "Yuki Sato").unwrap();
        assert_eq!(sato.novel_count, 2);
        assert_eq!(sato.read_count, 2);
        assert_eq!(sato.avg_rating, 4.5);
        assert_eq!(sato.unique_readers, 2);
    }

    #[test]
    fn test_low_rated_novels_requires_library_presence() {
        let db = test_db();
        seed_catalog(&db);

        db.insert_review("u1", "n1", 2.0).unwrap();
        db.insert_review("u1", "n3", 2.5).unwrap();
        // Only n3 sits in someone's library
        db.upsert_library_entry("u1", "n3", LibraryStatus::Dropped).unwrap();
        db.upsert_library_entry("u2", "n3", LibraryStatus::Reading).unwrap();

        let rows = db.low_rated_novels(3.5).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].novel_id, "n3");
        assert_eq!(rows[0].dropped_count, 1);
        assert_eq!(rows[0].total_in_library, 2);
    }

    #[test]
    fn test_chapter_length_buckets() {
        let db = test_db();
        seed_catalog(&db);

        let now = Utc::now();
        // n2 is short (30 chapters), n1 medium (120), n3 long (300)
        db.insert_reading_event("u1", "n2", 1, now, Some(60)).unwrap();
        db.insert_reading_event("u2", "n2", 1, now, Some(60)).unwrap();
        db.upsert_library_entry("u1", "n2", LibraryStatus::Completed).unwrap();

        let rows = db.chapter_length_buckets().unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].category, "short");
        assert_eq!(rows[0].read_count, 2);
        assert_eq!(rows[0].completed_count, 1);
    }

    #[test]
    fn test_tag_demand_rows() {
        let db = test_db();
        seed_catalog(&db);

        let rows = db.tag_demand().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].tag, "Time Travel");
        assert_eq!(rows[0].novel_count, 2);
        assert_eq!(rows[0].total_votes, 12);
    }

    #[test]
    fn test_completion_distribution() {
        let db = test_db();
        seed_catalog(&db);

        db.upsert_library_entry("u1", "n1", LibraryStatus::Completed).unwrap();
        db.upsert_library_entry("u2", "n1", LibraryStatus::Dropped).unwrap();
        db.upsert_library_entry("u3", "n2", LibraryStatus::PlanToRead).unwrap();
        db.upsert_library_entry("u4", "n3", LibraryStatus::Reading).unwrap();

        let dist = db.completion_distribution().unwrap();
        assert_eq!(dist.total, 4);
        assert_eq!(dist.completed, 1);
        assert_eq!(dist.reading, 1);
        assert_eq!(dist.dropped, 1);
        assert_eq!(dist.plan_to_read, 1);
    }
}
