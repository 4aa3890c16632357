//! SQLite implementation of the record store.
//!
//! Implements `UserRepository` from `leafline-core`. The merge operation is
//! a single upsert whose SET clauses COALESCE each incoming field with the
//! stored one, giving the atomic field-level merge the two uncoordinated
//! writers (main flow and profile enrichment) rely on.

use chrono::{DateTime, Utc};
use sqlx::Row;
use uuid::Uuid;

use leafline_core::repository::UserRepository;
use leafline_types::error::RepositoryError;
use leafline_types::record::{Posting, Psid, UserPatch, UserRecord};

use super::pool::DatabasePool;

/// SQLite-backed implementation of `UserRepository`.
pub struct SqliteUserRepository {
    pool: DatabasePool,
}

impl SqliteUserRepository {
    /// Create a new repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

// ---------------------------------------------------------------------------
// Private row types for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

struct UserRow {
    psid: String,
    first_name: Option<String>,
    last_name: Option<String>,
    image_url: Option<String>,
    lat: Option<f64>,
    lng: Option<f64>,
    created_at: String,
    updated_at: String,
}

impl UserRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            psid: row.try_get("psid")?,
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            image_url: row.try_get("image_url")?,
            lat: row.try_get("lat")?,
            lng: row.try_get("lng")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_record(self, postings: Vec<Posting>) -> Result<UserRecord, RepositoryError> {
        let psid = Psid::new(self.psid)
            .ok_or_else(|| RepositoryError::Query("empty psid in users row".to_string()))?;
        Ok(UserRecord {
            psid,
            first_name: self.first_name,
            last_name: self.last_name,
            image_url: self.image_url,
            lat: self.lat,
            lng: self.lng,
            postings,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

struct PostingRow {
    id: String,
    image_url: Option<String>,
    lat: Option<f64>,
    lng: Option<f64>,
    created_at_ms: i64,
}

impl PostingRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            image_url: row.try_get("image_url")?,
            lat: row.try_get("lat")?,
            lng: row.try_get("lng")?,
            created_at_ms: row.try_get("created_at_ms")?,
        })
    }

    fn into_posting(self) -> Result<Posting, RepositoryError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| RepositoryError::Query(format!("invalid posting id: {e}")))?;
        Ok(Posting {
            id,
            image_url: self.image_url,
            lat: self.lat,
            lng: self.lng,
            created_at_ms: self.created_at_ms,
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

// ---------------------------------------------------------------------------
// UserRepository implementation
// ---------------------------------------------------------------------------

impl UserRepository for SqliteUserRepository {
    async fn get(&self, psid: &Psid) -> Result<Option<UserRecord>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM users WHERE psid = ?")
            .bind(psid.as_str())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let user_row = UserRow::from_row(&row).map_err(|e| RepositoryError::Query(e.to_string()))?;

        // rowid preserves insertion order exactly; posting ids are v7 and
        // mostly sorted too, but not within a single millisecond.
        let posting_rows = sqlx::query(
            "SELECT id, image_url, lat, lng, created_at_ms FROM postings WHERE psid = ? ORDER BY rowid",
        )
        .bind(psid.as_str())
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut postings = Vec::with_capacity(posting_rows.len());
        for row in &posting_rows {
            let posting_row =
                PostingRow::from_row(row).map_err(|e| RepositoryError::Query(e.to_string()))?;
            postings.push(posting_row.into_posting()?);
        }

        Ok(Some(user_row.into_record(postings)?))
    }

    async fn merge(&self, psid: &Psid, patch: &UserPatch) -> Result<(), RepositoryError> {
        let now = format_datetime(&Utc::now());

        sqlx::query(
            r#"INSERT INTO users (psid, first_name, last_name, image_url, lat, lng, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?)
               ON CONFLICT (psid) DO UPDATE SET
                   first_name = COALESCE(excluded.first_name, users.first_name),
                   last_name = COALESCE(excluded.last_name, users.last_name),
                   image_url = COALESCE(excluded.image_url, users.image_url),
                   lat = COALESCE(excluded.lat, users.lat),
                   lng = COALESCE(excluded.lng, users.lng),
                   updated_at = excluded.updated_at"#,
        )
        .bind(psid.as_str())
        .bind(&patch.first_name)
        .bind(&patch.last_name)
        .bind(&patch.image_url)
        .bind(patch.lat)
        .bind(patch.lng)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }

    async fn append_posting(&self, psid: &Psid, posting: &Posting) -> Result<(), RepositoryError> {
        let now = format_datetime(&Utc::now());

        // Lazy-create the user row so a Post against an unseen sender
        // still lands (best-effort flow, never fails on missing data).
        sqlx::query(
            "INSERT INTO users (psid, created_at, updated_at) VALUES (?, ?, ?) ON CONFLICT (psid) DO NOTHING",
        )
        .bind(psid.as_str())
        .bind(&now)
        .bind(&now)
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        sqlx::query(
            "INSERT INTO postings (id, psid, image_url, lat, lng, created_at_ms) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(posting.id.to_string())
        .bind(psid.as_str())
        .bind(&posting.image_url)
        .bind(posting.lat)
        .bind(posting.lng)
        .bind(posting.created_at_ms)
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }
}
