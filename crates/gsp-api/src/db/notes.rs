//! Reusable note persistence operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use gsp_core::{NoteId, Timestamp};

/// How a note enters a proposal's observations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum InclusionMode {
    /// Offered for manual selection.
    Manual,
    /// Appended to every new proposal.
    Automatic,
}

impl InclusionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Automatic => "automatic",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "manual" => Some(Self::Manual),
            "automatic" => Some(Self::Automatic),
            _ => None,
        }
    }
}

/// A reusable text block for proposal observations.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct NoteRecord {
    #[schema(value_type = String)]
    pub id: NoteId,
    pub title: String,
    pub content: String,
    pub inclusion_mode: InclusionMode,
    #[schema(value_type = String)]
    pub created_at: Timestamp,
    #[schema(value_type = String)]
    pub updated_at: Timestamp,
}

const SELECT_COLUMNS: &str = "id, title, content, inclusion_mode, created_at, updated_at";

/// List live notes, optionally filtered by a substring over title and
/// content.
pub async fn list(pool: &PgPool, search: Option<&str>) -> Result<Vec<NoteRecord>, sqlx::Error> {
    let rows = match search.filter(|s| !s.is_empty()) {
        Some(term) => {
            let pattern = format!("%{term}%");
            sqlx::query_as::<_, NoteRow>(&format!(
                "SELECT {SELECT_COLUMNS} FROM notes
                 WHERE deleted_at IS NULL AND (title ILIKE $1 OR content ILIKE $1)
                 ORDER BY title"
            ))
            .bind(pattern)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, NoteRow>(&format!(
                "SELECT {SELECT_COLUMNS} FROM notes WHERE deleted_at IS NULL ORDER BY title"
            ))
            .fetch_all(pool)
            .await?
        }
    };

    Ok(rows.into_iter().filter_map(NoteRow::into_record).collect())
}

/// Fetch a live note by id.
pub async fn get_by_id(pool: &PgPool, id: Uuid) -> Result<Option<NoteRecord>, sqlx::Error> {
    let row = sqlx::query_as::<_, NoteRow>(&format!(
        "SELECT {SELECT_COLUMNS} FROM notes WHERE id = $1 AND deleted_at IS NULL"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row.and_then(NoteRow::into_record))
}

/// Insert a new note record.
pub async fn insert(pool: &PgPool, record: &NoteRecord) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO notes (id, title, content, inclusion_mode, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(*record.id.as_uuid())
    .bind(&record.title)
    .bind(&record.content)
    .bind(record.inclusion_mode.as_str())
    .bind(DateTime::<Utc>::from(record.created_at))
    .bind(DateTime::<Utc>::from(record.updated_at))
    .execute(pool)
    .await?;

    Ok(())
}

/// Update a live note. Returns `false` when missing or soft-deleted.
pub async fn update(pool: &PgPool, record: &NoteRecord) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE notes SET title = $1, content = $2, inclusion_mode = $3, updated_at = $4
         WHERE id = $5 AND deleted_at IS NULL",
    )
    .bind(&record.title)
    .bind(&record.content)
    .bind(record.inclusion_mode.as_str())
    .bind(DateTime::<Utc>::from(record.updated_at))
    .bind(*record.id.as_uuid())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Soft-delete a note. Returns `false` when missing or already gone.
pub async fn soft_delete(pool: &PgPool, id: Uuid, now: Timestamp) -> Result<bool, sqlx::Error> {
    let now = DateTime::<Utc>::from(now);
    let result = sqlx::query(
        "UPDATE notes SET deleted_at = $1, updated_at = $1
         WHERE id = $2 AND deleted_at IS NULL",
    )
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Internal row type for SQLx mapping.
#[derive(sqlx::FromRow)]
struct NoteRow {
    id: Uuid,
    title: String,
    content: String,
    inclusion_mode: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl NoteRow {
    fn into_record(self) -> Option<NoteRecord> {
        let inclusion_mode = match InclusionMode::parse(&self.inclusion_mode) {
            Some(m) => m,
            None => {
                tracing::warn!(
                    id = %self.id,
                    inclusion_mode = %self.inclusion_mode,
                    "unknown inclusion_mode"
                );
                return None;
            }
        };
        Some(NoteRecord {
            id: self.id.into(),
            title: self.title,
            content: self.content,
            inclusion_mode,
            created_at: Timestamp::from(self.created_at),
            updated_at: Timestamp::from(self.updated_at),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inclusion_mode_wire_strings() {
        assert_eq!(InclusionMode::Manual.as_str(), "manual");
        assert_eq!(InclusionMode::parse("automatic"), Some(InclusionMode::Automatic));
        assert_eq!(InclusionMode::parse("auto"), None);
    }
}
