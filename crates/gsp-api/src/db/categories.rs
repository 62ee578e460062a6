//! Item category persistence operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use gsp_core::{CategoryId, Timestamp};

/// A catalog category with a display color.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CategoryRecord {
    #[schema(value_type = String)]
    pub id: CategoryId,
    pub name: String,
    /// `#RRGGBB` hex color.
    pub color: String,
    #[schema(value_type = String)]
    pub created_at: Timestamp,
    #[schema(value_type = String)]
    pub updated_at: Timestamp,
}

const SELECT_COLUMNS: &str = "id, name, color, created_at, updated_at";

/// List live categories, optionally filtered by name substring.
pub async fn list(pool: &PgPool, search: Option<&str>) -> Result<Vec<CategoryRecord>, sqlx::Error> {
    let rows = match search.filter(|s| !s.is_empty()) {
        Some(term) => {
            let pattern = format!("%{term}%");
            sqlx::query_as::<_, CategoryRow>(&format!(
                "SELECT {SELECT_COLUMNS} FROM categories
                 WHERE deleted_at IS NULL AND name ILIKE $1 ORDER BY name"
            ))
            .bind(pattern)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, CategoryRow>(&format!(
                "SELECT {SELECT_COLUMNS} FROM categories WHERE deleted_at IS NULL ORDER BY name"
            ))
            .fetch_all(pool)
            .await?
        }
    };

    Ok(rows.into_iter().map(CategoryRow::into_record).collect())
}

/// Fetch a live category by id.
pub async fn get_by_id(pool: &PgPool, id: Uuid) -> Result<Option<CategoryRecord>, sqlx::Error> {
    let row = sqlx::query_as::<_, CategoryRow>(&format!(
        "SELECT {SELECT_COLUMNS} FROM categories WHERE id = $1 AND deleted_at IS NULL"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(CategoryRow::into_record))
}

/// Insert a new category record.
pub async fn insert(pool: &PgPool, record: &CategoryRecord) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO categories (id, name, color, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(*record.id.as_uuid())
    .bind(&record.name)
    .bind(&record.color)
    .bind(DateTime::<Utc>::from(record.created_at))
    .bind(DateTime::<Utc>::from(record.updated_at))
    .execute(pool)
    .await?;

    Ok(())
}

/// Update a live category. Returns `false` when missing or soft-deleted.
pub async fn update(pool: &PgPool, record: &CategoryRecord) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE categories SET name = $1, color = $2, updated_at = $3
         WHERE id = $4 AND deleted_at IS NULL",
    )
    .bind(&record.name)
    .bind(&record.color)
    .bind(DateTime::<Utc>::from(record.updated_at))
    .bind(*record.id.as_uuid())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Soft-delete a category. Items keep their `category_id` pointer; the
/// read side treats a dead category as uncategorized.
pub async fn soft_delete(pool: &PgPool, id: Uuid, now: Timestamp) -> Result<bool, sqlx::Error> {
    let now = DateTime::<Utc>::from(now);
    let result = sqlx::query(
        "UPDATE categories SET deleted_at = $1, updated_at = $1
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
struct CategoryRow {
    id: Uuid,
    name: String,
    color: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CategoryRow {
    fn into_record(self) -> CategoryRecord {
        CategoryRecord {
            id: self.id.into(),
            name: self.name,
            color: self.color.trim().to_string(),
            created_at: Timestamp::from(self.created_at),
            updated_at: Timestamp::from(self.updated_at),
        }
    }
}
