//! Payment mode persistence operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use gsp_core::{PaymentModeId, Timestamp};

/// A payment arrangement offered on proposals.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct PaymentModeRecord {
    #[schema(value_type = String)]
    pub id: PaymentModeId,
    pub name: String,
    pub description: Option<String>,
    /// Number of installments, at least 1.
    pub installments: i32,
    /// Surcharge rate in basis points.
    pub rate_bp: i64,
    #[schema(value_type = String)]
    pub created_at: Timestamp,
    #[schema(value_type = String)]
    pub updated_at: Timestamp,
}

const SELECT_COLUMNS: &str =
    "id, name, description, installments, rate_bp, created_at, updated_at";

/// List live payment modes, optionally filtered by name substring.
pub async fn list(
    pool: &PgPool,
    search: Option<&str>,
) -> Result<Vec<PaymentModeRecord>, sqlx::Error> {
    let rows = match search.filter(|s| !s.is_empty()) {
        Some(term) => {
            let pattern = format!("%{term}%");
            sqlx::query_as::<_, PaymentModeRow>(&format!(
                "SELECT {SELECT_COLUMNS} FROM payment_modes
                 WHERE deleted_at IS NULL AND name ILIKE $1 ORDER BY name"
            ))
            .bind(pattern)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, PaymentModeRow>(&format!(
                "SELECT {SELECT_COLUMNS} FROM payment_modes WHERE deleted_at IS NULL ORDER BY name"
            ))
            .fetch_all(pool)
            .await?
        }
    };

    Ok(rows.into_iter().map(PaymentModeRow::into_record).collect())
}

/// Fetch a live payment mode by id.
pub async fn get_by_id(pool: &PgPool, id: Uuid) -> Result<Option<PaymentModeRecord>, sqlx::Error> {
    let row = sqlx::query_as::<_, PaymentModeRow>(&format!(
        "SELECT {SELECT_COLUMNS} FROM payment_modes WHERE id = $1 AND deleted_at IS NULL"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(PaymentModeRow::into_record))
}

/// Whether a payment mode id refers to a live row.
pub async fn exists(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let row: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM payment_modes WHERE id = $1 AND deleted_at IS NULL")
            .bind(id)
            .fetch_optional(pool)
            .await?;
    Ok(row.is_some())
}

/// Insert a new payment mode record.
pub async fn insert(pool: &PgPool, record: &PaymentModeRecord) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO payment_modes (id, name, description, installments, rate_bp,
         created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(*record.id.as_uuid())
    .bind(&record.name)
    .bind(&record.description)
    .bind(record.installments)
    .bind(record.rate_bp)
    .bind(DateTime::<Utc>::from(record.created_at))
    .bind(DateTime::<Utc>::from(record.updated_at))
    .execute(pool)
    .await?;

    Ok(())
}

/// Update a live payment mode. Returns `false` when missing or
/// soft-deleted.
pub async fn update(pool: &PgPool, record: &PaymentModeRecord) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE payment_modes SET name = $1, description = $2, installments = $3,
         rate_bp = $4, updated_at = $5
         WHERE id = $6 AND deleted_at IS NULL",
    )
    .bind(&record.name)
    .bind(&record.description)
    .bind(record.installments)
    .bind(record.rate_bp)
    .bind(DateTime::<Utc>::from(record.updated_at))
    .bind(*record.id.as_uuid())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Soft-delete a payment mode. Proposals keep their pointer.
pub async fn soft_delete(pool: &PgPool, id: Uuid, now: Timestamp) -> Result<bool, sqlx::Error> {
    let now = DateTime::<Utc>::from(now);
    let result = sqlx::query(
        "UPDATE payment_modes SET deleted_at = $1, updated_at = $1
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
struct PaymentModeRow {
    id: Uuid,
    name: String,
    description: Option<String>,
    installments: i32,
    rate_bp: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PaymentModeRow {
    fn into_record(self) -> PaymentModeRecord {
        PaymentModeRecord {
            id: self.id.into(),
            name: self.name,
            description: self.description,
            installments: self.installments,
            rate_bp: self.rate_bp,
            created_at: Timestamp::from(self.created_at),
            updated_at: Timestamp::from(self.updated_at),
        }
    }
}
