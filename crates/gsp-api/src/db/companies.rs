//! Company (contratada) persistence operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use gsp_core::{CompanyId, Timestamp};

use super::PersonType;

/// An issuing company record.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CompanyRecord {
    #[schema(value_type = String)]
    pub id: CompanyId,
    pub person_type: PersonType,
    pub name: String,
    /// CPF or CNPJ, digits only.
    pub document: String,
    pub email: String,
    pub phone: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    #[schema(value_type = String)]
    pub created_at: Timestamp,
    #[schema(value_type = String)]
    pub updated_at: Timestamp,
}

const SELECT_COLUMNS: &str =
    "id, person_type, name, document, email, phone, address, city, state, created_at, updated_at";

/// List live companies, optionally filtered by a case-insensitive
/// substring over name, document, and e-mail.
pub async fn list(pool: &PgPool, search: Option<&str>) -> Result<Vec<CompanyRecord>, sqlx::Error> {
    let rows = match search.filter(|s| !s.is_empty()) {
        Some(term) => {
            let pattern = format!("%{term}%");
            sqlx::query_as::<_, CompanyRow>(&format!(
                "SELECT {SELECT_COLUMNS} FROM companies
                 WHERE deleted_at IS NULL
                   AND (name ILIKE $1 OR document ILIKE $1 OR email ILIKE $1)
                 ORDER BY name"
            ))
            .bind(pattern)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, CompanyRow>(&format!(
                "SELECT {SELECT_COLUMNS} FROM companies WHERE deleted_at IS NULL ORDER BY name"
            ))
            .fetch_all(pool)
            .await?
        }
    };

    Ok(rows.into_iter().filter_map(CompanyRow::into_record).collect())
}

/// Fetch a live company by id.
pub async fn get_by_id(pool: &PgPool, id: Uuid) -> Result<Option<CompanyRecord>, sqlx::Error> {
    let row = sqlx::query_as::<_, CompanyRow>(&format!(
        "SELECT {SELECT_COLUMNS} FROM companies WHERE id = $1 AND deleted_at IS NULL"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row.and_then(CompanyRow::into_record))
}

/// Whether a normalized document is already used by a live company
/// other than `exclude`.
pub async fn document_in_use(
    pool: &PgPool,
    document: &str,
    exclude: Option<Uuid>,
) -> Result<bool, sqlx::Error> {
    let row: Option<(Uuid,)> = sqlx::query_as(
        "SELECT id FROM companies
         WHERE document = $1 AND deleted_at IS NULL AND ($2::uuid IS NULL OR id <> $2)
         LIMIT 1",
    )
    .bind(document)
    .bind(exclude)
    .fetch_optional(pool)
    .await?;

    Ok(row.is_some())
}

/// Insert a new company record.
pub async fn insert(pool: &PgPool, record: &CompanyRecord) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO companies (id, person_type, name, document, email, phone, address,
         city, state, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
    )
    .bind(*record.id.as_uuid())
    .bind(record.person_type.as_str())
    .bind(&record.name)
    .bind(&record.document)
    .bind(&record.email)
    .bind(&record.phone)
    .bind(&record.address)
    .bind(&record.city)
    .bind(&record.state)
    .bind(DateTime::<Utc>::from(record.created_at))
    .bind(DateTime::<Utc>::from(record.updated_at))
    .execute(pool)
    .await?;

    Ok(())
}

/// Update a live company. Returns `false` when missing or soft-deleted.
pub async fn update(pool: &PgPool, record: &CompanyRecord) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE companies SET person_type = $1, name = $2, document = $3, email = $4,
         phone = $5, address = $6, city = $7, state = $8, updated_at = $9
         WHERE id = $10 AND deleted_at IS NULL",
    )
    .bind(record.person_type.as_str())
    .bind(&record.name)
    .bind(&record.document)
    .bind(&record.email)
    .bind(&record.phone)
    .bind(&record.address)
    .bind(&record.city)
    .bind(&record.state)
    .bind(DateTime::<Utc>::from(record.updated_at))
    .bind(*record.id.as_uuid())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Soft-delete a company. Returns `false` when missing or already gone.
pub async fn soft_delete(pool: &PgPool, id: Uuid, now: Timestamp) -> Result<bool, sqlx::Error> {
    let now = DateTime::<Utc>::from(now);
    let result = sqlx::query(
        "UPDATE companies SET deleted_at = $1, updated_at = $1
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
struct CompanyRow {
    id: Uuid,
    person_type: String,
    name: String,
    document: String,
    email: String,
    phone: String,
    address: Option<String>,
    city: Option<String>,
    state: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CompanyRow {
    fn into_record(self) -> Option<CompanyRecord> {
        let person_type = match PersonType::parse(&self.person_type) {
            Some(t) => t,
            None => {
                tracing::warn!(id = %self.id, person_type = %self.person_type, "unknown person_type");
                return None;
            }
        };
        Some(CompanyRecord {
            id: self.id.into(),
            person_type,
            name: self.name,
            document: self.document,
            email: self.email,
            phone: self.phone,
            address: self.address,
            city: self.city,
            state: self.state,
            created_at: Timestamp::from(self.created_at),
            updated_at: Timestamp::from(self.updated_at),
        })
    }
}
