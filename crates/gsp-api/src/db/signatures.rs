//! Signature persistence operations.
//!
//! The domain type is [`gsp_state::Signature`]; the table stores the
//! method union flattened into `signature_type` plus the per-method
//! columns, and `into_record` rebuilds the union on read. Validation
//! transitions are type-scoped UPDATEs (`id AND signature_type AND
//! deleted_at IS NULL`), so a transition against a custom or revoked
//! record affects zero rows and reads as not-found.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use gsp_core::Timestamp;
use gsp_state::{Signature, SignatureImage, SignatureMethod, SignatureStatus, SignatureType};

const SELECT_COLUMNS: &str = "id, name, cpf, email, phone, signature_type, govbr_identifier,
     signature_image, image_mime, image_width, image_height, status,
     govbr_last_validated_at, created_at, updated_at, deleted_at";

/// List live signatures, optionally filtered by a case-insensitive
/// substring over name, CPF, and e-mail.
pub async fn list(pool: &PgPool, search: Option<&str>) -> Result<Vec<Signature>, sqlx::Error> {
    let rows = match search.filter(|s| !s.is_empty()) {
        Some(term) => {
            let pattern = format!("%{term}%");
            sqlx::query_as::<_, SignatureRow>(&format!(
                "SELECT {SELECT_COLUMNS} FROM signatures
                 WHERE deleted_at IS NULL
                   AND (name ILIKE $1 OR cpf ILIKE $1 OR email ILIKE $1)
                 ORDER BY name"
            ))
            .bind(pattern)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, SignatureRow>(&format!(
                "SELECT {SELECT_COLUMNS} FROM signatures
                 WHERE deleted_at IS NULL ORDER BY name"
            ))
            .fetch_all(pool)
            .await?
        }
    };

    Ok(rows.into_iter().filter_map(SignatureRow::into_record).collect())
}

/// Fetch a live signature by id.
pub async fn get_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Signature>, sqlx::Error> {
    let row = sqlx::query_as::<_, SignatureRow>(&format!(
        "SELECT {SELECT_COLUMNS} FROM signatures WHERE id = $1 AND deleted_at IS NULL"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row.and_then(SignatureRow::into_record))
}

/// Whether a normalized CPF is already used by a live signature other
/// than `exclude`.
pub async fn cpf_in_use(
    pool: &PgPool,
    cpf: &str,
    exclude: Option<Uuid>,
) -> Result<bool, sqlx::Error> {
    let row: Option<(Uuid,)> = sqlx::query_as(
        "SELECT id FROM signatures
         WHERE cpf = $1 AND deleted_at IS NULL AND ($2::uuid IS NULL OR id <> $2)
         LIMIT 1",
    )
    .bind(cpf)
    .bind(exclude)
    .fetch_optional(pool)
    .await?;

    Ok(row.is_some())
}

/// Insert a new signature record.
pub async fn insert(pool: &PgPool, record: &Signature) -> Result<(), sqlx::Error> {
    let cols = MethodColumns::from_method(&record.method);

    sqlx::query(
        "INSERT INTO signatures (id, name, cpf, email, phone, signature_type, govbr_identifier,
         signature_image, image_mime, image_width, image_height, status,
         govbr_last_validated_at, created_at, updated_at, deleted_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)",
    )
    .bind(*record.id.as_uuid())
    .bind(&record.name)
    .bind(&record.cpf)
    .bind(&record.email)
    .bind(&record.phone)
    .bind(record.signature_type().as_str())
    .bind(cols.govbr_identifier)
    .bind(cols.signature_image)
    .bind(cols.image_mime)
    .bind(cols.image_width)
    .bind(cols.image_height)
    .bind(record.status.as_str())
    .bind(record.govbr_last_validated_at.map(DateTime::<Utc>::from))
    .bind(DateTime::<Utc>::from(record.created_at))
    .bind(DateTime::<Utc>::from(record.updated_at))
    .bind(record.deleted_at.map(DateTime::<Utc>::from))
    .execute(pool)
    .await?;

    Ok(())
}

/// Update a live signature's editable fields. Returns `false` when the
/// row is missing or soft-deleted.
pub async fn update(pool: &PgPool, record: &Signature) -> Result<bool, sqlx::Error> {
    let cols = MethodColumns::from_method(&record.method);

    let result = sqlx::query(
        "UPDATE signatures SET name = $1, cpf = $2, email = $3, phone = $4,
         signature_type = $5, govbr_identifier = $6, signature_image = $7,
         image_mime = $8, image_width = $9, image_height = $10, status = $11,
         govbr_last_validated_at = $12, updated_at = $13
         WHERE id = $14 AND deleted_at IS NULL",
    )
    .bind(&record.name)
    .bind(&record.cpf)
    .bind(&record.email)
    .bind(&record.phone)
    .bind(record.signature_type().as_str())
    .bind(cols.govbr_identifier)
    .bind(cols.signature_image)
    .bind(cols.image_mime)
    .bind(cols.image_width)
    .bind(cols.image_height)
    .bind(record.status.as_str())
    .bind(record.govbr_last_validated_at.map(DateTime::<Utc>::from))
    .bind(DateTime::<Utc>::from(record.updated_at))
    .bind(*record.id.as_uuid())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Soft-delete a signature, forcing status `revoked`. Returns `false`
/// when the row is missing or already deleted.
pub async fn soft_delete(pool: &PgPool, id: Uuid, now: Timestamp) -> Result<bool, sqlx::Error> {
    let now = DateTime::<Utc>::from(now);
    let result = sqlx::query(
        "UPDATE signatures SET status = 'revoked', deleted_at = $1, updated_at = $1
         WHERE id = $2 AND deleted_at IS NULL",
    )
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Apply a Gov.br validation transition. The WHERE clause is scoped to
/// live gov.br rows, so custom or revoked records read as not-found.
pub async fn apply_validation(
    pool: &PgPool,
    id: Uuid,
    status: SignatureStatus,
    validated_at: Option<Timestamp>,
    now: Timestamp,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE signatures SET status = $1, govbr_last_validated_at = $2, updated_at = $3
         WHERE id = $4 AND signature_type = 'govbr' AND deleted_at IS NULL",
    )
    .bind(status.as_str())
    .bind(validated_at.map(DateTime::<Utc>::from))
    .bind(DateTime::<Utc>::from(now))
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Method union flattened for binding.
struct MethodColumns {
    govbr_identifier: Option<String>,
    signature_image: Option<String>,
    image_mime: Option<String>,
    image_width: Option<i32>,
    image_height: Option<i32>,
}

impl MethodColumns {
    fn from_method(method: &SignatureMethod) -> Self {
        match method {
            SignatureMethod::Govbr { identifier } => Self {
                govbr_identifier: Some(identifier.clone()),
                signature_image: None,
                image_mime: None,
                image_width: None,
                image_height: None,
            },
            SignatureMethod::Custom { image } => Self {
                govbr_identifier: None,
                signature_image: Some(image.data_url.clone()),
                image_mime: Some(image.mime.clone()),
                image_width: image.width.map(|w| w as i32),
                image_height: image.height.map(|h| h as i32),
            },
        }
    }
}

/// Internal row type for SQLx mapping.
#[derive(sqlx::FromRow)]
struct SignatureRow {
    id: Uuid,
    name: String,
    cpf: String,
    email: String,
    phone: String,
    signature_type: String,
    govbr_identifier: Option<String>,
    signature_image: Option<String>,
    image_mime: Option<String>,
    image_width: Option<i32>,
    image_height: Option<i32>,
    status: String,
    govbr_last_validated_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl SignatureRow {
    fn into_record(self) -> Option<Signature> {
        let signature_type = match SignatureType::parse(&self.signature_type) {
            Some(t) => t,
            None => {
                tracing::warn!(
                    id = %self.id,
                    signature_type = %self.signature_type,
                    "skipping signature row with unknown signature_type"
                );
                return None;
            }
        };

        let method = match signature_type {
            SignatureType::Govbr => SignatureMethod::Govbr {
                identifier: self.govbr_identifier.unwrap_or_default(),
            },
            SignatureType::Custom => SignatureMethod::Custom {
                image: SignatureImage {
                    data_url: self.signature_image.unwrap_or_default(),
                    mime: self.image_mime.unwrap_or_default(),
                    width: self.image_width.map(|w| w as u32),
                    height: self.image_height.map(|h| h as u32),
                },
            },
        };

        let status = match SignatureStatus::parse(&self.status) {
            Some(s) => s,
            None => {
                tracing::warn!(id = %self.id, status = %self.status, "unknown signature status");
                return None;
            }
        };

        Some(Signature {
            id: self.id.into(),
            name: self.name,
            cpf: self.cpf,
            email: self.email,
            phone: self.phone,
            method,
            status,
            govbr_last_validated_at: self.govbr_last_validated_at.map(Timestamp::from),
            created_at: Timestamp::from(self.created_at),
            updated_at: Timestamp::from(self.updated_at),
            deleted_at: self.deleted_at.map(Timestamp::from),
        })
    }
}
