//! Client (contratante) persistence operations.
//!
//! Secondary contacts are a child collection replaced wholesale with
//! the parent update: the delete and the bulk insert run inside one
//! transaction, so a failed write never leaves the client with a
//! partial contact list.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use gsp_core::{ClientId, Timestamp};

use super::PersonType;

/// A client record with its secondary contacts.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ClientRecord {
    #[schema(value_type = String)]
    pub id: ClientId,
    pub person_type: PersonType,
    pub name: String,
    /// CPF or CNPJ, digits only.
    pub document: String,
    pub email: String,
    pub phone: String,
    pub cep: Option<String>,
    pub street: Option<String>,
    pub street_number: Option<String>,
    pub complement: Option<String>,
    pub neighborhood: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub contacts: Vec<SecondaryContact>,
    #[schema(value_type = String)]
    pub created_at: Timestamp,
    #[schema(value_type = String)]
    pub updated_at: Timestamp,
}

/// A secondary contact attached to a client.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct SecondaryContact {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: Option<String>,
}

const SELECT_COLUMNS: &str = "id, person_type, name, document, email, phone, cep, street,
     street_number, complement, neighborhood, city, state, created_at, updated_at";

/// List live clients, optionally filtered by a case-insensitive
/// substring over name, document, e-mail, and phone.
pub async fn list(pool: &PgPool, search: Option<&str>) -> Result<Vec<ClientRecord>, sqlx::Error> {
    let rows = match search.filter(|s| !s.is_empty()) {
        Some(term) => {
            let pattern = format!("%{term}%");
            sqlx::query_as::<_, ClientRow>(&format!(
                "SELECT {SELECT_COLUMNS} FROM clients
                 WHERE deleted_at IS NULL
                   AND (name ILIKE $1 OR document ILIKE $1 OR email ILIKE $1 OR phone ILIKE $1)
                 ORDER BY name"
            ))
            .bind(pattern)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, ClientRow>(&format!(
                "SELECT {SELECT_COLUMNS} FROM clients WHERE deleted_at IS NULL ORDER BY name"
            ))
            .fetch_all(pool)
            .await?
        }
    };

    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        let contacts = contacts_for(pool, row.id).await?;
        if let Some(record) = row.into_record(contacts) {
            records.push(record);
        }
    }
    Ok(records)
}

/// Fetch a live client with its contacts.
pub async fn get_by_id(pool: &PgPool, id: Uuid) -> Result<Option<ClientRecord>, sqlx::Error> {
    let row = sqlx::query_as::<_, ClientRow>(&format!(
        "SELECT {SELECT_COLUMNS} FROM clients WHERE id = $1 AND deleted_at IS NULL"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => {
            let contacts = contacts_for(pool, row.id).await?;
            Ok(row.into_record(contacts))
        }
        None => Ok(None),
    }
}

/// Whether a normalized document is already used by a live client other
/// than `exclude`.
pub async fn document_in_use(
    pool: &PgPool,
    document: &str,
    exclude: Option<Uuid>,
) -> Result<bool, sqlx::Error> {
    let row: Option<(Uuid,)> = sqlx::query_as(
        "SELECT id FROM clients
         WHERE document = $1 AND deleted_at IS NULL AND ($2::uuid IS NULL OR id <> $2)
         LIMIT 1",
    )
    .bind(document)
    .bind(exclude)
    .fetch_optional(pool)
    .await?;

    Ok(row.is_some())
}

/// Insert a client and its contacts in one transaction.
pub async fn insert(pool: &PgPool, record: &ClientRecord) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        "INSERT INTO clients (id, person_type, name, document, email, phone, cep, street,
         street_number, complement, neighborhood, city, state, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)",
    )
    .bind(*record.id.as_uuid())
    .bind(record.person_type.as_str())
    .bind(&record.name)
    .bind(&record.document)
    .bind(&record.email)
    .bind(&record.phone)
    .bind(&record.cep)
    .bind(&record.street)
    .bind(&record.street_number)
    .bind(&record.complement)
    .bind(&record.neighborhood)
    .bind(&record.city)
    .bind(&record.state)
    .bind(DateTime::<Utc>::from(record.created_at))
    .bind(DateTime::<Utc>::from(record.updated_at))
    .execute(&mut *tx)
    .await?;

    insert_contacts(&mut tx, *record.id.as_uuid(), &record.contacts).await?;

    tx.commit().await
}

/// Update a live client, replacing its contact list atomically.
/// Returns `false` when the row is missing or soft-deleted.
pub async fn update(pool: &PgPool, record: &ClientRecord) -> Result<bool, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        "UPDATE clients SET person_type = $1, name = $2, document = $3, email = $4,
         phone = $5, cep = $6, street = $7, street_number = $8, complement = $9,
         neighborhood = $10, city = $11, state = $12, updated_at = $13
         WHERE id = $14 AND deleted_at IS NULL",
    )
    .bind(record.person_type.as_str())
    .bind(&record.name)
    .bind(&record.document)
    .bind(&record.email)
    .bind(&record.phone)
    .bind(&record.cep)
    .bind(&record.street)
    .bind(&record.street_number)
    .bind(&record.complement)
    .bind(&record.neighborhood)
    .bind(&record.city)
    .bind(&record.state)
    .bind(DateTime::<Utc>::from(record.updated_at))
    .bind(*record.id.as_uuid())
    .execute(&mut *tx)
    .await?;

    if result.rows_affected() == 0 {
        tx.rollback().await?;
        return Ok(false);
    }

    sqlx::query("DELETE FROM client_contacts WHERE client_id = $1")
        .bind(*record.id.as_uuid())
        .execute(&mut *tx)
        .await?;
    insert_contacts(&mut tx, *record.id.as_uuid(), &record.contacts).await?;

    tx.commit().await?;
    Ok(true)
}

/// Soft-delete a client. Returns `false` when missing or already gone.
pub async fn soft_delete(pool: &PgPool, id: Uuid, now: Timestamp) -> Result<bool, sqlx::Error> {
    let now = DateTime::<Utc>::from(now);
    let result = sqlx::query(
        "UPDATE clients SET deleted_at = $1, updated_at = $1
         WHERE id = $2 AND deleted_at IS NULL",
    )
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

async fn insert_contacts(
    tx: &mut Transaction<'_, Postgres>,
    client_id: Uuid,
    contacts: &[SecondaryContact],
) -> Result<(), sqlx::Error> {
    for (position, contact) in contacts.iter().enumerate() {
        sqlx::query(
            "INSERT INTO client_contacts (id, client_id, name, email, phone, role, position)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(Uuid::new_v4())
        .bind(client_id)
        .bind(&contact.name)
        .bind(&contact.email)
        .bind(&contact.phone)
        .bind(&contact.role)
        .bind(position as i32)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

async fn contacts_for(pool: &PgPool, client_id: Uuid) -> Result<Vec<SecondaryContact>, sqlx::Error> {
    let rows: Vec<(String, Option<String>, Option<String>, Option<String>)> = sqlx::query_as(
        "SELECT name, email, phone, role FROM client_contacts
         WHERE client_id = $1 ORDER BY position",
    )
    .bind(client_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(name, email, phone, role)| SecondaryContact {
            name,
            email,
            phone,
            role,
        })
        .collect())
}

/// Internal row type for SQLx mapping.
#[derive(sqlx::FromRow)]
struct ClientRow {
    id: Uuid,
    person_type: String,
    name: String,
    document: String,
    email: String,
    phone: String,
    cep: Option<String>,
    street: Option<String>,
    street_number: Option<String>,
    complement: Option<String>,
    neighborhood: Option<String>,
    city: Option<String>,
    state: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ClientRow {
    fn into_record(self, contacts: Vec<SecondaryContact>) -> Option<ClientRecord> {
        let person_type = match PersonType::parse(&self.person_type) {
            Some(t) => t,
            None => {
                tracing::warn!(id = %self.id, person_type = %self.person_type, "unknown person_type");
                return None;
            }
        };
        Some(ClientRecord {
            id: self.id.into(),
            person_type,
            name: self.name,
            document: self.document,
            email: self.email,
            phone: self.phone,
            cep: self.cep,
            street: self.street,
            street_number: self.street_number,
            complement: self.complement,
            neighborhood: self.neighborhood,
            city: self.city,
            state: self.state,
            contacts,
            created_at: Timestamp::from(self.created_at),
            updated_at: Timestamp::from(self.updated_at),
        })
    }
}
