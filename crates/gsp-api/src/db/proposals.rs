//! Proposal persistence operations.
//!
//! Item rows are a child collection replaced wholesale: any write that
//! touches the item list runs the delete, the bulk insert, and the
//! stored-total refresh inside one transaction. `total_value` is always
//! recomputed server-side from the item rows minus the discount, never
//! taken from the caller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use gsp_core::{ClientId, CompanyId, Money, PaymentModeId, ProposalId, Quantity, Timestamp};

/// Proposal lifecycle status, stored uppercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProposalStatus {
    Draft,
    Open,
    Sent,
    Won,
    Lost,
}

impl ProposalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Open => "OPEN",
            Self::Sent => "SENT",
            Self::Won => "WON",
            Self::Lost => "LOST",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "DRAFT" => Some(Self::Draft),
            "OPEN" => Some(Self::Open),
            "SENT" => Some(Self::Sent),
            "WON" => Some(Self::Won),
            "LOST" => Some(Self::Lost),
            _ => None,
        }
    }
}

/// A proposal with its item lines.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ProposalRecord {
    #[schema(value_type = String)]
    pub id: ProposalId,
    pub code: String,
    pub title: String,
    pub status: ProposalStatus,
    #[schema(value_type = String)]
    pub client_id: ClientId,
    #[schema(value_type = String)]
    pub company_id: CompanyId,
    #[schema(value_type = Option<String>)]
    pub payment_mode_id: Option<PaymentModeId>,
    pub responsible_name: String,
    #[schema(value_type = String)]
    pub issue_date: Timestamp,
    #[schema(value_type = Option<String>)]
    pub validity_date: Option<Timestamp>,
    /// Discount in centavos.
    #[schema(value_type = i64)]
    pub discount: Money,
    /// Stored total: item lines minus discount, floored at zero.
    #[schema(value_type = i64)]
    pub total_value: Money,
    pub observations: Option<String>,
    pub city: String,
    pub items: Vec<ProposalItemRecord>,
    #[schema(value_type = String)]
    pub created_at: Timestamp,
    #[schema(value_type = String)]
    pub updated_at: Timestamp,
}

/// One line on a proposal. Denormalized from the catalog at add time.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ProposalItemRecord {
    pub name: String,
    pub description: Option<String>,
    /// Quantity in hundredths.
    #[schema(value_type = i64)]
    pub quantity: Quantity,
    /// Unit price in centavos.
    #[schema(value_type = i64)]
    pub unit_price: Money,
}

const SELECT_COLUMNS: &str = "id, code, title, status, client_id, company_id, payment_mode_id,
     responsible_name, issue_date, validity_date, discount, total_value, observations, city,
     created_at, updated_at";

/// Item lines minus discount, floored at zero.
pub fn compute_total(items: &[ProposalItemRecord], discount: Money) -> Money {
    let subtotal: i64 = items
        .iter()
        .map(|i| i.quantity.line_total(i.unit_price).centavos())
        .sum();
    Money::from_centavos((subtotal - discount.centavos()).max(0))
}

/// List live proposals, optionally filtered by a case-insensitive
/// substring over code and title. Newest first.
pub async fn list(pool: &PgPool, search: Option<&str>) -> Result<Vec<ProposalRecord>, sqlx::Error> {
    let rows = match search.filter(|s| !s.is_empty()) {
        Some(term) => {
            let pattern = format!("%{term}%");
            sqlx::query_as::<_, ProposalRow>(&format!(
                "SELECT {SELECT_COLUMNS} FROM proposals
                 WHERE deleted_at IS NULL AND (code ILIKE $1 OR title ILIKE $1)
                 ORDER BY created_at DESC"
            ))
            .bind(pattern)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, ProposalRow>(&format!(
                "SELECT {SELECT_COLUMNS} FROM proposals
                 WHERE deleted_at IS NULL ORDER BY created_at DESC"
            ))
            .fetch_all(pool)
            .await?
        }
    };

    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        let items = items_for(pool, row.id).await?;
        if let Some(record) = row.into_record(items) {
            records.push(record);
        }
    }
    Ok(records)
}

/// Fetch a live proposal with its items.
pub async fn get_by_id(pool: &PgPool, id: Uuid) -> Result<Option<ProposalRecord>, sqlx::Error> {
    let row = sqlx::query_as::<_, ProposalRow>(&format!(
        "SELECT {SELECT_COLUMNS} FROM proposals WHERE id = $1 AND deleted_at IS NULL"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => {
            let items = items_for(pool, row.id).await?;
            Ok(row.into_record(items))
        }
        None => Ok(None),
    }
}

/// Whether a proposal code is already used by a live proposal other
/// than `exclude`.
pub async fn code_in_use(
    pool: &PgPool,
    code: &str,
    exclude: Option<Uuid>,
) -> Result<bool, sqlx::Error> {
    let row: Option<(Uuid,)> = sqlx::query_as(
        "SELECT id FROM proposals
         WHERE code = $1 AND deleted_at IS NULL AND ($2::uuid IS NULL OR id <> $2)
         LIMIT 1",
    )
    .bind(code)
    .bind(exclude)
    .fetch_optional(pool)
    .await?;

    Ok(row.is_some())
}

/// Insert a proposal and its items in one transaction. The stored total
/// is computed here, not taken from the record.
pub async fn insert(pool: &PgPool, record: &ProposalRecord) -> Result<(), sqlx::Error> {
    let total = compute_total(&record.items, record.discount);
    let mut tx = pool.begin().await?;

    sqlx::query(
        "INSERT INTO proposals (id, code, title, status, client_id, company_id, payment_mode_id,
         responsible_name, issue_date, validity_date, discount, total_value, observations, city,
         created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)",
    )
    .bind(*record.id.as_uuid())
    .bind(&record.code)
    .bind(&record.title)
    .bind(record.status.as_str())
    .bind(*record.client_id.as_uuid())
    .bind(*record.company_id.as_uuid())
    .bind(record.payment_mode_id.map(|p| *p.as_uuid()))
    .bind(&record.responsible_name)
    .bind(DateTime::<Utc>::from(record.issue_date))
    .bind(record.validity_date.map(DateTime::<Utc>::from))
    .bind(record.discount.centavos())
    .bind(total.centavos())
    .bind(&record.observations)
    .bind(&record.city)
    .bind(DateTime::<Utc>::from(record.created_at))
    .bind(DateTime::<Utc>::from(record.updated_at))
    .execute(&mut *tx)
    .await?;

    insert_items(&mut tx, *record.id.as_uuid(), &record.items).await?;

    tx.commit().await
}

/// Update a live proposal's header fields and discount. The stored
/// total is refreshed against the current item rows. Returns `false`
/// when the row is missing or soft-deleted.
pub async fn update(pool: &PgPool, record: &ProposalRecord) -> Result<bool, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        "UPDATE proposals SET code = $1, title = $2, status = $3, client_id = $4,
         company_id = $5, payment_mode_id = $6, responsible_name = $7, issue_date = $8,
         validity_date = $9, discount = $10, observations = $11, city = $12, updated_at = $13
         WHERE id = $14 AND deleted_at IS NULL",
    )
    .bind(&record.code)
    .bind(&record.title)
    .bind(record.status.as_str())
    .bind(*record.client_id.as_uuid())
    .bind(*record.company_id.as_uuid())
    .bind(record.payment_mode_id.map(|p| *p.as_uuid()))
    .bind(&record.responsible_name)
    .bind(DateTime::<Utc>::from(record.issue_date))
    .bind(record.validity_date.map(DateTime::<Utc>::from))
    .bind(record.discount.centavos())
    .bind(&record.observations)
    .bind(&record.city)
    .bind(DateTime::<Utc>::from(record.updated_at))
    .bind(*record.id.as_uuid())
    .execute(&mut *tx)
    .await?;

    if result.rows_affected() == 0 {
        tx.rollback().await?;
        return Ok(false);
    }

    refresh_total(&mut tx, *record.id.as_uuid()).await?;

    tx.commit().await?;
    Ok(true)
}

/// Replace a live proposal's item list and refresh the stored total,
/// all inside one transaction. Returns `false` when the proposal is
/// missing or soft-deleted.
pub async fn replace_items(
    pool: &PgPool,
    id: Uuid,
    items: &[ProposalItemRecord],
    now: Timestamp,
) -> Result<bool, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        "UPDATE proposals SET updated_at = $1 WHERE id = $2 AND deleted_at IS NULL",
    )
    .bind(DateTime::<Utc>::from(now))
    .bind(id)
    .execute(&mut *tx)
    .await?;

    if result.rows_affected() == 0 {
        tx.rollback().await?;
        return Ok(false);
    }

    sqlx::query("DELETE FROM proposal_items WHERE proposal_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    insert_items(&mut tx, id, items).await?;
    refresh_total(&mut tx, id).await?;

    tx.commit().await?;
    Ok(true)
}

/// Soft-delete a proposal. Returns `false` when missing or already
/// gone.
pub async fn soft_delete(pool: &PgPool, id: Uuid, now: Timestamp) -> Result<bool, sqlx::Error> {
    let now = DateTime::<Utc>::from(now);
    let result = sqlx::query(
        "UPDATE proposals SET deleted_at = $1, updated_at = $1
         WHERE id = $2 AND deleted_at IS NULL",
    )
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

async fn insert_items(
    tx: &mut Transaction<'_, Postgres>,
    proposal_id: Uuid,
    items: &[ProposalItemRecord],
) -> Result<(), sqlx::Error> {
    for (position, item) in items.iter().enumerate() {
        sqlx::query(
            "INSERT INTO proposal_items (id, proposal_id, name, description, quantity,
             unit_price, position)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(Uuid::new_v4())
        .bind(proposal_id)
        .bind(&item.name)
        .bind(&item.description)
        .bind(item.quantity.hundredths())
        .bind(item.unit_price.centavos())
        .bind(position as i32)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

/// Recompute the stored total from the current item rows and the stored
/// discount, inside the caller's transaction.
async fn refresh_total(
    tx: &mut Transaction<'_, Postgres>,
    proposal_id: Uuid,
) -> Result<(), sqlx::Error> {
    let rows: Vec<(i64, i64)> = sqlx::query_as(
        "SELECT quantity, unit_price FROM proposal_items WHERE proposal_id = $1",
    )
    .bind(proposal_id)
    .fetch_all(&mut **tx)
    .await?;

    let (discount,): (i64,) = sqlx::query_as("SELECT discount FROM proposals WHERE id = $1")
        .bind(proposal_id)
        .fetch_one(&mut **tx)
        .await?;

    let subtotal: i64 = rows
        .iter()
        .map(|(quantity, unit_price)| {
            Quantity::from_hundredths(*quantity)
                .line_total(Money::from_centavos(*unit_price))
                .centavos()
        })
        .sum();
    let total = (subtotal - discount).max(0);

    sqlx::query("UPDATE proposals SET total_value = $1 WHERE id = $2")
        .bind(total)
        .bind(proposal_id)
        .execute(&mut **tx)
        .await?;

    Ok(())
}

async fn items_for(pool: &PgPool, proposal_id: Uuid) -> Result<Vec<ProposalItemRecord>, sqlx::Error> {
    let rows: Vec<(String, Option<String>, i64, i64)> = sqlx::query_as(
        "SELECT name, description, quantity, unit_price FROM proposal_items
         WHERE proposal_id = $1 ORDER BY position",
    )
    .bind(proposal_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(name, description, quantity, unit_price)| ProposalItemRecord {
            name,
            description,
            quantity: Quantity::from_hundredths(quantity),
            unit_price: Money::from_centavos(unit_price),
        })
        .collect())
}

/// Internal row type for SQLx mapping.
#[derive(sqlx::FromRow)]
struct ProposalRow {
    id: Uuid,
    code: String,
    title: String,
    status: String,
    client_id: Uuid,
    company_id: Uuid,
    payment_mode_id: Option<Uuid>,
    responsible_name: String,
    issue_date: DateTime<Utc>,
    validity_date: Option<DateTime<Utc>>,
    discount: i64,
    total_value: i64,
    observations: Option<String>,
    city: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ProposalRow {
    fn into_record(self, items: Vec<ProposalItemRecord>) -> Option<ProposalRecord> {
        let status = match ProposalStatus::parse(&self.status) {
            Some(s) => s,
            None => {
                tracing::warn!(id = %self.id, status = %self.status, "unknown proposal status");
                return None;
            }
        };
        Some(ProposalRecord {
            id: self.id.into(),
            code: self.code,
            title: self.title,
            status,
            client_id: self.client_id.into(),
            company_id: self.company_id.into(),
            payment_mode_id: self.payment_mode_id.map(Into::into),
            responsible_name: self.responsible_name,
            issue_date: Timestamp::from(self.issue_date),
            validity_date: self.validity_date.map(Timestamp::from),
            discount: Money::from_centavos(self.discount),
            total_value: Money::from_centavos(self.total_value),
            observations: self.observations,
            city: self.city,
            items,
            created_at: Timestamp::from(self.created_at),
            updated_at: Timestamp::from(self.updated_at),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(quantity: i64, unit_price: i64) -> ProposalItemRecord {
        ProposalItemRecord {
            name: "Item".to_string(),
            description: None,
            quantity: Quantity::from_hundredths(quantity),
            unit_price: Money::from_centavos(unit_price),
        }
    }

    #[test]
    fn test_proposal_status_wire_strings() {
        assert_eq!(ProposalStatus::Draft.as_str(), "DRAFT");
        assert_eq!(ProposalStatus::parse("WON"), Some(ProposalStatus::Won));
        assert_eq!(ProposalStatus::parse("won"), None);
    }

    #[test]
    fn test_compute_total_subtracts_discount() {
        // 2.00 x R$ 25,00 + 1.50 x R$ 10,00 = R$ 65,00
        let items = vec![item(200, 2_500), item(150, 1_000)];
        let total = compute_total(&items, Money::from_centavos(500));
        assert_eq!(total.centavos(), 6_000);
    }

    #[test]
    fn test_compute_total_floors_at_zero() {
        let items = vec![item(100, 1_000)];
        let total = compute_total(&items, Money::from_centavos(5_000));
        assert_eq!(total.centavos(), 0);
    }

    #[test]
    fn test_compute_total_empty_items() {
        let total = compute_total(&[], Money::from_centavos(0));
        assert_eq!(total.centavos(), 0);
    }
}
