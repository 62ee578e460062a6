//! Catalog item persistence operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use gsp_core::{CategoryId, ItemId, Money, Timestamp};

/// Product vs. service, stored lowercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    Product,
    Service,
}

impl ItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Product => "product",
            Self::Service => "service",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "product" => Some(Self::Product),
            "service" => Some(Self::Service),
            _ => None,
        }
    }
}

/// A reusable catalog item.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ItemRecord {
    #[schema(value_type = String)]
    pub id: ItemId,
    pub name: String,
    pub description: Option<String>,
    pub item_type: ItemType,
    /// Default unit price in centavos.
    #[schema(value_type = i64)]
    pub default_price: Money,
    #[schema(value_type = Option<String>)]
    pub category_id: Option<CategoryId>,
    #[schema(value_type = String)]
    pub created_at: Timestamp,
    #[schema(value_type = String)]
    pub updated_at: Timestamp,
}

const SELECT_COLUMNS: &str =
    "id, name, description, item_type, default_price, category_id, created_at, updated_at";

/// List live items, optionally filtered by a case-insensitive substring
/// over name and description.
pub async fn list(pool: &PgPool, search: Option<&str>) -> Result<Vec<ItemRecord>, sqlx::Error> {
    let rows = match search.filter(|s| !s.is_empty()) {
        Some(term) => {
            let pattern = format!("%{term}%");
            sqlx::query_as::<_, ItemRow>(&format!(
                "SELECT {SELECT_COLUMNS} FROM items
                 WHERE deleted_at IS NULL AND (name ILIKE $1 OR description ILIKE $1)
                 ORDER BY name"
            ))
            .bind(pattern)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, ItemRow>(&format!(
                "SELECT {SELECT_COLUMNS} FROM items WHERE deleted_at IS NULL ORDER BY name"
            ))
            .fetch_all(pool)
            .await?
        }
    };

    Ok(rows.into_iter().filter_map(ItemRow::into_record).collect())
}

/// Fetch a live item by id.
pub async fn get_by_id(pool: &PgPool, id: Uuid) -> Result<Option<ItemRecord>, sqlx::Error> {
    let row = sqlx::query_as::<_, ItemRow>(&format!(
        "SELECT {SELECT_COLUMNS} FROM items WHERE id = $1 AND deleted_at IS NULL"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row.and_then(ItemRow::into_record))
}

/// Whether a category id refers to a live category.
pub async fn category_exists(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let row: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM categories WHERE id = $1 AND deleted_at IS NULL")
            .bind(id)
            .fetch_optional(pool)
            .await?;
    Ok(row.is_some())
}

/// Insert a new item record.
pub async fn insert(pool: &PgPool, record: &ItemRecord) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO items (id, name, description, item_type, default_price, category_id,
         created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
    )
    .bind(*record.id.as_uuid())
    .bind(&record.name)
    .bind(&record.description)
    .bind(record.item_type.as_str())
    .bind(record.default_price.centavos())
    .bind(record.category_id.map(|c| *c.as_uuid()))
    .bind(DateTime::<Utc>::from(record.created_at))
    .bind(DateTime::<Utc>::from(record.updated_at))
    .execute(pool)
    .await?;

    Ok(())
}

/// Update a live item. Returns `false` when missing or soft-deleted.
pub async fn update(pool: &PgPool, record: &ItemRecord) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE items SET name = $1, description = $2, item_type = $3, default_price = $4,
         category_id = $5, updated_at = $6
         WHERE id = $7 AND deleted_at IS NULL",
    )
    .bind(&record.name)
    .bind(&record.description)
    .bind(record.item_type.as_str())
    .bind(record.default_price.centavos())
    .bind(record.category_id.map(|c| *c.as_uuid()))
    .bind(DateTime::<Utc>::from(record.updated_at))
    .bind(*record.id.as_uuid())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Soft-delete an item. Returns `false` when missing or already gone.
pub async fn soft_delete(pool: &PgPool, id: Uuid, now: Timestamp) -> Result<bool, sqlx::Error> {
    let now = DateTime::<Utc>::from(now);
    let result = sqlx::query(
        "UPDATE items SET deleted_at = $1, updated_at = $1
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
struct ItemRow {
    id: Uuid,
    name: String,
    description: Option<String>,
    item_type: String,
    default_price: i64,
    category_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ItemRow {
    fn into_record(self) -> Option<ItemRecord> {
        let item_type = match ItemType::parse(&self.item_type) {
            Some(t) => t,
            None => {
                tracing::warn!(id = %self.id, item_type = %self.item_type, "unknown item_type");
                return None;
            }
        };
        Some(ItemRecord {
            id: self.id.into(),
            name: self.name,
            description: self.description,
            item_type,
            default_price: Money::from_centavos(self.default_price),
            category_id: self.category_id.map(Into::into),
            created_at: Timestamp::from(self.created_at),
            updated_at: Timestamp::from(self.updated_at),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_type_wire_strings() {
        assert_eq!(ItemType::Product.as_str(), "product");
        assert_eq!(ItemType::parse("service"), Some(ItemType::Service));
        assert_eq!(ItemType::parse("goods"), None);
    }
}
