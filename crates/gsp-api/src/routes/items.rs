//! # Catalog Item API

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use gsp_core::{ActionResponse, FieldError, ItemId, Money, Timestamp};

use crate::db::items::{ItemRecord, ItemType};
use crate::db::{self};
use crate::error::AppError;
use crate::extractors::{extract_validated_json, Validate};
use crate::routes::{check_name, SearchQuery};
use crate::state::AppState;

const CACHE_ENTITY: &str = "items";

/// Create/update payload for a catalog item.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ItemInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type")]
    #[schema(value_type = String)]
    pub item_type: ItemType,
    /// Default unit price in centavos.
    pub default_price: i64,
    #[serde(default)]
    pub category_id: Option<Uuid>,
}

impl Validate for ItemInput {
    fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();

        check_name(&mut errors, "name", &self.name);
        if self.default_price < 0 {
            errors.push(FieldError::new("defaultPrice", "deve ser maior ou igual a zero"));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl ItemInput {
    fn into_record(self, id: ItemId, created_at: Timestamp, now: Timestamp) -> ItemRecord {
        ItemRecord {
            id,
            name: self.name.trim().to_string(),
            description: self
                .description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
            item_type: self.item_type,
            default_price: Money::from_centavos(self.default_price),
            category_id: self.category_id.map(Into::into),
            created_at,
            updated_at: now,
        }
    }
}

/// Build the items router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/items", get(list_items).post(create_item))
        .route("/v1/items/:id", axum::routing::put(update_item).delete(delete_item))
}

/// GET /v1/items — List catalog items.
#[utoipa::path(
    get,
    path = "/v1/items",
    params(SearchQuery),
    responses((status = 200, description = "Item list envelope")),
    tag = "items"
)]
async fn list_items(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let key = query.cache_key(CACHE_ENTITY);
    if let Some(cached) = state.cache.get(&key) {
        return Ok(Json(cached));
    }

    let records = db::items::list(&state.db, query.term()).await?;
    let envelope = serde_json::to_value(ActionResponse::ok(records))
        .map_err(|e| AppError::Internal(format!("serialization failed: {e}")))?;
    state.cache.put(key, envelope.clone());
    Ok(Json(envelope))
}

/// Reject a category pointer that does not resolve to a live category.
async fn check_category(state: &AppState, category_id: Option<Uuid>) -> Result<(), AppError> {
    if let Some(category_id) = category_id {
        if !db::items::category_exists(&state.db, category_id).await? {
            return Err(AppError::validation(vec![FieldError::new(
                "categoryId",
                "categoria não encontrada",
            )]));
        }
    }
    Ok(())
}

/// POST /v1/items — Create a catalog item.
#[utoipa::path(
    post,
    path = "/v1/items",
    request_body = ItemInput,
    responses(
        (status = 201, description = "Item created", body = ItemRecord),
        (status = 422, description = "Validation failure"),
    ),
    tag = "items"
)]
async fn create_item(
    State(state): State<AppState>,
    body: Result<Json<ItemInput>, JsonRejection>,
) -> Result<(StatusCode, Json<ActionResponse<ItemRecord>>), AppError> {
    let input = extract_validated_json(body)?;
    check_category(&state, input.category_id).await?;

    let now = Timestamp::now();
    let record = input.into_record(ItemId::new(), now, now);
    db::items::insert(&state.db, &record).await?;
    state.cache.invalidate_prefix(CACHE_ENTITY);

    Ok((StatusCode::CREATED, Json(ActionResponse::ok(record))))
}

/// PUT /v1/items/:id — Update a catalog item.
#[utoipa::path(
    put,
    path = "/v1/items/{id}",
    params(("id" = Uuid, Path, description = "Item ID")),
    request_body = ItemInput,
    responses(
        (status = 200, description = "Item updated", body = ItemRecord),
        (status = 404, description = "Not found"),
        (status = 422, description = "Validation failure"),
    ),
    tag = "items"
)]
async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Result<Json<ItemInput>, JsonRejection>,
) -> Result<Json<ActionResponse<ItemRecord>>, AppError> {
    let input = extract_validated_json(body)?;
    check_category(&state, input.category_id).await?;

    let existing = db::items::get_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::not_found("item não encontrado"))?;

    let record = input.into_record(existing.id, existing.created_at, Timestamp::now());
    if !db::items::update(&state.db, &record).await? {
        return Err(AppError::not_found("item não encontrado"));
    }
    state.cache.invalidate_prefix(CACHE_ENTITY);

    Ok(Json(ActionResponse::ok(record)))
}

/// DELETE /v1/items/:id — Soft-delete a catalog item.
#[utoipa::path(
    delete,
    path = "/v1/items/{id}",
    params(("id" = Uuid, Path, description = "Item ID")),
    responses(
        (status = 200, description = "Item deleted"),
        (status = 404, description = "Not found"),
    ),
    tag = "items"
)]
async fn delete_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ActionResponse<serde_json::Value>>, AppError> {
    if !db::items::soft_delete(&state.db, id, Timestamp::now()).await? {
        return Err(AppError::not_found("item não encontrado"));
    }
    state.cache.invalidate_prefix(CACHE_ENTITY);

    Ok(Json(ActionResponse::ok(serde_json::json!({ "id": id }))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_price_rejected() {
        let input = ItemInput {
            name: "Captação de vídeo".to_string(),
            description: None,
            item_type: ItemType::Service,
            default_price: -1,
            category_id: None,
        };
        let errors = Validate::validate(&input).unwrap_err();
        assert_eq!(errors[0].field, "defaultPrice");
    }

    #[test]
    fn test_blank_description_dropped() {
        let input = ItemInput {
            name: "Drone".to_string(),
            description: Some("   ".to_string()),
            item_type: ItemType::Product,
            default_price: 150_000,
            category_id: None,
        };
        let now = Timestamp::now();
        let record = input.into_record(ItemId::new(), now, now);
        assert_eq!(record.description, None);
        assert_eq!(record.default_price.centavos(), 150_000);
    }
}
