//! # Category API

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use gsp_core::{ActionResponse, CategoryId, FieldError, Timestamp};

use crate::db::categories::CategoryRecord;
use crate::db::{self};
use crate::error::AppError;
use crate::extractors::{extract_validated_json, Validate};
use crate::routes::SearchQuery;
use crate::state::AppState;

const CACHE_ENTITY: &str = "categories";

/// Create/update payload for a category.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryInput {
    pub name: String,
    /// `#RRGGBB` hex color.
    pub color: String,
}

impl Validate for CategoryInput {
    fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();

        let name_len = self.name.trim().chars().count();
        if !(1..=80).contains(&name_len) {
            errors.push(FieldError::new("name", "deve ter entre 1 e 80 caracteres"));
        }
        if !is_hex_color(self.color.trim()) {
            errors.push(FieldError::new("color", "deve estar no formato #RRGGBB"));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn is_hex_color(s: &str) -> bool {
    let Some(hex) = s.strip_prefix('#') else {
        return false;
    };
    hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit())
}

impl CategoryInput {
    fn into_record(self, id: CategoryId, created_at: Timestamp, now: Timestamp) -> CategoryRecord {
        CategoryRecord {
            id,
            name: self.name.trim().to_string(),
            color: self.color.trim().to_uppercase(),
            created_at,
            updated_at: now,
        }
    }
}

/// Build the categories router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/categories", get(list_categories).post(create_category))
        .route(
            "/v1/categories/:id",
            axum::routing::put(update_category).delete(delete_category),
        )
}

/// GET /v1/categories — List categories.
#[utoipa::path(
    get,
    path = "/v1/categories",
    params(SearchQuery),
    responses((status = 200, description = "Category list envelope")),
    tag = "categories"
)]
async fn list_categories(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let key = query.cache_key(CACHE_ENTITY);
    if let Some(cached) = state.cache.get(&key) {
        return Ok(Json(cached));
    }

    let records = db::categories::list(&state.db, query.term()).await?;
    let envelope = serde_json::to_value(ActionResponse::ok(records))
        .map_err(|e| AppError::Internal(format!("serialization failed: {e}")))?;
    state.cache.put(key, envelope.clone());
    Ok(Json(envelope))
}

/// POST /v1/categories — Create a category.
#[utoipa::path(
    post,
    path = "/v1/categories",
    request_body = CategoryInput,
    responses(
        (status = 201, description = "Category created", body = CategoryRecord),
        (status = 422, description = "Validation failure"),
    ),
    tag = "categories"
)]
async fn create_category(
    State(state): State<AppState>,
    body: Result<Json<CategoryInput>, JsonRejection>,
) -> Result<(StatusCode, Json<ActionResponse<CategoryRecord>>), AppError> {
    let input = extract_validated_json(body)?;

    let now = Timestamp::now();
    let record = input.into_record(CategoryId::new(), now, now);
    db::categories::insert(&state.db, &record).await?;
    state.cache.invalidate_prefix(CACHE_ENTITY);

    Ok((StatusCode::CREATED, Json(ActionResponse::ok(record))))
}

/// PUT /v1/categories/:id — Update a category.
#[utoipa::path(
    put,
    path = "/v1/categories/{id}",
    params(("id" = Uuid, Path, description = "Category ID")),
    request_body = CategoryInput,
    responses(
        (status = 200, description = "Category updated", body = CategoryRecord),
        (status = 404, description = "Not found"),
        (status = 422, description = "Validation failure"),
    ),
    tag = "categories"
)]
async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Result<Json<CategoryInput>, JsonRejection>,
) -> Result<Json<ActionResponse<CategoryRecord>>, AppError> {
    let input = extract_validated_json(body)?;

    let existing = db::categories::get_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::not_found("categoria não encontrada"))?;

    let record = input.into_record(existing.id, existing.created_at, Timestamp::now());
    if !db::categories::update(&state.db, &record).await? {
        return Err(AppError::not_found("categoria não encontrada"));
    }
    state.cache.invalidate_prefix(CACHE_ENTITY);

    Ok(Json(ActionResponse::ok(record)))
}

/// DELETE /v1/categories/:id — Soft-delete a category.
#[utoipa::path(
    delete,
    path = "/v1/categories/{id}",
    params(("id" = Uuid, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category deleted"),
        (status = 404, description = "Not found"),
    ),
    tag = "categories"
)]
async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ActionResponse<serde_json::Value>>, AppError> {
    if !db::categories::soft_delete(&state.db, id, Timestamp::now()).await? {
        return Err(AppError::not_found("categoria não encontrada"));
    }
    state.cache.invalidate_prefix(CACHE_ENTITY);

    Ok(Json(ActionResponse::ok(serde_json::json!({ "id": id }))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_color_check() {
        assert!(is_hex_color("#FF8800"));
        assert!(is_hex_color("#ff8800"));
        assert!(!is_hex_color("FF8800"));
        assert!(!is_hex_color("#FF880"));
        assert!(!is_hex_color("#GG8800"));
    }

    #[test]
    fn test_validation_accumulates() {
        let input = CategoryInput {
            name: String::new(),
            color: "azul".to_string(),
        };
        let errors = Validate::validate(&input).unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_color_uppercased() {
        let input = CategoryInput {
            name: "Vídeo".to_string(),
            color: "#ab12cd".to_string(),
        };
        let now = Timestamp::now();
        let record = input.into_record(CategoryId::new(), now, now);
        assert_eq!(record.color, "#AB12CD");
    }
}
