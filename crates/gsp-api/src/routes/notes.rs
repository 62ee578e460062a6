//! # Note API
//!
//! Reusable text blocks for proposal observations. Notes marked
//! `automatic` are appended to every new proposal by the client.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use gsp_core::{ActionResponse, FieldError, NoteId, Timestamp};

use crate::db::notes::{InclusionMode, NoteRecord};
use crate::db::{self};
use crate::error::AppError;
use crate::extractors::{extract_validated_json, Validate};
use crate::routes::SearchQuery;
use crate::state::AppState;

const CACHE_ENTITY: &str = "notes";
const TITLE_MAX: usize = 160;
const CONTENT_MAX: usize = 4_000;

/// Create/update payload for a note.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NoteInput {
    pub title: String,
    pub content: String,
    #[schema(value_type = String)]
    pub inclusion_mode: InclusionMode,
}

impl Validate for NoteInput {
    fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();

        let title_len = self.title.trim().chars().count();
        if !(1..=TITLE_MAX).contains(&title_len) {
            errors.push(FieldError::new(
                "title",
                format!("deve ter entre 1 e {TITLE_MAX} caracteres"),
            ));
        }
        let content_len = self.content.trim().chars().count();
        if !(1..=CONTENT_MAX).contains(&content_len) {
            errors.push(FieldError::new(
                "content",
                format!("deve ter entre 1 e {CONTENT_MAX} caracteres"),
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl NoteInput {
    fn into_record(self, id: NoteId, created_at: Timestamp, now: Timestamp) -> NoteRecord {
        NoteRecord {
            id,
            title: self.title.trim().to_string(),
            content: self.content.trim().to_string(),
            inclusion_mode: self.inclusion_mode,
            created_at,
            updated_at: now,
        }
    }
}

/// Build the notes router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/notes", get(list_notes).post(create_note))
        .route("/v1/notes/:id", axum::routing::put(update_note).delete(delete_note))
}

/// GET /v1/notes — List notes.
#[utoipa::path(
    get,
    path = "/v1/notes",
    params(SearchQuery),
    responses((status = 200, description = "Note list envelope")),
    tag = "notes"
)]
async fn list_notes(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let key = query.cache_key(CACHE_ENTITY);
    if let Some(cached) = state.cache.get(&key) {
        return Ok(Json(cached));
    }

    let records = db::notes::list(&state.db, query.term()).await?;
    let envelope = serde_json::to_value(ActionResponse::ok(records))
        .map_err(|e| AppError::Internal(format!("serialization failed: {e}")))?;
    state.cache.put(key, envelope.clone());
    Ok(Json(envelope))
}

/// POST /v1/notes — Create a note.
#[utoipa::path(
    post,
    path = "/v1/notes",
    request_body = NoteInput,
    responses(
        (status = 201, description = "Note created", body = NoteRecord),
        (status = 422, description = "Validation failure"),
    ),
    tag = "notes"
)]
async fn create_note(
    State(state): State<AppState>,
    body: Result<Json<NoteInput>, JsonRejection>,
) -> Result<(StatusCode, Json<ActionResponse<NoteRecord>>), AppError> {
    let input = extract_validated_json(body)?;

    let now = Timestamp::now();
    let record = input.into_record(NoteId::new(), now, now);
    db::notes::insert(&state.db, &record).await?;
    state.cache.invalidate_prefix(CACHE_ENTITY);

    Ok((StatusCode::CREATED, Json(ActionResponse::ok(record))))
}

/// PUT /v1/notes/:id — Update a note.
#[utoipa::path(
    put,
    path = "/v1/notes/{id}",
    params(("id" = Uuid, Path, description = "Note ID")),
    request_body = NoteInput,
    responses(
        (status = 200, description = "Note updated", body = NoteRecord),
        (status = 404, description = "Not found"),
        (status = 422, description = "Validation failure"),
    ),
    tag = "notes"
)]
async fn update_note(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Result<Json<NoteInput>, JsonRejection>,
) -> Result<Json<ActionResponse<NoteRecord>>, AppError> {
    let input = extract_validated_json(body)?;

    let existing = db::notes::get_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::not_found("observação não encontrada"))?;

    let record = input.into_record(existing.id, existing.created_at, Timestamp::now());
    if !db::notes::update(&state.db, &record).await? {
        return Err(AppError::not_found("observação não encontrada"));
    }
    state.cache.invalidate_prefix(CACHE_ENTITY);

    Ok(Json(ActionResponse::ok(record)))
}

/// DELETE /v1/notes/:id — Soft-delete a note.
#[utoipa::path(
    delete,
    path = "/v1/notes/{id}",
    params(("id" = Uuid, Path, description = "Note ID")),
    responses(
        (status = 200, description = "Note deleted"),
        (status = 404, description = "Not found"),
    ),
    tag = "notes"
)]
async fn delete_note(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ActionResponse<serde_json::Value>>, AppError> {
    if !db::notes::soft_delete(&state.db, id, Timestamp::now()).await? {
        return Err(AppError::not_found("observação não encontrada"));
    }
    state.cache.invalidate_prefix(CACHE_ENTITY);

    Ok(Json(ActionResponse::ok(serde_json::json!({ "id": id }))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_fields_rejected() {
        let input = NoteInput {
            title: " ".to_string(),
            content: String::new(),
            inclusion_mode: InclusionMode::Manual,
        };
        let errors = Validate::validate(&input).unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_valid_note_passes() {
        let input = NoteInput {
            title: "Prazo de entrega".to_string(),
            content: "Entrega em até 30 dias úteis após aprovação.".to_string(),
            inclusion_mode: InclusionMode::Automatic,
        };
        assert!(Validate::validate(&input).is_ok());
    }
}
