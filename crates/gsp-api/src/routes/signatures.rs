//! # Signature API
//!
//! CRUD over signer records plus the Gov.br validation transitions.
//! Create and update share the flat [`SignatureInput`] payload; the
//! status is always derived via `SignatureStatus::initial_for`, never
//! taken from the client.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use uuid::Uuid;

use gsp_core::{ActionResponse, SignatureId, Timestamp};
use gsp_state::{Signature, SignatureInput, SignatureStatus, SignatureType};

use crate::db;
use crate::error::AppError;
use crate::extractors::extract_json;
use crate::routes::SearchQuery;
use crate::state::AppState;

const CACHE_ENTITY: &str = "signatures";

/// Build the signatures router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/signatures", get(list_signatures).post(create_signature))
        .route(
            "/v1/signatures/:id",
            axum::routing::put(update_signature).delete(delete_signature),
        )
        .route(
            "/v1/signatures/:id/validation/request",
            post(request_validation),
        )
        .route(
            "/v1/signatures/:id/validation/complete",
            post(complete_validation),
        )
}

/// GET /v1/signatures — List signatures.
#[utoipa::path(
    get,
    path = "/v1/signatures",
    params(SearchQuery),
    responses((status = 200, description = "Signature list envelope")),
    tag = "signatures"
)]
async fn list_signatures(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let key = query.cache_key(CACHE_ENTITY);
    if let Some(cached) = state.cache.get(&key) {
        return Ok(Json(cached));
    }

    let records = db::signatures::list(&state.db, query.term()).await?;
    let envelope = serde_json::to_value(ActionResponse::ok(records))
        .map_err(|e| AppError::Internal(format!("serialization failed: {e}")))?;
    state.cache.put(key, envelope.clone());
    Ok(Json(envelope))
}

/// POST /v1/signatures — Create a signature.
#[utoipa::path(
    post,
    path = "/v1/signatures",
    request_body = SignatureInput,
    responses(
        (status = 201, description = "Signature created"),
        (status = 409, description = "CPF already registered"),
        (status = 422, description = "Validation failure"),
    ),
    tag = "signatures"
)]
async fn create_signature(
    State(state): State<AppState>,
    body: Result<Json<SignatureInput>, JsonRejection>,
) -> Result<(StatusCode, Json<ActionResponse<Signature>>), AppError> {
    let input = extract_json(body)?;
    let draft = input.validate().map_err(AppError::validation)?;

    if db::signatures::cpf_in_use(&state.db, &draft.cpf, None).await? {
        return Err(AppError::conflict("CPF já cadastrado"));
    }

    let now = Timestamp::now();
    let record = Signature {
        id: SignatureId::new(),
        name: draft.name,
        cpf: draft.cpf,
        email: draft.email,
        phone: draft.phone,
        status: SignatureStatus::initial_for(draft.method.signature_type(), None),
        method: draft.method,
        govbr_last_validated_at: None,
        created_at: now,
        updated_at: now,
        deleted_at: None,
    };

    db::signatures::insert(&state.db, &record).await?;
    state.cache.invalidate_prefix(CACHE_ENTITY);

    Ok((StatusCode::CREATED, Json(ActionResponse::ok(record))))
}

/// PUT /v1/signatures/:id — Update a signature.
#[utoipa::path(
    put,
    path = "/v1/signatures/{id}",
    params(("id" = Uuid, Path, description = "Signature ID")),
    request_body = SignatureInput,
    responses(
        (status = 200, description = "Signature updated"),
        (status = 404, description = "Not found"),
        (status = 409, description = "CPF already registered"),
        (status = 422, description = "Validation failure"),
    ),
    tag = "signatures"
)]
async fn update_signature(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Result<Json<SignatureInput>, JsonRejection>,
) -> Result<Json<ActionResponse<Signature>>, AppError> {
    let input = extract_json(body)?;
    let draft = input.validate().map_err(AppError::validation)?;

    let existing = db::signatures::get_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::not_found("assinatura não encontrada"))?;

    if db::signatures::cpf_in_use(&state.db, &draft.cpf, Some(id)).await? {
        return Err(AppError::conflict("CPF já cadastrado"));
    }

    let record = Signature {
        id: existing.id,
        name: draft.name,
        cpf: draft.cpf,
        email: draft.email,
        phone: draft.phone,
        status: SignatureStatus::initial_for(
            draft.method.signature_type(),
            Some(existing.status),
        ),
        govbr_last_validated_at: carried_validation(
            &existing,
            draft.method.signature_type(),
        ),
        method: draft.method,
        created_at: existing.created_at,
        updated_at: Timestamp::now(),
        deleted_at: existing.deleted_at,
    };

    if !db::signatures::update(&state.db, &record).await? {
        return Err(AppError::not_found("assinatura não encontrada"));
    }
    state.cache.invalidate_prefix(CACHE_ENTITY);

    Ok(Json(ActionResponse::ok(record)))
}

/// Gov.br confirmation carried into an update. A govbr-to-govbr edit
/// keeps the prior timestamp; any type change clears it.
fn carried_validation(existing: &Signature, new_type: SignatureType) -> Option<Timestamp> {
    match (existing.method.signature_type(), new_type) {
        (SignatureType::Govbr, SignatureType::Govbr) => existing.govbr_last_validated_at,
        _ => None,
    }
}

/// DELETE /v1/signatures/:id — Revoke (soft-delete) a signature.
#[utoipa::path(
    delete,
    path = "/v1/signatures/{id}",
    params(("id" = Uuid, Path, description = "Signature ID")),
    responses(
        (status = 200, description = "Signature revoked"),
        (status = 404, description = "Not found"),
    ),
    tag = "signatures"
)]
async fn delete_signature(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ActionResponse<serde_json::Value>>, AppError> {
    if !db::signatures::soft_delete(&state.db, id, Timestamp::now()).await? {
        return Err(AppError::not_found("assinatura não encontrada"));
    }
    state.cache.invalidate_prefix(CACHE_ENTITY);

    Ok(Json(ActionResponse::ok(serde_json::json!({ "id": id }))))
}

/// POST /v1/signatures/:id/validation/request — Request a fresh Gov.br
/// confirmation.
#[utoipa::path(
    post,
    path = "/v1/signatures/{id}/validation/request",
    params(("id" = Uuid, Path, description = "Signature ID")),
    responses(
        (status = 200, description = "Validation requested"),
        (status = 404, description = "Not found or not a gov.br signature"),
    ),
    tag = "signatures"
)]
async fn request_validation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ActionResponse<Signature>>, AppError> {
    let mut record = db::signatures::get_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::not_found("assinatura não encontrada"))?;

    record.request_validation()?;

    let applied = db::signatures::apply_validation(
        &state.db,
        id,
        record.status,
        record.govbr_last_validated_at,
        record.updated_at,
    )
    .await?;
    if !applied {
        return Err(AppError::not_found("assinatura não encontrada"));
    }
    state.cache.invalidate_prefix(CACHE_ENTITY);

    Ok(Json(ActionResponse::ok(record)))
}

/// POST /v1/signatures/:id/validation/complete — Record a Gov.br
/// confirmation. The portal round-trip happens outside this service;
/// this endpoint only applies the resulting status.
#[utoipa::path(
    post,
    path = "/v1/signatures/{id}/validation/complete",
    params(("id" = Uuid, Path, description = "Signature ID")),
    responses(
        (status = 200, description = "Validation recorded"),
        (status = 404, description = "Not found or not a gov.br signature"),
    ),
    tag = "signatures"
)]
async fn complete_validation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ActionResponse<Signature>>, AppError> {
    let mut record = db::signatures::get_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::not_found("assinatura não encontrada"))?;

    record.complete_validation()?;

    let applied = db::signatures::apply_validation(
        &state.db,
        id,
        record.status,
        record.govbr_last_validated_at,
        record.updated_at,
    )
    .await?;
    if !applied {
        return Err(AppError::not_found("assinatura não encontrada"));
    }
    state.cache.invalidate_prefix(CACHE_ENTITY);

    Ok(Json(ActionResponse::ok(record)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use gsp_state::SignatureMethod;

    fn govbr_signature(validated: Option<Timestamp>) -> Signature {
        let now = Timestamp::now();
        Signature {
            id: SignatureId::new(),
            name: "Ana Souza".to_string(),
            cpf: "52998224725".to_string(),
            email: "ana@exemplo.com.br".to_string(),
            phone: "21999999999".to_string(),
            status: SignatureStatus::Verified,
            method: SignatureMethod::Govbr {
                identifier: "ana@gov.example".to_string(),
            },
            govbr_last_validated_at: validated,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    #[test]
    fn test_govbr_update_keeps_prior_confirmation() {
        let validated = Timestamp::parse("2026-03-01T12:00:00Z").unwrap();
        let existing = govbr_signature(Some(validated));
        assert_eq!(
            carried_validation(&existing, SignatureType::Govbr),
            Some(validated)
        );
    }

    #[test]
    fn test_type_change_clears_prior_confirmation() {
        let validated = Timestamp::parse("2026-03-01T12:00:00Z").unwrap();
        let existing = govbr_signature(Some(validated));
        assert_eq!(carried_validation(&existing, SignatureType::Custom), None);
    }

    #[test]
    fn test_unvalidated_govbr_update_stays_unvalidated() {
        let existing = govbr_signature(None);
        assert_eq!(carried_validation(&existing, SignatureType::Govbr), None);
    }
}
