//! # Payment Mode API

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use gsp_core::{ActionResponse, FieldError, PaymentModeId, Timestamp};

use crate::db::payment_modes::PaymentModeRecord;
use crate::db::{self};
use crate::error::AppError;
use crate::extractors::{extract_validated_json, Validate};
use crate::routes::{check_name, SearchQuery};
use crate::state::AppState;

const CACHE_ENTITY: &str = "payment-modes";

/// Create/update payload for a payment mode.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentModeInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Number of installments, at least 1.
    pub installments: i32,
    /// Surcharge rate in basis points.
    #[serde(default)]
    pub rate_bp: i64,
}

impl Validate for PaymentModeInput {
    fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();

        check_name(&mut errors, "name", &self.name);
        if self.installments < 1 {
            errors.push(FieldError::new("installments", "deve ser pelo menos 1"));
        }
        if self.rate_bp < 0 {
            errors.push(FieldError::new("rateBp", "deve ser maior ou igual a zero"));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl PaymentModeInput {
    fn into_record(
        self,
        id: PaymentModeId,
        created_at: Timestamp,
        now: Timestamp,
    ) -> PaymentModeRecord {
        PaymentModeRecord {
            id,
            name: self.name.trim().to_string(),
            description: self
                .description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
            installments: self.installments,
            rate_bp: self.rate_bp,
            created_at,
            updated_at: now,
        }
    }
}

/// Build the payment modes router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/v1/payment-modes",
            get(list_payment_modes).post(create_payment_mode),
        )
        .route(
            "/v1/payment-modes/:id",
            axum::routing::put(update_payment_mode).delete(delete_payment_mode),
        )
}

/// GET /v1/payment-modes — List payment modes.
#[utoipa::path(
    get,
    path = "/v1/payment-modes",
    params(SearchQuery),
    responses((status = 200, description = "Payment mode list envelope")),
    tag = "payment_modes"
)]
async fn list_payment_modes(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let key = query.cache_key(CACHE_ENTITY);
    if let Some(cached) = state.cache.get(&key) {
        return Ok(Json(cached));
    }

    let records = db::payment_modes::list(&state.db, query.term()).await?;
    let envelope = serde_json::to_value(ActionResponse::ok(records))
        .map_err(|e| AppError::Internal(format!("serialization failed: {e}")))?;
    state.cache.put(key, envelope.clone());
    Ok(Json(envelope))
}

/// POST /v1/payment-modes — Create a payment mode.
#[utoipa::path(
    post,
    path = "/v1/payment-modes",
    request_body = PaymentModeInput,
    responses(
        (status = 201, description = "Payment mode created", body = PaymentModeRecord),
        (status = 422, description = "Validation failure"),
    ),
    tag = "payment_modes"
)]
async fn create_payment_mode(
    State(state): State<AppState>,
    body: Result<Json<PaymentModeInput>, JsonRejection>,
) -> Result<(StatusCode, Json<ActionResponse<PaymentModeRecord>>), AppError> {
    let input = extract_validated_json(body)?;

    let now = Timestamp::now();
    let record = input.into_record(PaymentModeId::new(), now, now);
    db::payment_modes::insert(&state.db, &record).await?;
    state.cache.invalidate_prefix(CACHE_ENTITY);

    Ok((StatusCode::CREATED, Json(ActionResponse::ok(record))))
}

/// PUT /v1/payment-modes/:id — Update a payment mode.
#[utoipa::path(
    put,
    path = "/v1/payment-modes/{id}",
    params(("id" = Uuid, Path, description = "Payment mode ID")),
    request_body = PaymentModeInput,
    responses(
        (status = 200, description = "Payment mode updated", body = PaymentModeRecord),
        (status = 404, description = "Not found"),
        (status = 422, description = "Validation failure"),
    ),
    tag = "payment_modes"
)]
async fn update_payment_mode(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Result<Json<PaymentModeInput>, JsonRejection>,
) -> Result<Json<ActionResponse<PaymentModeRecord>>, AppError> {
    let input = extract_validated_json(body)?;

    let existing = db::payment_modes::get_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::not_found("forma de pagamento não encontrada"))?;

    let record = input.into_record(existing.id, existing.created_at, Timestamp::now());
    if !db::payment_modes::update(&state.db, &record).await? {
        return Err(AppError::not_found("forma de pagamento não encontrada"));
    }
    state.cache.invalidate_prefix(CACHE_ENTITY);

    Ok(Json(ActionResponse::ok(record)))
}

/// DELETE /v1/payment-modes/:id — Soft-delete a payment mode.
#[utoipa::path(
    delete,
    path = "/v1/payment-modes/{id}",
    params(("id" = Uuid, Path, description = "Payment mode ID")),
    responses(
        (status = 200, description = "Payment mode deleted"),
        (status = 404, description = "Not found"),
    ),
    tag = "payment_modes"
)]
async fn delete_payment_mode(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ActionResponse<serde_json::Value>>, AppError> {
    if !db::payment_modes::soft_delete(&state.db, id, Timestamp::now()).await? {
        return Err(AppError::not_found("forma de pagamento não encontrada"));
    }
    state.cache.invalidate_prefix(CACHE_ENTITY);

    Ok(Json(ActionResponse::ok(serde_json::json!({ "id": id }))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_installments_rejected() {
        let input = PaymentModeInput {
            name: "À vista".to_string(),
            description: None,
            installments: 0,
            rate_bp: 0,
        };
        let errors = Validate::validate(&input).unwrap_err();
        assert_eq!(errors[0].field, "installments");
    }

    #[test]
    fn test_negative_rate_rejected() {
        let input = PaymentModeInput {
            name: "Parcelado 12x".to_string(),
            description: None,
            installments: 12,
            rate_bp: -100,
        };
        let errors = Validate::validate(&input).unwrap_err();
        assert_eq!(errors[0].field, "rateBp");
    }
}
