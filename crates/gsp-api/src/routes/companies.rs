//! # Company API
//!
//! CRUD over the issuing-company (contratada) registry. Same per-type
//! document rule as clients.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use gsp_core::{br, ActionResponse, CompanyId, FieldError, Timestamp};

use crate::db::companies::CompanyRecord;
use crate::db::{self, PersonType};
use crate::error::AppError;
use crate::extractors::{extract_validated_json, Validate};
use crate::routes::{check_document, check_email, check_name, check_phone, SearchQuery};
use crate::state::AppState;

const CACHE_ENTITY: &str = "companies";

/// Create/update payload for a company.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompanyInput {
    #[schema(value_type = String)]
    pub person_type: PersonType,
    pub name: String,
    /// CPF or CNPJ, any formatting.
    pub document: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
}

impl Validate for CompanyInput {
    fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();

        check_name(&mut errors, "name", &self.name);
        check_document(&mut errors, "document", self.person_type, &self.document);
        check_email(&mut errors, "email", &self.email);
        check_phone(&mut errors, "phone", &self.phone);

        if let Some(uf) = self.state.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            if uf.chars().count() != 2 {
                errors.push(FieldError::new("state", "UF deve ter 2 caracteres"));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl CompanyInput {
    /// Build the normalized record. Assumes `validate` already passed.
    fn into_record(self, id: CompanyId, created_at: Timestamp, now: Timestamp) -> CompanyRecord {
        let blank_to_none =
            |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());

        CompanyRecord {
            id,
            person_type: self.person_type,
            name: self.name.trim().to_string(),
            document: br::normalize_digits(&self.document),
            email: self.email.trim().to_lowercase(),
            phone: br::normalize_digits(&self.phone),
            address: blank_to_none(self.address),
            city: blank_to_none(self.city),
            state: blank_to_none(self.state).map(|s| s.to_uppercase()),
            created_at,
            updated_at: now,
        }
    }
}

/// Build the companies router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/companies", get(list_companies).post(create_company))
        .route(
            "/v1/companies/:id",
            get(get_company).put(update_company).delete(delete_company),
        )
}

/// GET /v1/companies — List companies.
#[utoipa::path(
    get,
    path = "/v1/companies",
    params(SearchQuery),
    responses((status = 200, description = "Company list envelope")),
    tag = "companies"
)]
async fn list_companies(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let key = query.cache_key(CACHE_ENTITY);
    if let Some(cached) = state.cache.get(&key) {
        return Ok(Json(cached));
    }

    let records = db::companies::list(&state.db, query.term()).await?;
    let envelope = serde_json::to_value(ActionResponse::ok(records))
        .map_err(|e| AppError::Internal(format!("serialization failed: {e}")))?;
    state.cache.put(key, envelope.clone());
    Ok(Json(envelope))
}

/// GET /v1/companies/:id — Get a company.
#[utoipa::path(
    get,
    path = "/v1/companies/{id}",
    params(("id" = Uuid, Path, description = "Company ID")),
    responses(
        (status = 200, description = "Company found", body = CompanyRecord),
        (status = 404, description = "Not found"),
    ),
    tag = "companies"
)]
async fn get_company(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ActionResponse<CompanyRecord>>, AppError> {
    let record = db::companies::get_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::not_found("empresa não encontrada"))?;
    Ok(Json(ActionResponse::ok(record)))
}

/// POST /v1/companies — Create a company.
#[utoipa::path(
    post,
    path = "/v1/companies",
    request_body = CompanyInput,
    responses(
        (status = 201, description = "Company created", body = CompanyRecord),
        (status = 409, description = "Document already registered"),
        (status = 422, description = "Validation failure"),
    ),
    tag = "companies"
)]
async fn create_company(
    State(state): State<AppState>,
    body: Result<Json<CompanyInput>, JsonRejection>,
) -> Result<(StatusCode, Json<ActionResponse<CompanyRecord>>), AppError> {
    let input = extract_validated_json(body)?;
    let document = br::normalize_digits(&input.document);

    if db::companies::document_in_use(&state.db, &document, None).await? {
        return Err(AppError::conflict("CPF/CNPJ já cadastrado"));
    }

    let now = Timestamp::now();
    let record = input.into_record(CompanyId::new(), now, now);
    db::companies::insert(&state.db, &record).await?;
    state.cache.invalidate_prefix(CACHE_ENTITY);

    Ok((StatusCode::CREATED, Json(ActionResponse::ok(record))))
}

/// PUT /v1/companies/:id — Update a company.
#[utoipa::path(
    put,
    path = "/v1/companies/{id}",
    params(("id" = Uuid, Path, description = "Company ID")),
    request_body = CompanyInput,
    responses(
        (status = 200, description = "Company updated", body = CompanyRecord),
        (status = 404, description = "Not found"),
        (status = 409, description = "Document already registered"),
        (status = 422, description = "Validation failure"),
    ),
    tag = "companies"
)]
async fn update_company(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Result<Json<CompanyInput>, JsonRejection>,
) -> Result<Json<ActionResponse<CompanyRecord>>, AppError> {
    let input = extract_validated_json(body)?;

    let existing = db::companies::get_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::not_found("empresa não encontrada"))?;

    let document = br::normalize_digits(&input.document);
    if db::companies::document_in_use(&state.db, &document, Some(id)).await? {
        return Err(AppError::conflict("CPF/CNPJ já cadastrado"));
    }

    let record = input.into_record(existing.id, existing.created_at, Timestamp::now());
    if !db::companies::update(&state.db, &record).await? {
        return Err(AppError::not_found("empresa não encontrada"));
    }
    state.cache.invalidate_prefix(CACHE_ENTITY);

    Ok(Json(ActionResponse::ok(record)))
}

/// DELETE /v1/companies/:id — Soft-delete a company.
#[utoipa::path(
    delete,
    path = "/v1/companies/{id}",
    params(("id" = Uuid, Path, description = "Company ID")),
    responses(
        (status = 200, description = "Company deleted"),
        (status = 404, description = "Not found"),
    ),
    tag = "companies"
)]
async fn delete_company(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ActionResponse<serde_json::Value>>, AppError> {
    if !db::companies::soft_delete(&state.db, id, Timestamp::now()).await? {
        return Err(AppError::not_found("empresa não encontrada"));
    }
    state.cache.invalidate_prefix(CACHE_ENTITY);

    Ok(Json(ActionResponse::ok(serde_json::json!({ "id": id }))))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> CompanyInput {
        CompanyInput {
            person_type: PersonType::Juridica,
            name: "GS Produções".to_string(),
            document: "11.222.333/0001-81".to_string(),
            email: "contato@gsproducoes.com.br".to_string(),
            phone: "(11) 3456-7890".to_string(),
            address: Some("Rua das Flores, 123".to_string()),
            city: Some("Campinas".to_string()),
            state: Some("SP".to_string()),
        }
    }

    #[test]
    fn test_valid_input_passes() {
        assert!(Validate::validate(&input()).is_ok());
    }

    #[test]
    fn test_bad_cnpj_rejected() {
        let mut bad = input();
        bad.document = "11.222.333/0001-82".to_string();
        let errors = Validate::validate(&bad).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "document");
    }

    #[test]
    fn test_record_normalization() {
        let now = Timestamp::now();
        let record = input().into_record(CompanyId::new(), now, now);
        assert_eq!(record.document, "11222333000181");
        assert_eq!(record.phone, "1134567890");
    }
}
