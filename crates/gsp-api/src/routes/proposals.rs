//! # Proposal API
//!
//! Proposal lifecycle, transactional item replacement, and the PDF
//! document endpoint. The stored total is always recomputed server-side
//! from the item lines minus the discount.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use gsp_core::{br, ActionResponse, FieldError, Money, ProposalId, Quantity, Timestamp};
use gsp_document::{
    render_proposal, ClientBlock, CompanyBlock, DocumentItem, ProposalDocumentData,
};

use crate::db::clients::ClientRecord;
use crate::db::companies::CompanyRecord;
use crate::db::proposals::{ProposalItemRecord, ProposalRecord, ProposalStatus};
use crate::db::{self};
use crate::error::AppError;
use crate::extractors::{extract_validated_json, Validate};
use crate::routes::{check_name, SearchQuery};
use crate::state::AppState;

const CACHE_ENTITY: &str = "proposals";
const CODE_MAX: usize = 32;
const TITLE_MAX: usize = 160;
const MAX_ITEMS: usize = 100;

/// Create/update payload for a proposal.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProposalInput {
    pub code: String,
    pub title: String,
    #[schema(value_type = String)]
    pub status: ProposalStatus,
    pub client_id: Uuid,
    pub company_id: Uuid,
    #[serde(default)]
    pub payment_mode_id: Option<Uuid>,
    pub responsible_name: String,
    /// RFC 3339 timestamp.
    pub issue_date: String,
    #[serde(default)]
    pub validity_date: Option<String>,
    /// Discount in centavos.
    #[serde(default)]
    pub discount: i64,
    #[serde(default)]
    pub observations: Option<String>,
    pub city: String,
    #[serde(default)]
    pub items: Vec<ProposalItemInput>,
}

/// One proposal line in the payload.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProposalItemInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Quantity in hundredths (e.g. `250` = 2.50 units).
    pub quantity: i64,
    /// Unit price in centavos.
    pub unit_price: i64,
}

/// Item replacement payload for `PUT /v1/proposals/:id/items`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ReplaceItemsInput {
    pub items: Vec<ProposalItemInput>,
}

fn check_items(errors: &mut Vec<FieldError>, items: &[ProposalItemInput]) {
    if items.len() > MAX_ITEMS {
        errors.push(FieldError::new(
            "items",
            format!("no máximo {MAX_ITEMS} itens"),
        ));
    }
    for (i, item) in items.iter().enumerate() {
        if item.name.trim().is_empty() {
            errors.push(FieldError::new(format!("items[{i}].name"), "obrigatório"));
        }
        if item.quantity <= 0 {
            errors.push(FieldError::new(
                format!("items[{i}].quantity"),
                "deve ser maior que zero",
            ));
        }
        if item.unit_price < 0 {
            errors.push(FieldError::new(
                format!("items[{i}].unitPrice"),
                "deve ser maior ou igual a zero",
            ));
        }
    }
}

impl Validate for ProposalInput {
    fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();

        let code_len = self.code.trim().chars().count();
        if !(1..=CODE_MAX).contains(&code_len) {
            errors.push(FieldError::new(
                "code",
                format!("deve ter entre 1 e {CODE_MAX} caracteres"),
            ));
        }
        let title_len = self.title.trim().chars().count();
        if !(2..=TITLE_MAX).contains(&title_len) {
            errors.push(FieldError::new(
                "title",
                format!("deve ter entre 2 e {TITLE_MAX} caracteres"),
            ));
        }
        check_name(&mut errors, "responsibleName", &self.responsible_name);

        if Timestamp::parse(self.issue_date.trim()).is_err() {
            errors.push(FieldError::new("issueDate", "data inválida"));
        }
        if let Some(validity) = self.validity_date.as_deref().map(str::trim) {
            if !validity.is_empty() && Timestamp::parse(validity).is_err() {
                errors.push(FieldError::new("validityDate", "data inválida"));
            }
        }

        if self.discount < 0 {
            errors.push(FieldError::new("discount", "deve ser maior ou igual a zero"));
        }
        if self.city.trim().is_empty() {
            errors.push(FieldError::new("city", "obrigatório"));
        }
        check_items(&mut errors, &self.items);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl Validate for ReplaceItemsInput {
    fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        check_items(&mut errors, &self.items);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn item_records(items: Vec<ProposalItemInput>) -> Vec<ProposalItemRecord> {
    items
        .into_iter()
        .map(|i| ProposalItemRecord {
            name: i.name.trim().to_string(),
            description: i
                .description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
            quantity: Quantity::from_hundredths(i.quantity),
            unit_price: Money::from_centavos(i.unit_price),
        })
        .collect()
}

impl ProposalInput {
    /// Build the normalized record. Assumes `validate` already passed;
    /// unparseable dates fall back to now rather than panicking.
    fn into_record(self, id: ProposalId, created_at: Timestamp, now: Timestamp) -> ProposalRecord {
        let issue_date = Timestamp::parse(self.issue_date.trim()).unwrap_or(now);
        let validity_date = self
            .validity_date
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .and_then(|v| Timestamp::parse(v).ok());
        let items = item_records(self.items);

        let discount = Money::from_centavos(self.discount);
        let total_value = db::proposals::compute_total(&items, discount);

        ProposalRecord {
            id,
            code: self.code.trim().to_string(),
            title: self.title.trim().to_string(),
            status: self.status,
            client_id: self.client_id.into(),
            company_id: self.company_id.into(),
            payment_mode_id: self.payment_mode_id.map(Into::into),
            responsible_name: self.responsible_name.trim().to_string(),
            issue_date,
            validity_date,
            discount,
            total_value,
            observations: self
                .observations
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty()),
            city: self.city.trim().to_string(),
            items,
            created_at,
            updated_at: now,
        }
    }
}

/// Resolve the referenced client, company, and payment mode, turning a
/// dangling pointer into a field-scoped validation error.
async fn check_references(
    state: &AppState,
    input: &ProposalInput,
) -> Result<(ClientRecord, CompanyRecord), AppError> {
    let mut errors = Vec::new();

    let client = db::clients::get_by_id(&state.db, input.client_id).await?;
    if client.is_none() {
        errors.push(FieldError::new("clientId", "cliente não encontrado"));
    }
    let company = db::companies::get_by_id(&state.db, input.company_id).await?;
    if company.is_none() {
        errors.push(FieldError::new("companyId", "empresa não encontrada"));
    }
    if let Some(payment_mode_id) = input.payment_mode_id {
        if !db::payment_modes::exists(&state.db, payment_mode_id).await? {
            errors.push(FieldError::new(
                "paymentModeId",
                "forma de pagamento não encontrada",
            ));
        }
    }

    match (client, company) {
        (Some(client), Some(company)) if errors.is_empty() => Ok((client, company)),
        _ => Err(AppError::validation(errors)),
    }
}

/// Build the proposals router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/proposals", get(list_proposals).post(create_proposal))
        .route(
            "/v1/proposals/:id",
            get(get_proposal).put(update_proposal).delete(delete_proposal),
        )
        .route("/v1/proposals/:id/items", axum::routing::put(replace_items))
        .route("/v1/proposals/:id/document", get(proposal_document))
}

/// GET /v1/proposals — List proposals.
#[utoipa::path(
    get,
    path = "/v1/proposals",
    params(SearchQuery),
    responses((status = 200, description = "Proposal list envelope")),
    tag = "proposals"
)]
async fn list_proposals(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let key = query.cache_key(CACHE_ENTITY);
    if let Some(cached) = state.cache.get(&key) {
        return Ok(Json(cached));
    }

    let records = db::proposals::list(&state.db, query.term()).await?;
    let envelope = serde_json::to_value(ActionResponse::ok(records))
        .map_err(|e| AppError::Internal(format!("serialization failed: {e}")))?;
    state.cache.put(key, envelope.clone());
    Ok(Json(envelope))
}

/// GET /v1/proposals/:id — Get a proposal with its items.
#[utoipa::path(
    get,
    path = "/v1/proposals/{id}",
    params(("id" = Uuid, Path, description = "Proposal ID")),
    responses(
        (status = 200, description = "Proposal found", body = ProposalRecord),
        (status = 404, description = "Not found"),
    ),
    tag = "proposals"
)]
async fn get_proposal(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ActionResponse<ProposalRecord>>, AppError> {
    let record = db::proposals::get_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::not_found("proposta não encontrada"))?;
    Ok(Json(ActionResponse::ok(record)))
}

/// POST /v1/proposals — Create a proposal.
#[utoipa::path(
    post,
    path = "/v1/proposals",
    request_body = ProposalInput,
    responses(
        (status = 201, description = "Proposal created", body = ProposalRecord),
        (status = 409, description = "Code already registered"),
        (status = 422, description = "Validation failure"),
    ),
    tag = "proposals"
)]
async fn create_proposal(
    State(state): State<AppState>,
    body: Result<Json<ProposalInput>, JsonRejection>,
) -> Result<(StatusCode, Json<ActionResponse<ProposalRecord>>), AppError> {
    let input = extract_validated_json(body)?;
    check_references(&state, &input).await?;

    let code = input.code.trim();
    if db::proposals::code_in_use(&state.db, code, None).await? {
        return Err(AppError::conflict("Código já cadastrado"));
    }

    let now = Timestamp::now();
    let record = input.into_record(ProposalId::new(), now, now);
    db::proposals::insert(&state.db, &record).await?;
    state.cache.invalidate_prefix(CACHE_ENTITY);

    Ok((StatusCode::CREATED, Json(ActionResponse::ok(record))))
}

/// PUT /v1/proposals/:id — Update a proposal, replacing its items.
#[utoipa::path(
    put,
    path = "/v1/proposals/{id}",
    params(("id" = Uuid, Path, description = "Proposal ID")),
    request_body = ProposalInput,
    responses(
        (status = 200, description = "Proposal updated", body = ProposalRecord),
        (status = 404, description = "Not found"),
        (status = 409, description = "Code already registered"),
        (status = 422, description = "Validation failure"),
    ),
    tag = "proposals"
)]
async fn update_proposal(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Result<Json<ProposalInput>, JsonRejection>,
) -> Result<Json<ActionResponse<ProposalRecord>>, AppError> {
    let input = extract_validated_json(body)?;
    check_references(&state, &input).await?;

    let existing = db::proposals::get_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::not_found("proposta não encontrada"))?;

    let code = input.code.trim();
    if db::proposals::code_in_use(&state.db, code, Some(id)).await? {
        return Err(AppError::conflict("Código já cadastrado"));
    }

    let now = Timestamp::now();
    let record = input.into_record(existing.id, existing.created_at, now);
    if !db::proposals::update(&state.db, &record).await? {
        return Err(AppError::not_found("proposta não encontrada"));
    }
    if !db::proposals::replace_items(&state.db, id, &record.items, now).await? {
        return Err(AppError::not_found("proposta não encontrada"));
    }
    state.cache.invalidate_prefix(CACHE_ENTITY);

    Ok(Json(ActionResponse::ok(record)))
}

/// PUT /v1/proposals/:id/items — Replace the item list.
#[utoipa::path(
    put,
    path = "/v1/proposals/{id}/items",
    params(("id" = Uuid, Path, description = "Proposal ID")),
    request_body = ReplaceItemsInput,
    responses(
        (status = 200, description = "Items replaced", body = ProposalRecord),
        (status = 404, description = "Not found"),
        (status = 422, description = "Validation failure"),
    ),
    tag = "proposals"
)]
async fn replace_items(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Result<Json<ReplaceItemsInput>, JsonRejection>,
) -> Result<Json<ActionResponse<ProposalRecord>>, AppError> {
    let input = extract_validated_json(body)?;
    let items = item_records(input.items);

    if !db::proposals::replace_items(&state.db, id, &items, Timestamp::now()).await? {
        return Err(AppError::not_found("proposta não encontrada"));
    }
    state.cache.invalidate_prefix(CACHE_ENTITY);

    let record = db::proposals::get_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::not_found("proposta não encontrada"))?;
    Ok(Json(ActionResponse::ok(record)))
}

/// DELETE /v1/proposals/:id — Soft-delete a proposal.
#[utoipa::path(
    delete,
    path = "/v1/proposals/{id}",
    params(("id" = Uuid, Path, description = "Proposal ID")),
    responses(
        (status = 200, description = "Proposal deleted"),
        (status = 404, description = "Not found"),
    ),
    tag = "proposals"
)]
async fn delete_proposal(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ActionResponse<serde_json::Value>>, AppError> {
    if !db::proposals::soft_delete(&state.db, id, Timestamp::now()).await? {
        return Err(AppError::not_found("proposta não encontrada"));
    }
    state.cache.invalidate_prefix(CACHE_ENTITY);

    Ok(Json(ActionResponse::ok(serde_json::json!({ "id": id }))))
}

/// GET /v1/proposals/:id/document — Render the proposal PDF.
#[utoipa::path(
    get,
    path = "/v1/proposals/{id}/document",
    params(("id" = Uuid, Path, description = "Proposal ID")),
    responses(
        (status = 200, description = "PDF document", content_type = "application/pdf"),
        (status = 404, description = "Not found"),
    ),
    tag = "proposals"
)]
async fn proposal_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let proposal = db::proposals::get_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::not_found("proposta não encontrada"))?;
    let client = db::clients::get_by_id(&state.db, *proposal.client_id.as_uuid())
        .await?
        .ok_or_else(|| AppError::not_found("cliente não encontrado"))?;
    let company = db::companies::get_by_id(&state.db, *proposal.company_id.as_uuid())
        .await?
        .ok_or_else(|| AppError::not_found("empresa não encontrada"))?;

    let data = document_data(&proposal, &client, &company);
    let bytes = render_proposal(&data);

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("inline; filename=\"proposta-{}.pdf\"", proposal.code),
            ),
        ],
        bytes,
    ))
}

/// Assemble the document model with display-formatted documents and
/// phones.
fn document_data(
    proposal: &ProposalRecord,
    client: &ClientRecord,
    company: &CompanyRecord,
) -> ProposalDocumentData {
    let company_address = {
        let mut parts: Vec<&str> = Vec::new();
        if let Some(address) = company.address.as_deref() {
            parts.push(address);
        }
        if let Some(city) = company.city.as_deref() {
            parts.push(city);
        }
        if let Some(state) = company.state.as_deref() {
            parts.push(state);
        }
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(", "))
        }
    };

    ProposalDocumentData {
        code: proposal.code.clone(),
        title: proposal.title.clone(),
        status: proposal.status.as_str().to_string(),
        issue_date: proposal.issue_date,
        validity_date: proposal.validity_date,
        company: CompanyBlock {
            name: company.name.clone(),
            document: format_document(&company.document),
            email: company.email.clone(),
            phone: br::format_phone(&company.phone),
            address: company_address,
        },
        client: ClientBlock {
            name: client.name.clone(),
            document: format_document(&client.document),
            email: client.email.clone(),
            phone: br::format_phone(&client.phone),
        },
        responsible_name: proposal.responsible_name.clone(),
        items: proposal
            .items
            .iter()
            .map(|i| DocumentItem {
                name: i.name.clone(),
                description: i.description.clone(),
                quantity: i.quantity,
                unit_price: i.unit_price,
            })
            .collect(),
        discount: proposal.discount,
        observations: proposal.observations.clone(),
        city: proposal.city.clone(),
    }
}

/// Display form dispatched on digit count: 11 → CPF, 14 → CNPJ,
/// anything else unchanged.
fn format_document(digits: &str) -> String {
    match digits.len() {
        11 => br::format_cpf(digits),
        14 => br::format_cnpj(digits),
        _ => digits.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> ProposalInput {
        ProposalInput {
            code: "PROP-2026-001".to_string(),
            title: "Cobertura de evento corporativo".to_string(),
            status: ProposalStatus::Draft,
            client_id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            payment_mode_id: None,
            responsible_name: "Gabriel Souza".to_string(),
            issue_date: "2026-03-01T12:00:00Z".to_string(),
            validity_date: Some("2026-04-01T12:00:00Z".to_string()),
            discount: 500,
            observations: None,
            city: "Campinas".to_string(),
            items: vec![ProposalItemInput {
                name: "Captação de vídeo".to_string(),
                description: None,
                quantity: 200,
                unit_price: 2_500,
            }],
        }
    }

    #[test]
    fn test_valid_input_passes() {
        assert!(Validate::validate(&input()).is_ok());
    }

    #[test]
    fn test_bad_dates_and_items_accumulate() {
        let mut bad = input();
        bad.issue_date = "01/03/2026".to_string();
        bad.items.push(ProposalItemInput {
            name: String::new(),
            description: None,
            quantity: 0,
            unit_price: -1,
        });
        let errors = Validate::validate(&bad).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert!(fields.contains(&"issueDate"));
        assert!(fields.contains(&"items[1].name"));
        assert!(fields.contains(&"items[1].quantity"));
        assert!(fields.contains(&"items[1].unitPrice"));
    }

    #[test]
    fn test_record_total_is_computed() {
        let now = Timestamp::now();
        let record = input().into_record(ProposalId::new(), now, now);
        // 2.00 x R$ 25,00 - R$ 5,00 = R$ 45,00
        assert_eq!(record.total_value.centavos(), 4_500);
    }

    #[test]
    fn test_format_document_dispatch() {
        assert_eq!(format_document("52998224725"), "529.982.247-25");
        assert_eq!(format_document("04252011000110"), "04.252.011/0001-10");
        assert_eq!(format_document("123"), "123");
    }
}
