//! # Client API
//!
//! CRUD over the contratante registry. The document rule dispatches on
//! the person type (CPF for `fisica`, CNPJ for `juridica`) and the
//! secondary contact list is replaced wholesale on update.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use gsp_core::{br, ActionResponse, ClientId, FieldError, Timestamp};

use crate::db::clients::{ClientRecord, SecondaryContact};
use crate::db::{self, PersonType};
use crate::error::AppError;
use crate::extractors::{extract_validated_json, Validate};
use crate::routes::{check_document, check_email, check_name, check_phone, SearchQuery};
use crate::state::AppState;

const CACHE_ENTITY: &str = "clients";
const MAX_CONTACTS: usize = 10;

/// Create/update payload for a client.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientInput {
    #[schema(value_type = String)]
    pub person_type: PersonType,
    pub name: String,
    /// CPF or CNPJ, any formatting.
    pub document: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub cep: Option<String>,
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default)]
    pub street_number: Option<String>,
    #[serde(default)]
    pub complement: Option<String>,
    #[serde(default)]
    pub neighborhood: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub contacts: Vec<ContactInput>,
}

/// One secondary contact in the payload.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContactInput {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

impl Validate for ClientInput {
    fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();

        check_name(&mut errors, "name", &self.name);
        check_document(&mut errors, "document", self.person_type, &self.document);
        check_email(&mut errors, "email", &self.email);
        check_phone(&mut errors, "phone", &self.phone);

        if let Some(cep) = self.cep.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
            if !br::validate_cep(cep) {
                errors.push(FieldError::new("cep", "CEP inválido"));
            }
        }
        if let Some(uf) = self.state.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            if uf.chars().count() != 2 {
                errors.push(FieldError::new("state", "UF deve ter 2 caracteres"));
            }
        }

        if self.contacts.len() > MAX_CONTACTS {
            errors.push(FieldError::new(
                "contacts",
                format!("no máximo {MAX_CONTACTS} contatos"),
            ));
        }
        for (i, contact) in self.contacts.iter().enumerate() {
            if contact.name.trim().is_empty() {
                errors.push(FieldError::new(format!("contacts[{i}].name"), "obrigatório"));
            }
            if let Some(email) = contact.email.as_deref().filter(|e| !e.trim().is_empty()) {
                check_email(&mut errors, &format!("contacts[{i}].email"), email);
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl ClientInput {
    /// Build the normalized record. Assumes `validate` already passed.
    fn into_record(self, id: ClientId, created_at: Timestamp, now: Timestamp) -> ClientRecord {
        let blank_to_none =
            |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());

        ClientRecord {
            id,
            person_type: self.person_type,
            name: self.name.trim().to_string(),
            document: br::normalize_digits(&self.document),
            email: self.email.trim().to_lowercase(),
            phone: br::normalize_digits(&self.phone),
            cep: blank_to_none(self.cep).map(|c| br::normalize_digits(&c)),
            street: blank_to_none(self.street),
            street_number: blank_to_none(self.street_number),
            complement: blank_to_none(self.complement),
            neighborhood: blank_to_none(self.neighborhood),
            city: blank_to_none(self.city),
            state: blank_to_none(self.state).map(|s| s.to_uppercase()),
            contacts: self
                .contacts
                .into_iter()
                .map(|c| SecondaryContact {
                    name: c.name.trim().to_string(),
                    email: c.email.map(|e| e.trim().to_lowercase()).filter(|e| !e.is_empty()),
                    phone: c.phone.map(|p| br::normalize_digits(&p)).filter(|p| !p.is_empty()),
                    role: c.role.map(|r| r.trim().to_string()).filter(|r| !r.is_empty()),
                })
                .collect(),
            created_at,
            updated_at: now,
        }
    }
}

/// Build the clients router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/clients", get(list_clients).post(create_client))
        .route(
            "/v1/clients/:id",
            get(get_client).put(update_client).delete(delete_client),
        )
}

/// GET /v1/clients — List clients.
#[utoipa::path(
    get,
    path = "/v1/clients",
    params(SearchQuery),
    responses((status = 200, description = "Client list envelope")),
    tag = "clients"
)]
async fn list_clients(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let key = query.cache_key(CACHE_ENTITY);
    if let Some(cached) = state.cache.get(&key) {
        return Ok(Json(cached));
    }

    let records = db::clients::list(&state.db, query.term()).await?;
    let envelope = serde_json::to_value(ActionResponse::ok(records))
        .map_err(|e| AppError::Internal(format!("serialization failed: {e}")))?;
    state.cache.put(key, envelope.clone());
    Ok(Json(envelope))
}

/// GET /v1/clients/:id — Get a client.
#[utoipa::path(
    get,
    path = "/v1/clients/{id}",
    params(("id" = Uuid, Path, description = "Client ID")),
    responses(
        (status = 200, description = "Client found", body = ClientRecord),
        (status = 404, description = "Not found"),
    ),
    tag = "clients"
)]
async fn get_client(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ActionResponse<ClientRecord>>, AppError> {
    let record = db::clients::get_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::not_found("cliente não encontrado"))?;
    Ok(Json(ActionResponse::ok(record)))
}

/// POST /v1/clients — Create a client.
#[utoipa::path(
    post,
    path = "/v1/clients",
    request_body = ClientInput,
    responses(
        (status = 201, description = "Client created", body = ClientRecord),
        (status = 409, description = "Document already registered"),
        (status = 422, description = "Validation failure"),
    ),
    tag = "clients"
)]
async fn create_client(
    State(state): State<AppState>,
    body: Result<Json<ClientInput>, JsonRejection>,
) -> Result<(StatusCode, Json<ActionResponse<ClientRecord>>), AppError> {
    let input = extract_validated_json(body)?;
    let document = br::normalize_digits(&input.document);

    if db::clients::document_in_use(&state.db, &document, None).await? {
        return Err(AppError::conflict("CPF/CNPJ já cadastrado"));
    }

    let now = Timestamp::now();
    let record = input.into_record(ClientId::new(), now, now);
    db::clients::insert(&state.db, &record).await?;
    state.cache.invalidate_prefix(CACHE_ENTITY);

    Ok((StatusCode::CREATED, Json(ActionResponse::ok(record))))
}

/// PUT /v1/clients/:id — Update a client.
#[utoipa::path(
    put,
    path = "/v1/clients/{id}",
    params(("id" = Uuid, Path, description = "Client ID")),
    request_body = ClientInput,
    responses(
        (status = 200, description = "Client updated", body = ClientRecord),
        (status = 404, description = "Not found"),
        (status = 409, description = "Document already registered"),
        (status = 422, description = "Validation failure"),
    ),
    tag = "clients"
)]
async fn update_client(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Result<Json<ClientInput>, JsonRejection>,
) -> Result<Json<ActionResponse<ClientRecord>>, AppError> {
    let input = extract_validated_json(body)?;

    let existing = db::clients::get_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::not_found("cliente não encontrado"))?;

    let document = br::normalize_digits(&input.document);
    if db::clients::document_in_use(&state.db, &document, Some(id)).await? {
        return Err(AppError::conflict("CPF/CNPJ já cadastrado"));
    }

    let record = input.into_record(existing.id, existing.created_at, Timestamp::now());
    if !db::clients::update(&state.db, &record).await? {
        return Err(AppError::not_found("cliente não encontrado"));
    }
    state.cache.invalidate_prefix(CACHE_ENTITY);

    Ok(Json(ActionResponse::ok(record)))
}

/// DELETE /v1/clients/:id — Soft-delete a client.
#[utoipa::path(
    delete,
    path = "/v1/clients/{id}",
    params(("id" = Uuid, Path, description = "Client ID")),
    responses(
        (status = 200, description = "Client deleted"),
        (status = 404, description = "Not found"),
    ),
    tag = "clients"
)]
async fn delete_client(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ActionResponse<serde_json::Value>>, AppError> {
    if !db::clients::soft_delete(&state.db, id, Timestamp::now()).await? {
        return Err(AppError::not_found("cliente não encontrado"));
    }
    state.cache.invalidate_prefix(CACHE_ENTITY);

    Ok(Json(ActionResponse::ok(serde_json::json!({ "id": id }))))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> ClientInput {
        ClientInput {
            person_type: PersonType::Juridica,
            name: "Empresa Exemplo Ltda".to_string(),
            document: "04.252.011/0001-10".to_string(),
            email: "Contato@Empresa.com.br ".to_string(),
            phone: "(11) 98765-4321".to_string(),
            cep: Some("01310-100".to_string()),
            street: Some("Av. Paulista".to_string()),
            street_number: Some("1000".to_string()),
            complement: None,
            neighborhood: Some("Bela Vista".to_string()),
            city: Some("São Paulo".to_string()),
            state: Some("sp".to_string()),
            contacts: vec![ContactInput {
                name: "Maria".to_string(),
                email: Some("maria@empresa.com.br".to_string()),
                phone: None,
                role: Some("Financeiro".to_string()),
            }],
        }
    }

    #[test]
    fn test_valid_input_passes() {
        assert!(Validate::validate(&input()).is_ok());
    }

    #[test]
    fn test_person_type_document_mismatch() {
        let mut bad = input();
        bad.person_type = PersonType::Fisica;
        let errors = Validate::validate(&bad).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "document"));
    }

    #[test]
    fn test_contact_errors_are_indexed() {
        let mut bad = input();
        bad.contacts.push(ContactInput {
            name: "  ".to_string(),
            email: Some("sem-arroba".to_string()),
            phone: None,
            role: None,
        });
        let errors = Validate::validate(&bad).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "contacts[1].name"));
        assert!(errors.iter().any(|e| e.field == "contacts[1].email"));
    }

    #[test]
    fn test_record_normalization() {
        let now = Timestamp::now();
        let record = input().into_record(ClientId::new(), now, now);
        assert_eq!(record.document, "04252011000110");
        assert_eq!(record.email, "contato@empresa.com.br");
        assert_eq!(record.phone, "11987654321");
        assert_eq!(record.cep.as_deref(), Some("01310100"));
        assert_eq!(record.state.as_deref(), Some("SP"));
    }
}
