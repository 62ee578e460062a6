//! # OpenAPI Specification Assembly
//!
//! Assembles all utoipa-documented routes into a single spec served at
//! `/openapi.json`. The API carries no authentication, so no security
//! scheme is registered.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

/// Assembled OpenAPI spec for the entire API surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "GSP API — Proposal Backend",
        version = "0.3.2",
        description = "HTTP backend for the gs-propostas proposal management product.\n\nProvides:\n- **Signatures**: signer records with Gov.br/custom methods and validation transitions\n- **Cadastros**: clients (with secondary contacts), issuing companies, catalog items, categories, payment modes, and reusable notes\n- **Proposals**: lifecycle with transactional item replacement, server-side totals, and PDF document rendering\n\nEvery JSON endpoint answers with the uniform envelope `{\"success\":true,\"data\":…}` or `{\"success\":false,\"error\":{\"code\",\"message\"}}`. Health probes (`/health/*`) and `/metrics` sit outside the `/v1` surface.",
        license(name = "AGPL-3.0-or-later"),
        contact(name = "GS Produções", url = "https://github.com/gs-producoes/gsp-stack")
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server"),
    ),
    paths(
        // ── Signatures ───────────────────────────────────────────────────
        crate::routes::signatures::list_signatures,
        crate::routes::signatures::create_signature,
        crate::routes::signatures::update_signature,
        crate::routes::signatures::delete_signature,
        crate::routes::signatures::request_validation,
        crate::routes::signatures::complete_validation,
        // ── Clients ──────────────────────────────────────────────────────
        crate::routes::clients::list_clients,
        crate::routes::clients::get_client,
        crate::routes::clients::create_client,
        crate::routes::clients::update_client,
        crate::routes::clients::delete_client,
        // ── Companies ────────────────────────────────────────────────────
        crate::routes::companies::list_companies,
        crate::routes::companies::get_company,
        crate::routes::companies::create_company,
        crate::routes::companies::update_company,
        crate::routes::companies::delete_company,
        // ── Catalog ──────────────────────────────────────────────────────
        crate::routes::items::list_items,
        crate::routes::items::create_item,
        crate::routes::items::update_item,
        crate::routes::items::delete_item,
        crate::routes::categories::list_categories,
        crate::routes::categories::create_category,
        crate::routes::categories::update_category,
        crate::routes::categories::delete_category,
        crate::routes::payment_modes::list_payment_modes,
        crate::routes::payment_modes::create_payment_mode,
        crate::routes::payment_modes::update_payment_mode,
        crate::routes::payment_modes::delete_payment_mode,
        crate::routes::notes::list_notes,
        crate::routes::notes::create_note,
        crate::routes::notes::update_note,
        crate::routes::notes::delete_note,
        // ── Proposals ────────────────────────────────────────────────────
        crate::routes::proposals::list_proposals,
        crate::routes::proposals::get_proposal,
        crate::routes::proposals::create_proposal,
        crate::routes::proposals::update_proposal,
        crate::routes::proposals::replace_items,
        crate::routes::proposals::delete_proposal,
        crate::routes::proposals::proposal_document,
        // ── Health ───────────────────────────────────────────────────────
        crate::routes::health::liveness,
        crate::routes::health::readiness,
    ),
    components(
        schemas(
            gsp_state::SignatureInput,
            crate::routes::clients::ClientInput,
            crate::routes::clients::ContactInput,
            crate::routes::companies::CompanyInput,
            crate::routes::items::ItemInput,
            crate::routes::categories::CategoryInput,
            crate::routes::payment_modes::PaymentModeInput,
            crate::routes::notes::NoteInput,
            crate::routes::proposals::ProposalInput,
            crate::routes::proposals::ProposalItemInput,
            crate::routes::proposals::ReplaceItemsInput,
            crate::db::PersonType,
            crate::db::clients::ClientRecord,
            crate::db::clients::SecondaryContact,
            crate::db::companies::CompanyRecord,
            crate::db::items::ItemRecord,
            crate::db::items::ItemType,
            crate::db::categories::CategoryRecord,
            crate::db::payment_modes::PaymentModeRecord,
            crate::db::notes::NoteRecord,
            crate::db::notes::InclusionMode,
            crate::db::proposals::ProposalRecord,
            crate::db::proposals::ProposalItemRecord,
            crate::db::proposals::ProposalStatus,
        )
    ),
    tags(
        (name = "signatures", description = "Signer records and Gov.br validation"),
        (name = "clients", description = "Client registry"),
        (name = "companies", description = "Issuing companies"),
        (name = "items", description = "Product/service catalog"),
        (name = "categories", description = "Catalog categories"),
        (name = "payment_modes", description = "Payment arrangements"),
        (name = "notes", description = "Reusable proposal notes"),
        (name = "proposals", description = "Proposal lifecycle and documents"),
        (name = "health", description = "Health probes"),
    )
)]
pub struct ApiDoc;

/// Build the OpenAPI router serving the assembled spec.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(serve_openapi))
}

async fn serve_openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_contains_all_entity_paths() {
        let spec = ApiDoc::openapi();
        let paths: Vec<&String> = spec.paths.paths.keys().collect();
        for expected in [
            "/v1/signatures",
            "/v1/signatures/{id}/validation/complete",
            "/v1/clients/{id}",
            "/v1/companies",
            "/v1/items/{id}",
            "/v1/categories",
            "/v1/payment-modes",
            "/v1/notes",
            "/v1/proposals/{id}/items",
            "/v1/proposals/{id}/document",
            "/health/readiness",
        ] {
            assert!(
                paths.iter().any(|p| *p == expected),
                "missing path {expected}"
            );
        }
    }
}
