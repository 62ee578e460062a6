//! # API Route Modules
//!
//! One module per entity, each exporting a `router()` merged in
//! `lib.rs`:
//!
//! - `signatures` — signer records with the Gov.br/custom method union
//!   and the validation transitions.
//! - `clients` — contratante registry with secondary contacts.
//! - `companies` — issuing-company (contratada) registry.
//! - `items` — product/service catalog.
//! - `categories` — catalog categories.
//! - `payment_modes` — payment arrangements.
//! - `notes` — reusable proposal text blocks.
//! - `proposals` — proposal lifecycle, item lines, and the PDF document
//!   endpoint.
//! - `health` — liveness and readiness probes.
//!
//! Every JSON handler resolves to the `ActionResponse` envelope. List
//! handlers consult the query cache under the key
//! `"<entity>?search=<term>"` and store the serialized envelope;
//! mutations call `invalidate_prefix("<entity>")`.

pub mod categories;
pub mod clients;
pub mod companies;
pub mod health;
pub mod items;
pub mod notes;
pub mod payment_modes;
pub mod proposals;
pub mod signatures;

use serde::Deserialize;

/// Query string accepted by every list endpoint.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct SearchQuery {
    /// Case-insensitive substring filter.
    pub search: Option<String>,
}

impl SearchQuery {
    /// The trimmed search term, `None` when absent or blank.
    pub fn term(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    /// Cache key for this entity and term.
    pub fn cache_key(&self, entity: &str) -> String {
        format!("{entity}?search={}", self.term().unwrap_or(""))
    }
}

// ─── Shared field checks ─────────────────────────────────────────────
//
// The signature payload has its own validation in `gsp-state`; the
// registry payloads (clients, companies, catalog) share these helpers.
// All messages are pt-BR, field names use the wire casing.

use gsp_core::{br, FieldError};

use crate::db::PersonType;

pub(crate) fn check_name(errors: &mut Vec<FieldError>, field: &str, value: &str) {
    let len = value.trim().chars().count();
    if !(2..=120).contains(&len) {
        errors.push(FieldError::new(field, "deve ter entre 2 e 120 caracteres"));
    }
}

pub(crate) fn check_email(errors: &mut Vec<FieldError>, field: &str, value: &str) {
    let email = value.trim().to_lowercase();
    let len = email.chars().count();
    if !(5..=160).contains(&len) || !is_plausible_email(&email) {
        errors.push(FieldError::new(field, "e-mail inválido"));
    }
}

pub(crate) fn check_phone(errors: &mut Vec<FieldError>, field: &str, value: &str) {
    let raw = value.trim();
    let digits = br::normalize_digits(raw);
    if raw.chars().count() > 20 || digits.len() < 10 {
        errors.push(FieldError::new(field, "telefone inválido"));
    }
}

/// Document check dispatched on the person type: natural persons carry
/// a CPF, legal persons a CNPJ.
pub(crate) fn check_document(
    errors: &mut Vec<FieldError>,
    field: &str,
    person_type: PersonType,
    value: &str,
) {
    let valid = match person_type {
        PersonType::Fisica => br::validate_cpf(value),
        PersonType::Juridica => br::validate_cnpj(value),
    };
    if !valid {
        let message = match person_type {
            PersonType::Fisica => "CPF inválido",
            PersonType::Juridica => "CNPJ inválido",
        };
        errors.push(FieldError::new(field, message));
    }
}

fn is_plausible_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_shape() {
        let q = SearchQuery {
            search: Some("ana".to_string()),
        };
        assert_eq!(q.cache_key("signatures"), "signatures?search=ana");
        let q = SearchQuery { search: None };
        assert_eq!(q.cache_key("clients"), "clients?search=");
    }

    #[test]
    fn test_blank_term_is_none() {
        let q = SearchQuery {
            search: Some("   ".to_string()),
        };
        assert_eq!(q.term(), None);
    }

    #[test]
    fn test_document_check_dispatches_on_person_type() {
        let mut errors = Vec::new();
        check_document(&mut errors, "document", PersonType::Fisica, "529.982.247-25");
        assert!(errors.is_empty());
        // A valid CNPJ is not a valid CPF.
        check_document(
            &mut errors,
            "document",
            PersonType::Fisica,
            "04.252.011/0001-10",
        );
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "CPF inválido");
    }

    #[test]
    fn test_email_plausibility() {
        let mut errors = Vec::new();
        check_email(&mut errors, "email", "ana@empresa.com.br");
        assert!(errors.is_empty());
        check_email(&mut errors, "email", "sem-arroba");
        check_email(&mut errors, "email", "x@semponto");
        assert_eq!(errors.len(), 2);
    }
}
