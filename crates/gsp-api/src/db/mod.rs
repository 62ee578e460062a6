//! # Database Persistence Layer
//!
//! Postgres persistence via SQLx. One module per entity; every function
//! takes a `&PgPool` (or a transaction) and returns `sqlx::Error`,
//! which the handler layer maps to the unexpected-error envelope.
//!
//! ## Conventions
//!
//! - Soft delete everywhere: reads filter `deleted_at IS NULL`;
//!   deleting a missing or already-deleted row affects zero rows, which
//!   handlers surface as not-found.
//! - Duplicate-key checks (`*_in_use`) are scoped to live rows and
//!   exclude the record's own id on update.
//! - Writes that replace a child collection (client contacts, proposal
//!   items) run inside a single transaction.

pub mod categories;
pub mod clients;
pub mod companies;
pub mod items;
pub mod notes;
pub mod payment_modes;
pub mod proposals;
pub mod signatures;

use sqlx::postgres::{PgPool, PgPoolOptions};

/// Natural vs. legal person, shared by clients and companies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PersonType {
    /// Pessoa física (CPF).
    Fisica,
    /// Pessoa jurídica (CNPJ).
    Juridica,
}

impl PersonType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fisica => "fisica",
            Self::Juridica => "juridica",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "fisica" => Some(Self::Fisica),
            "juridica" => Some(Self::Juridica),
            _ => None,
        }
    }
}

/// Initialize the database connection pool and run migrations.
///
/// # Errors
///
/// Fails when `DATABASE_URL` is unset, unreachable, or a migration
/// cannot be applied.
pub async fn init_pool() -> Result<PgPool, anyhow::Error> {
    let url = std::env::var("DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?;

    let pool = PgPoolOptions::new()
        .max_connections(20)
        .min_connections(2)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect(&url)
        .await?;

    tracing::info!("Connected to PostgreSQL");

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_person_type_wire_strings() {
        assert_eq!(PersonType::Fisica.as_str(), "fisica");
        assert_eq!(PersonType::parse("juridica"), Some(PersonType::Juridica));
        assert_eq!(PersonType::parse("PJ"), None);
    }
}
