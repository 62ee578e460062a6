//! # gsp-core — Foundational Types for the GS Propostas Backend
//!
//! Defines the type-system primitives shared by every other crate in the
//! workspace. Every other crate depends on `gsp-core`; it depends on
//! nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for domain primitives.** `SignatureId`,
//!    `ClientId`, `ProposalId`, etc. — no bare strings or loose UUIDs
//!    crossing entity boundaries.
//!
//! 2. **No floats in monetary data.** `Money` is integer centavos and
//!    `Quantity` is integer hundredths. `DECIMAL` columns round-trip as
//!    integers; floating point never touches an amount.
//!
//! 3. **UTC-only timestamps.** The `Timestamp` type enforces UTC with Z
//!    suffix and seconds precision.
//!
//! 4. **One error taxonomy.** Every persistence operation resolves to the
//!    four `ErrorCode`s callers branch on; messages are for humans, codes
//!    are for code.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `gsp-*` crates (leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.
//! - All public types derive `Debug`, `Clone`, and implement
//!   `Serialize`/`Deserialize`.

pub mod br;
pub mod envelope;
pub mod identity;
pub mod money;
pub mod temporal;

pub use envelope::{ActionError, ActionResponse, ErrorCode, FieldError};
pub use identity::{
    CategoryId, ClientId, CompanyId, ItemId, NoteId, PaymentModeId, ProposalId, SignatureId,
};
pub use money::{Money, Quantity};
pub use temporal::Timestamp;
