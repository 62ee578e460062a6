//! # Domain Identity Newtypes
//!
//! Newtype wrappers for the identifiers of every cadastro entity.
//! These prevent accidental identifier confusion — you cannot pass a
//! `ClientId` where a `ProposalId` is expected, even though both are
//! UUIDs in the database.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! entity_id {
    ($(#[$doc:meta])* $name:ident, $prefix:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Generate a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Access the inner UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!($prefix, ":{}"), self.0)
            }
        }
    };
}

entity_id!(
    /// Unique identifier for a proposal signature record.
    SignatureId,
    "signature"
);
entity_id!(
    /// Unique identifier for a client (contratante).
    ClientId,
    "client"
);
entity_id!(
    /// Unique identifier for an issuing company (PF/PJ).
    CompanyId,
    "company"
);
entity_id!(
    /// Unique identifier for a catalog item (product or service).
    ItemId,
    "item"
);
entity_id!(
    /// Unique identifier for an item category.
    CategoryId,
    "category"
);
entity_id!(
    /// Unique identifier for a payment mode.
    PaymentModeId,
    "payment-mode"
);
entity_id!(
    /// Unique identifier for a standard proposal note block.
    NoteId,
    "note"
);
entity_id!(
    /// Unique identifier for a commercial proposal.
    ProposalId,
    "proposal"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        assert_ne!(SignatureId::new(), SignatureId::new());
    }

    #[test]
    fn test_display_carries_namespace() {
        let id = ClientId::new();
        assert!(id.to_string().starts_with("client:"));
    }

    #[test]
    fn test_serde_roundtrip() {
        let id = ProposalId::new();
        let json = serde_json::to_string(&id).unwrap();
        let parsed: ProposalId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, parsed);
    }
}
