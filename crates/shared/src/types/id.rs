//! Typed IDs for type-safe entity references.
//!
//! Using typed IDs prevents passing a `ChequeId` where a `TransactionId` is expected.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Macro to generate typed ID wrappers.
macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Creates a new random ID using UUID v7 (time-ordered).
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Creates an ID from an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner UUID.
            #[must_use]
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

typed_id!(UserId, "Unique identifier for a user.");
typed_id!(
    AccountId,
    "Unique identifier for a customer, supplier, shipper or bank account."
);
typed_id!(TransactionId, "Unique identifier for a ledger transaction.");
typed_id!(
    OperationId,
    "Groups every transaction written by one mutation so it can be deleted as a unit."
);
typed_id!(ChequeId, "Unique identifier for a cheque.");
typed_id!(SaleId, "Unique identifier for a sale.");
typed_id!(ExpenseId, "Unique identifier for an expense.");
typed_id!(ReturnId, "Unique identifier for a product return.");
typed_id!(DamageId, "Unique identifier for a damage write-off.");
typed_id!(LegacyRecordId, "Unique identifier for an imported legacy ledger row.");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique_and_time_ordered() {
        let first = ChequeId::new();
        let second = ChequeId::new();
        assert_ne!(first, second);
        assert!(first < second);
    }

    #[test]
    fn test_id_parse_and_display() {
        let id = AccountId::new();
        let parsed: AccountId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
        assert!("not-a-uuid".parse::<AccountId>().is_err());
    }

    #[test]
    fn test_id_serializes_transparently() {
        let uuid = Uuid::now_v7();
        let json = serde_json::to_string(&TransactionId::from_uuid(uuid)).unwrap();
        assert_eq!(json, format!("\"{uuid}\""));
    }
}
