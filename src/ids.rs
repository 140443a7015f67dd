//! `Uuid`-backed identifier newtypes, one per aggregate in §3.
//!
//! Kept distinct (rather than passing bare `Uuid`s around) so the type checker
//! catches an `InvoiceId` handed to a function expecting a `LeaseId`; no
//! separate string validation is needed since a `Uuid` already validates
//! itself structurally on parse.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! uuid_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(Uuid);

        impl $name {
            /// Generate a fresh random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wrap an existing `Uuid`.
            pub fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            /// The underlying `Uuid`.
            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

uuid_id!(OrgId);
uuid_id!(LeaseId);
uuid_id!(UnitId);
uuid_id!(RentTermId);
uuid_id!(RecurringChargeId);
uuid_id!(ChargeTypeId);
uuid_id!(InvoiceId);
uuid_id!(CreditNoteId);
uuid_id!(UtilityRatePlanId);
uuid_id!(UtilityStatementId);
uuid_id!(InvoiceRunId);
uuid_id!(UserId);
