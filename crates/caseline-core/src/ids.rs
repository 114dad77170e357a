//! Stable identifiers for instrument parts.
//!
//! Ids are opaque strings on the wire. The persistence layer may hand us
//! integers-as-strings or UUIDs; newly authored parts get a v4 UUID.

use std::fmt;

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[serde(transparent)]
        #[ts(export)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Mint a fresh random id.
            pub fn generate() -> Self {
                Self(Uuid::new_v4().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self::new(id)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

string_id!(
    /// Identifies an instrument definition.
    InstrumentId
);

string_id!(
    /// Identifies a domain. Immutable once created: scoring rules refer to it.
    DomainId
);

string_id!(
    /// Identifies an item (question). Response sets are keyed by it.
    ItemId
);

string_id!(
    /// Identifies a row in an instrument's scoring table.
    RuleId
);
