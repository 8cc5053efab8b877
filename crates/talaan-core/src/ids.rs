//! Strongly Typed Identifiers
//!
//! This module provides type-safe identifier types for talaan.
//! Using the newtype pattern, these types prevent accidental misuse of
//! different ID types at compile time.
//!
//! # Example
//!
//! ```
//! use talaan_core::{SubUnitId, MemberId};
//!
//! let sub_unit = SubUnitId::new();
//! let member = MemberId::new();
//!
//! // Type safety: cannot pass MemberId where SubUnitId is expected
//! fn requires_sub_unit(id: SubUnitId) -> String {
//!     id.to_string()
//! }
//!
//! let result = requires_sub_unit(sub_unit);
//! // requires_sub_unit(member); // This would not compile!
//! ```

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

/// Error type for ID parsing failures
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    /// The type of ID that failed to parse
    pub id_type: &'static str,
    /// The underlying UUID parse error message
    pub message: String,
}

impl Display for ParseIdError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Failed to parse {}: {}", self.id_type, self.message)
    }
}

impl std::error::Error for ParseIdError {}

/// Macro to define a strongly-typed ID type
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random ID using UUID v4.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates an ID from an existing UUID.
            #[must_use]
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns a reference to the underlying UUID.
            #[must_use]
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                Uuid::parse_str(s)
                    .map(Self)
                    .map_err(|e| ParseIdError {
                        id_type: stringify!($name),
                        message: e.to_string(),
                    })
            }
        }
    };
}

define_id!(
    /// Strongly typed identifier for sub-units.
    ///
    /// A sub-unit is the organizational scope one import run targets
    /// (for example, one congregation). Every roster member and import
    /// batch belongs to exactly one sub-unit.
    SubUnitId
);

define_id!(
    /// Strongly typed identifier for roster members.
    MemberId
);

define_id!(
    /// Strongly typed identifier for confirmed import batches.
    ///
    /// Every member inserted by one confirmed run is stamped with the
    /// same batch id, enabling later bulk auditing.
    BatchId
);

define_id!(
    /// Strongly typed identifier for the operator performing a mutation.
    ActorId
);

define_id!(
    /// Opaque token handed out by Preview and consumed by Confirm.
    ///
    /// Identifies a server-side snapshot of the parsed record set so
    /// Confirm never re-parses operator-supplied input.
    SnapshotToken
);
