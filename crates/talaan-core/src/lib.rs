//! talaan Core Library
//!
//! Shared types and traits for talaan.
//!
//! # Modules
//!
//! - [`ids`] - Strongly typed identifiers (SubUnitId, MemberId, BatchId, ...)
//! - [`traits`] - Sub-unit scoping traits (SubUnitScoped)
//! - [`error`] - Standardized error types (TalaanError)
//!
//! # Example
//!
//! ```
//! use talaan_core::{SubUnitId, MemberId, SubUnitScoped, TalaanError, Result};
//!
//! // Create strongly typed IDs
//! let sub_unit_id = SubUnitId::new();
//! let member_id = MemberId::new();
//!
//! // Use Result type alias
//! fn example() -> Result<()> {
//!     Err(TalaanError::ValidationError {
//!         field: "registry_number".to_string(),
//!         message: "empty".to_string(),
//!     })
//! }
//! ```

pub mod error;
pub mod ids;
pub mod traits;

// Re-export main types for convenient access
pub use error::{Result, TalaanError};
pub use ids::{ActorId, BatchId, MemberId, SnapshotToken, SubUnitId};
pub use traits::SubUnitScoped;
