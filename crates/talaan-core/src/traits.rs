//! Sub-Unit Scoping Traits
//!
//! This module provides traits for sub-unit-scoped entities in talaan.
//!
//! # Example
//!
//! ```
//! use talaan_core::{SubUnitId, SubUnitScoped};
//!
//! struct RosterRow {
//!     sub_unit_id: SubUnitId,
//!     registry_hash: String,
//! }
//!
//! impl SubUnitScoped for RosterRow {
//!     fn sub_unit_id(&self) -> SubUnitId {
//!         self.sub_unit_id
//!     }
//! }
//!
//! // Generic function that works with any SubUnitScoped entity
//! fn verify_scope<T: SubUnitScoped>(entity: &T, expected: SubUnitId) -> bool {
//!     entity.sub_unit_id() == expected
//! }
//!
//! let sub_unit = SubUnitId::new();
//! let row = RosterRow {
//!     sub_unit_id: sub_unit,
//!     registry_hash: "ab12".to_string(),
//! };
//!
//! assert!(verify_scope(&row, sub_unit));
//! ```

use crate::ids::SubUnitId;

/// Trait for entities that belong to a specific sub-unit.
///
/// Implementing this trait marks an entity as sub-unit-scoped, enabling
/// compile-time verification that roster isolation is properly implemented.
///
/// # Object Safety
///
/// This trait is object-safe: `Box<dyn SubUnitScoped>` and
/// `&dyn SubUnitScoped` both work.
pub trait SubUnitScoped {
    /// Returns the sub-unit ID associated with this entity.
    ///
    /// Returns an owned `SubUnitId` (which is `Copy`) for convenience.
    fn sub_unit_id(&self) -> SubUnitId;
}
