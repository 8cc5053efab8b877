//! Error Types
//!
//! This module provides standardized error types for talaan.
//!
//! # Example
//!
//! ```
//! use talaan_core::{TalaanError, Result};
//!
//! fn find_member(id: &str) -> Result<String> {
//!     if id.is_empty() {
//!         return Err(TalaanError::NotFound {
//!             resource: "Member".to_string(),
//!             id: None,
//!         });
//!     }
//!     Ok(format!("Member {}", id))
//! }
//! ```

use crate::ids::SubUnitId;
use serde::Serialize;
use thiserror::Error;

/// Standardized error type for talaan.
///
/// Each variant maps to a common failure scenario shared across the
/// workspace crates.
///
/// # Variants
///
/// - `NotFound` - Resource not found
/// - `SubUnitMismatch` - Sub-unit isolation violation
/// - `ValidationError` - Input validation failure
#[derive(Debug, Clone, Error, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TalaanError {
    /// Requested resource was not found.
    ///
    /// Use when a lookup returns no results.
    #[error("{resource} not found{}", id.as_ref().map(|i| format!(": {i}")).unwrap_or_default())]
    NotFound {
        /// The type of resource that was not found (e.g., "Member", "Batch")
        resource: String,
        /// Optional identifier of the resource
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<String>,
    },

    /// Sub-unit isolation violation.
    ///
    /// Use when an operation attempts to touch data owned by a different
    /// sub-unit. This is a critical integrity error.
    #[error("Sub-unit mismatch: expected {expected}, got {actual}")]
    SubUnitMismatch {
        /// The expected sub-unit ID
        expected: SubUnitId,
        /// The actual sub-unit ID that was provided
        actual: SubUnitId,
    },

    /// Input validation failure.
    #[error("Validation error on field '{field}': {message}")]
    ValidationError {
        /// The field that failed validation
        field: String,
        /// Description of the validation failure
        message: String,
    },
}

/// Type alias for Results using `TalaanError`.
pub type Result<T> = std::result::Result<T, TalaanError>;
