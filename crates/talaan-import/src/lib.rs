//! Registry reconciliation and import engine.
//!
//! Ingests a delimited roster extract scoped to one sub-unit and
//! synchronizes it against the persisted authoritative roster under a
//! two-phase protocol:
//!
//! - **Preview** parses, reconciles, classifies, and duplicate-screens the
//!   extract read-only, stores the validated record set server-side keyed
//!   by an opaque token, and returns the full [`models::ReconciliationResult`]
//!   for operator review.
//! - **Confirm** consumes that snapshot, re-reconciles against the current
//!   roster state, and applies all transfer-outs and insertions in one
//!   atomic transaction.
//!
//! Pipeline: [`format`] (delimiter + column mapping) -> [`parser`]
//! (normalization, merged-row recovery) -> [`differ`] (set reconciliation)
//! -> [`classify`] (rule-based labels) -> [`guard`] (global duplicate
//! screen) -> [`executor`] (preview/confirm orchestration).

pub mod classify;
pub mod differ;
pub mod error;
pub mod executor;
pub mod format;
pub mod guard;
pub mod models;
pub mod parser;
pub mod store;

// Re-export public API
pub use error::{ImportError, StoreError};
pub use executor::ReconcileEngine;
pub use models::{ConfirmSummary, ImportConfig, PreviewOutcome, ReconciliationResult};
pub use store::{PgRosterStore, PgSnapshotStore, RosterStore, SnapshotStore};
