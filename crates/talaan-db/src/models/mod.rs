//! Database entity models for talaan-db.
//!
//! These models represent the database tables and provide
//! type-safe interactions with PostgreSQL.

pub mod import_batch;
pub mod import_snapshot;
pub mod roster_member;

pub use import_batch::{CreateImportBatch, ImportBatch};
pub use import_snapshot::{CreateImportSnapshot, ImportSnapshot};
pub use roster_member::{NewRosterMember, RosterMember};
