//! talaan persistence layer.
//!
//! PostgreSQL-backed storage for the roster engine:
//!
//! - [`models::RosterMember`] - the authoritative roster (never deleted;
//!   entries transition active -> transferred_out)
//! - [`models::ImportBatch`] - one row per confirmed import run
//! - [`models::ImportSnapshot`] - token-keyed parsed record sets written
//!   by Preview and consumed by Confirm
//!
//! Model query methods are written against [`sqlx::PgExecutor`] so they
//! compose into a single transaction during Confirm.

pub mod error;
pub mod migrations;
pub mod models;
pub mod pool;

pub use error::DbError;
pub use migrations::run_migrations;
pub use pool::DbPool;
