//! Import batch model.
//!
//! One row per confirmed import run. The batch id is stamped on every
//! member inserted by that run, enabling later bulk auditing.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgExecutor};
use talaan_core::{SubUnitId, SubUnitScoped};
use uuid::Uuid;

/// A confirmed import run.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ImportBatch {
    /// Unique batch identifier.
    pub id: Uuid,

    /// Sub-unit this import targeted.
    pub sub_unit_id: Uuid,

    /// Original uploaded filename.
    pub file_name: String,

    /// SHA-256 hex hash of the uploaded file.
    pub file_hash: String,

    /// Valid records parsed from the source file.
    pub total_parsed: i32,

    /// Members inserted by this run.
    pub added_count: i32,

    /// Members transferred out by this run.
    pub transferred_out_count: i32,

    /// Records that were already on the active roster.
    pub already_active_count: i32,

    /// Rows skipped during parsing or by the duplicate guard.
    pub skipped_count: i32,

    /// Operator who confirmed the run.
    pub created_by: Uuid,

    /// When the run was confirmed.
    pub created_at: DateTime<Utc>,
}

/// Data required to record a confirmed import run.
#[derive(Debug)]
pub struct CreateImportBatch {
    pub sub_unit_id: Uuid,
    pub file_name: String,
    pub file_hash: String,
    pub total_parsed: i32,
    pub added_count: i32,
    pub transferred_out_count: i32,
    pub already_active_count: i32,
    pub skipped_count: i32,
    pub created_by: Uuid,
}

impl SubUnitScoped for ImportBatch {
    fn sub_unit_id(&self) -> SubUnitId {
        SubUnitId::from_uuid(self.sub_unit_id)
    }
}

impl ImportBatch {
    /// Record a confirmed import run.
    pub async fn create<'e, E>(executor: E, data: CreateImportBatch) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as(
            r"
            INSERT INTO import_batches
                (sub_unit_id, file_name, file_hash, total_parsed, added_count,
                 transferred_out_count, already_active_count, skipped_count, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            ",
        )
        .bind(data.sub_unit_id)
        .bind(&data.file_name)
        .bind(&data.file_hash)
        .bind(data.total_parsed)
        .bind(data.added_count)
        .bind(data.transferred_out_count)
        .bind(data.already_active_count)
        .bind(data.skipped_count)
        .bind(data.created_by)
        .fetch_one(executor)
        .await
    }

    /// Find a batch by ID within a specific sub-unit.
    pub async fn find_by_id<'e, E>(
        executor: E,
        sub_unit_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as(
            r"
            SELECT * FROM import_batches
            WHERE id = $1 AND sub_unit_id = $2
            ",
        )
        .bind(id)
        .bind(sub_unit_id)
        .fetch_optional(executor)
        .await
    }

    /// List batches for a sub-unit, newest first.
    pub async fn list_by_sub_unit<'e, E>(
        executor: E,
        sub_unit_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as(
            r"
            SELECT * FROM import_batches
            WHERE sub_unit_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            ",
        )
        .bind(sub_unit_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(executor)
        .await
    }
}
