//! Import snapshot model.
//!
//! Preview persists its parsed, validated record set here, keyed by an
//! opaque token with a short TTL. Confirm loads the snapshot instead of
//! re-parsing operator-supplied input, so the record set reviewed by the
//! operator is exactly the one applied.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgExecutor};
use uuid::Uuid;

/// A stored Preview snapshot.
#[derive(Debug, Clone, FromRow)]
pub struct ImportSnapshot {
    /// Opaque token handed to the operator.
    pub token: Uuid,

    /// Sub-unit the preview targeted.
    pub sub_unit_id: Uuid,

    /// Original uploaded filename.
    pub file_name: String,

    /// SHA-256 hex hash of the uploaded file.
    pub file_hash: String,

    /// Serialized parsed record set and parse stats.
    pub payload: serde_json::Value,

    /// When the snapshot was written.
    pub created_at: DateTime<Utc>,

    /// When the snapshot stops being accepted by Confirm.
    pub expires_at: DateTime<Utc>,
}

/// Data required to store a Preview snapshot.
#[derive(Debug)]
pub struct CreateImportSnapshot {
    pub sub_unit_id: Uuid,
    pub file_name: String,
    pub file_hash: String,
    pub payload: serde_json::Value,
    pub expires_at: DateTime<Utc>,
}

impl ImportSnapshot {
    /// Store a snapshot and return it with its generated token.
    pub async fn create<'e, E>(
        executor: E,
        data: CreateImportSnapshot,
    ) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as(
            r"
            INSERT INTO import_snapshots
                (sub_unit_id, file_name, file_hash, payload, expires_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            ",
        )
        .bind(data.sub_unit_id)
        .bind(&data.file_name)
        .bind(&data.file_hash)
        .bind(&data.payload)
        .bind(data.expires_at)
        .fetch_one(executor)
        .await
    }

    /// Load a snapshot by token if it has not expired.
    pub async fn find_valid<'e, E>(executor: E, token: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as(
            r"
            SELECT * FROM import_snapshots
            WHERE token = $1 AND expires_at > NOW()
            ",
        )
        .bind(token)
        .fetch_optional(executor)
        .await
    }

    /// Delete a snapshot (consumed by Confirm or abandoned).
    pub async fn delete<'e, E>(executor: E, token: Uuid) -> Result<(), sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query("DELETE FROM import_snapshots WHERE token = $1")
            .bind(token)
            .execute(executor)
            .await?;
        Ok(())
    }

    /// Remove expired snapshots. Returns the number deleted.
    pub async fn purge_expired<'e, E>(executor: E) -> Result<u64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM import_snapshots WHERE expires_at <= NOW()")
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }
}
