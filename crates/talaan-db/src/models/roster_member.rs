//! Roster member model.
//!
//! One row per person on a sub-unit's roster. Rows are never deleted:
//! a member leaves a sub-unit by transitioning status from `active` to
//! `transferred_out`, stamped with the acting operator and timestamp.
//!
//! Person-identifying fields are stored sealed (see `talaan-crypto`);
//! `registry_hash` is the plaintext-derived lookup key that backs the
//! global duplicate guard. A partial unique index on
//! `registry_hash WHERE status = 'active'` guarantees at most one active
//! holder of a registry key across all sub-units.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgExecutor};
use talaan_core::{SubUnitId, SubUnitScoped};
use uuid::Uuid;

/// A persisted roster member.
#[derive(Debug, Clone, FromRow)]
pub struct RosterMember {
    /// Unique member identifier.
    pub id: Uuid,

    /// Sub-unit this member belongs to.
    pub sub_unit_id: Uuid,

    /// Sealed registry number (canonical display form).
    pub registry_cipher: Vec<u8>,

    /// SHA-256 of the lower-cased normalized registry key.
    pub registry_hash: String,

    /// Sealed last name.
    pub last_name_cipher: Vec<u8>,

    /// Sealed first name.
    pub first_name_cipher: Vec<u8>,

    /// Sealed middle name, when present.
    pub middle_name_cipher: Option<Vec<u8>>,

    /// Sealed marital surname, when present.
    pub marital_surname_cipher: Option<Vec<u8>>,

    /// Birth date, when the source extract provided one.
    pub birth_date: Option<NaiveDate>,

    /// Classification label: married, youth, or child.
    pub classification: String,

    /// Whether the classification was derived rather than operator-supplied.
    pub classification_auto: bool,

    /// Combined locality field from the source extract.
    pub purok_grupo: Option<String>,

    /// Lifecycle state: active or transferred_out.
    pub status: String,

    /// Import batch that inserted this member, when created by an import.
    pub batch_id: Option<Uuid>,

    /// Operator who created this member.
    pub created_by: Option<Uuid>,

    /// When the member was transferred out.
    pub transferred_out_at: Option<DateTime<Utc>>,

    /// Operator who performed the transfer-out.
    pub transferred_out_by: Option<Uuid>,

    /// Record creation timestamp.
    pub created_at: DateTime<Utc>,

    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Data required to insert a new active roster member.
#[derive(Debug, Clone)]
pub struct NewRosterMember {
    pub sub_unit_id: Uuid,
    pub registry_cipher: Vec<u8>,
    pub registry_hash: String,
    pub last_name_cipher: Vec<u8>,
    pub first_name_cipher: Vec<u8>,
    pub middle_name_cipher: Option<Vec<u8>>,
    pub marital_surname_cipher: Option<Vec<u8>>,
    pub birth_date: Option<NaiveDate>,
    pub classification: String,
    pub classification_auto: bool,
    pub purok_grupo: Option<String>,
    pub batch_id: Uuid,
    pub created_by: Uuid,
}

impl SubUnitScoped for RosterMember {
    fn sub_unit_id(&self) -> SubUnitId {
        SubUnitId::from_uuid(self.sub_unit_id)
    }
}

impl RosterMember {
    /// Insert a new active member.
    pub async fn insert<'e, E>(executor: E, data: NewRosterMember) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as(
            r"
            INSERT INTO roster_members
                (sub_unit_id, registry_cipher, registry_hash,
                 last_name_cipher, first_name_cipher, middle_name_cipher,
                 marital_surname_cipher, birth_date, classification,
                 classification_auto, purok_grupo, status, batch_id, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, 'active', $12, $13)
            RETURNING *
            ",
        )
        .bind(data.sub_unit_id)
        .bind(&data.registry_cipher)
        .bind(&data.registry_hash)
        .bind(&data.last_name_cipher)
        .bind(&data.first_name_cipher)
        .bind(&data.middle_name_cipher)
        .bind(&data.marital_surname_cipher)
        .bind(data.birth_date)
        .bind(&data.classification)
        .bind(data.classification_auto)
        .bind(&data.purok_grupo)
        .bind(data.batch_id)
        .bind(data.created_by)
        .fetch_one(executor)
        .await
    }

    /// Fetch the complete active roster for a sub-unit.
    ///
    /// The reconciliation differ requires the full set; this query must
    /// never page or sample.
    pub async fn fetch_active_by_sub_unit<'e, E>(
        executor: E,
        sub_unit_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as(
            r"
            SELECT * FROM roster_members
            WHERE sub_unit_id = $1 AND status = 'active'
            ORDER BY created_at
            ",
        )
        .bind(sub_unit_id)
        .fetch_all(executor)
        .await
    }

    /// Check whether any active member anywhere holds the given registry hash.
    pub async fn exists_active_hash<'e, E>(
        executor: E,
        registry_hash: &str,
    ) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar(
            r"
            SELECT EXISTS(
                SELECT 1 FROM roster_members
                WHERE registry_hash = $1 AND status = 'active'
            )
            ",
        )
        .bind(registry_hash)
        .fetch_one(executor)
        .await
    }

    /// Flip the given members to transferred-out, stamped with the actor.
    ///
    /// Only active members of the given sub-unit are affected. Returns the
    /// number of rows transitioned.
    pub async fn mark_transferred_out<'e, E>(
        executor: E,
        sub_unit_id: Uuid,
        ids: &[Uuid],
        actor: Uuid,
    ) -> Result<u64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query(
            r"
            UPDATE roster_members
            SET status = 'transferred_out',
                transferred_out_at = NOW(),
                transferred_out_by = $3,
                updated_at = NOW()
            WHERE sub_unit_id = $1 AND id = ANY($2) AND status = 'active'
            ",
        )
        .bind(sub_unit_id)
        .bind(ids)
        .bind(actor)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }

    /// Count active members in a sub-unit.
    pub async fn count_active_by_sub_unit<'e, E>(
        executor: E,
        sub_unit_id: Uuid,
    ) -> Result<i64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar(
            r"
            SELECT COUNT(*) FROM roster_members
            WHERE sub_unit_id = $1 AND status = 'active'
            ",
        )
        .bind(sub_unit_id)
        .fetch_one(executor)
        .await
    }

    /// Fetch all members inserted by one import batch.
    pub async fn fetch_by_batch<'e, E>(
        executor: E,
        batch_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as(
            r"
            SELECT * FROM roster_members
            WHERE batch_id = $1
            ORDER BY created_at
            ",
        )
        .bind(batch_id)
        .fetch_all(executor)
        .await
    }
}
