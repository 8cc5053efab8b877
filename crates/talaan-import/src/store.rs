//! Persistence and snapshot seams.
//!
//! The engine talks to storage through two object-safe traits so the
//! executor stays testable without a database. The Postgres
//! implementations compose `talaan-db` model calls; `PgRosterStore`
//! applies a whole write plan inside one transaction and routes
//! person-identifying fields through the field confidentiality service.

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use uuid::Uuid;

use talaan_core::{ActorId, BatchId, SnapshotToken, SubUnitId};
use talaan_crypto::FieldCipher;
use talaan_db::models::{
    CreateImportBatch, CreateImportSnapshot, ImportBatch, ImportSnapshot, NewRosterMember,
    RosterMember,
};
use talaan_db::DbPool;

use crate::error::StoreError;
use crate::guard::registry_hash;
use crate::models::{MemberClass, RosterEntry, SnapshotPayload};
use crate::parser::normalize_registry;

/// Plaintext insert payload for one new member. The store seals the
/// person-identifying fields before they touch a table.
#[derive(Debug, Clone)]
pub struct MemberDraft {
    pub registry_normalized: String,
    pub registry_formatted: String,
    pub last_name: String,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub marital_surname: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub classification: MemberClass,
    pub classification_auto: bool,
    pub purok_grupo: Option<String>,
}

/// Everything one Confirm writes, applied atomically: the batch record,
/// the transfer-outs, and the insertions.
#[derive(Debug, Clone)]
pub struct WritePlan {
    pub sub_unit: SubUnitId,
    pub actor: ActorId,
    pub file_name: String,
    pub file_hash: String,
    pub transfer_out_ids: Vec<Uuid>,
    pub inserts: Vec<MemberDraft>,
    pub total_parsed: usize,
    pub already_active: usize,
    pub skipped: usize,
}

/// A stored Preview snapshot, loaded for Confirm.
#[derive(Debug, Clone)]
pub struct StoredSnapshot {
    pub sub_unit: SubUnitId,
    pub file_name: String,
    pub file_hash: String,
    pub payload: SnapshotPayload,
}

/// Persistence seam consumed by the differ, the duplicate guard, and the
/// executor.
#[async_trait]
pub trait RosterStore: Send + Sync {
    /// The complete active entry set for a sub-unit, comparison keys
    /// already decrypted. Must never page or sample.
    async fn fetch_active_entries(
        &self,
        sub_unit: SubUnitId,
    ) -> Result<Vec<RosterEntry>, StoreError>;

    /// Whether any active member anywhere holds the given registry hash.
    async fn exists_by_hash(&self, registry_hash: &str) -> Result<bool, StoreError>;

    /// Apply a write plan atomically. Either every transfer-out and every
    /// insert lands, or none do. Returns the batch identifier stamped on
    /// the inserted members.
    async fn apply(&self, plan: WritePlan) -> Result<BatchId, StoreError>;
}

/// Snapshot seam: Preview saves, Confirm loads and deletes.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    async fn save(
        &self,
        sub_unit: SubUnitId,
        file_name: &str,
        file_hash: &str,
        payload: &SnapshotPayload,
        ttl_minutes: i64,
    ) -> Result<SnapshotToken, StoreError>;

    /// Load a snapshot, or `None` when the token is unknown or expired.
    async fn load(&self, token: SnapshotToken) -> Result<Option<StoredSnapshot>, StoreError>;

    async fn delete(&self, token: SnapshotToken) -> Result<(), StoreError>;
}

/// PostgreSQL-backed roster store.
#[derive(Debug, Clone)]
pub struct PgRosterStore {
    pool: DbPool,
    cipher: FieldCipher,
}

impl PgRosterStore {
    #[must_use]
    pub fn new(pool: DbPool, cipher: FieldCipher) -> Self {
        Self { pool, cipher }
    }

    fn seal_draft(
        &self,
        sub_unit: SubUnitId,
        batch_id: Uuid,
        actor: ActorId,
        draft: &MemberDraft,
    ) -> Result<NewRosterMember, StoreError> {
        let seal_opt = |value: Option<&str>| -> Result<Option<Vec<u8>>, StoreError> {
            value
                .map(|v| self.cipher.seal_str(sub_unit, v))
                .transpose()
                .map_err(StoreError::Crypto)
        };

        Ok(NewRosterMember {
            sub_unit_id: *sub_unit.as_uuid(),
            registry_cipher: self.cipher.seal_str(sub_unit, &draft.registry_formatted)?,
            registry_hash: registry_hash(&draft.registry_normalized),
            last_name_cipher: self.cipher.seal_str(sub_unit, &draft.last_name)?,
            first_name_cipher: self.cipher.seal_str(sub_unit, &draft.first_name)?,
            middle_name_cipher: seal_opt(draft.middle_name.as_deref())?,
            marital_surname_cipher: seal_opt(draft.marital_surname.as_deref())?,
            birth_date: draft.birth_date,
            classification: draft.classification.as_str().to_string(),
            classification_auto: draft.classification_auto,
            purok_grupo: draft.purok_grupo.clone(),
            batch_id,
            created_by: *actor.as_uuid(),
        })
    }
}

#[async_trait]
impl RosterStore for PgRosterStore {
    async fn fetch_active_entries(
        &self,
        sub_unit: SubUnitId,
    ) -> Result<Vec<RosterEntry>, StoreError> {
        let rows =
            RosterMember::fetch_active_by_sub_unit(self.pool.inner(), *sub_unit.as_uuid()).await?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            let registry = self.cipher.open_str(sub_unit, &row.registry_cipher)?;
            entries.push(RosterEntry {
                id: row.id,
                registry_normalized: normalize_registry(&registry),
            });
        }
        Ok(entries)
    }

    async fn exists_by_hash(&self, registry_hash: &str) -> Result<bool, StoreError> {
        Ok(RosterMember::exists_active_hash(self.pool.inner(), registry_hash).await?)
    }

    async fn apply(&self, plan: WritePlan) -> Result<BatchId, StoreError> {
        let mut tx = self.pool.inner().begin().await.map_err(StoreError::Database)?;

        let batch = ImportBatch::create(
            &mut *tx,
            CreateImportBatch {
                sub_unit_id: *plan.sub_unit.as_uuid(),
                file_name: plan.file_name.clone(),
                file_hash: plan.file_hash.clone(),
                total_parsed: plan.total_parsed as i32,
                added_count: plan.inserts.len() as i32,
                transferred_out_count: plan.transfer_out_ids.len() as i32,
                already_active_count: plan.already_active as i32,
                skipped_count: plan.skipped as i32,
                created_by: *plan.actor.as_uuid(),
            },
        )
        .await?;

        if !plan.transfer_out_ids.is_empty() {
            let affected = RosterMember::mark_transferred_out(
                &mut *tx,
                *plan.sub_unit.as_uuid(),
                &plan.transfer_out_ids,
                *plan.actor.as_uuid(),
            )
            .await?;

            // Fewer rows than planned means the roster changed between
            // snapshot and apply; dropping the transaction rolls back.
            if affected != plan.transfer_out_ids.len() as u64 {
                return Err(StoreError::Conflict(format!(
                    "planned {} transfer-outs but {} entries were still active",
                    plan.transfer_out_ids.len(),
                    affected
                )));
            }
        }

        for draft in &plan.inserts {
            let new_member = self.seal_draft(plan.sub_unit, batch.id, plan.actor, draft)?;
            RosterMember::insert(&mut *tx, new_member).await?;
        }

        tx.commit().await.map_err(StoreError::Database)?;

        tracing::info!(
            sub_unit_id = %plan.sub_unit,
            batch_id = %batch.id,
            added = plan.inserts.len(),
            transferred_out = plan.transfer_out_ids.len(),
            "Import batch applied"
        );

        Ok(BatchId::from_uuid(batch.id))
    }
}

/// PostgreSQL-backed snapshot store.
#[derive(Debug, Clone)]
pub struct PgSnapshotStore {
    pool: DbPool,
}

impl PgSnapshotStore {
    #[must_use]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Housekeeping: drop expired snapshots. Returns the number removed.
    pub async fn purge_expired(&self) -> Result<u64, StoreError> {
        Ok(ImportSnapshot::purge_expired(self.pool.inner()).await?)
    }
}

#[async_trait]
impl SnapshotStore for PgSnapshotStore {
    async fn save(
        &self,
        sub_unit: SubUnitId,
        file_name: &str,
        file_hash: &str,
        payload: &SnapshotPayload,
        ttl_minutes: i64,
    ) -> Result<SnapshotToken, StoreError> {
        let row = ImportSnapshot::create(
            self.pool.inner(),
            CreateImportSnapshot {
                sub_unit_id: *sub_unit.as_uuid(),
                file_name: file_name.to_string(),
                file_hash: file_hash.to_string(),
                payload: serde_json::to_value(payload)?,
                expires_at: Utc::now() + Duration::minutes(ttl_minutes),
            },
        )
        .await?;

        Ok(SnapshotToken::from_uuid(row.token))
    }

    async fn load(&self, token: SnapshotToken) -> Result<Option<StoredSnapshot>, StoreError> {
        let Some(row) = ImportSnapshot::find_valid(self.pool.inner(), *token.as_uuid()).await?
        else {
            return Ok(None);
        };

        let payload: SnapshotPayload = serde_json::from_value(row.payload)?;
        Ok(Some(StoredSnapshot {
            sub_unit: SubUnitId::from_uuid(row.sub_unit_id),
            file_name: row.file_name,
            file_hash: row.file_hash,
            payload,
        }))
    }

    async fn delete(&self, token: SnapshotToken) -> Result<(), StoreError> {
        Ok(ImportSnapshot::delete(self.pool.inner(), *token.as_uuid()).await?)
    }
}

#[cfg(test)]
mod tests {
    // The Postgres implementations require a live database and are
    // exercised by the integration tests.
}
