//! Preview/Confirm orchestration.
//!
//! Preview runs the full read-only pipeline (detect -> parse -> diff ->
//! classify -> guard), persists the validated record set as a token-keyed
//! snapshot, and returns the reconciliation result for operator review.
//! Confirm consumes the snapshot, re-reconciles against the then-current
//! roster state, and hands the store one atomic write plan. Preview has
//! zero persisted side effects beyond the snapshot and is idempotent.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use sha2::{Digest, Sha256};

use talaan_core::{ActorId, SnapshotToken, SubUnitId};

use crate::classify::{age_in_years, classify};
use crate::differ;
use crate::error::ImportError;
use crate::format::{detect_format, FormatOutcome};
use crate::guard::screen_candidates;
use crate::models::{
    AddCandidate, ConfirmSummary, ImportConfig, IncomingRecord, PreviewOutcome,
    ReconciliationResult, RosterEntry, SkippedRow, SnapshotPayload,
};
use crate::parser::parse_records;
use crate::store::{MemberDraft, RosterStore, SnapshotStore, WritePlan};

/// The import engine: one instance per deployment, stateless between runs.
pub struct ReconcileEngine {
    roster: Arc<dyn RosterStore>,
    snapshots: Arc<dyn SnapshotStore>,
    config: ImportConfig,
}

/// Diff + classify + guard output for one pass.
struct Reconciled {
    to_add: Vec<AddCandidate>,
    to_transfer_out: Vec<RosterEntry>,
    already_active: Vec<IncomingRecord>,
    guard_skipped: Vec<SkippedRow>,
}

impl ReconcileEngine {
    #[must_use]
    pub fn new(
        roster: Arc<dyn RosterStore>,
        snapshots: Arc<dyn SnapshotStore>,
        config: ImportConfig,
    ) -> Self {
        Self {
            roster,
            snapshots,
            config,
        }
    }

    /// Run the read-only Preview phase.
    ///
    /// `mapping` is the optional explicit canonical-field -> source-header
    /// mapping; when auto-detection cannot resolve the required columns
    /// and no mapping was given, returns [`PreviewOutcome::NeedsMapping`]
    /// so the caller can collect one and re-invoke.
    pub async fn preview(
        &self,
        sub_unit: SubUnitId,
        file_name: &str,
        data: &[u8],
        mapping: Option<&HashMap<String, String>>,
    ) -> Result<PreviewOutcome, ImportError> {
        if data.len() > self.config.max_file_size {
            return Err(ImportError::FileTooLarge(format!(
                "file size {} bytes exceeds the maximum of {} bytes",
                data.len(),
                self.config.max_file_size
            )));
        }

        let map = match detect_format(data, mapping) {
            FormatOutcome::Ready(map) => map,
            FormatOutcome::NeedsMapping { headers } => {
                tracing::info!(
                    sub_unit_id = %sub_unit,
                    file_name,
                    "Required columns unresolved; explicit mapping needed"
                );
                return Ok(PreviewOutcome::NeedsMapping { headers });
            }
            FormatOutcome::Invalid { reason } => return Err(ImportError::InvalidFormat(reason)),
        };

        let parsed = parse_records(data, &map, &self.config)?;
        let payload = SnapshotPayload {
            records: parsed.records,
            skipped: parsed.skipped,
            stats: parsed.stats,
        };

        let reconciled = self
            .reconcile_against_roster(sub_unit, payload.records.clone())
            .await?;

        let file_hash = file_digest(data);
        let token = self
            .snapshots
            .save(
                sub_unit,
                file_name,
                &file_hash,
                &payload,
                self.config.snapshot_ttl_minutes,
            )
            .await?;

        let mut skipped = payload.skipped.clone();
        skipped.extend(reconciled.guard_skipped);

        tracing::info!(
            sub_unit_id = %sub_unit,
            file_name,
            to_add = reconciled.to_add.len(),
            to_transfer_out = reconciled.to_transfer_out.len(),
            already_active = reconciled.already_active.len(),
            skipped = skipped.len(),
            "Preview reconciled"
        );

        Ok(PreviewOutcome::Ready {
            token,
            result: ReconciliationResult {
                to_add: reconciled.to_add,
                to_transfer_out: reconciled.to_transfer_out,
                already_active: reconciled.already_active,
                skipped,
                stats: payload.stats,
            },
        })
    }

    /// Run the mutating Confirm phase against a previewed snapshot.
    ///
    /// Re-reconciles the stored record set against the current roster
    /// state, then applies every transfer-out and insertion in one atomic
    /// transaction. On failure nothing lands and the snapshot stays
    /// available for a retry.
    pub async fn confirm(
        &self,
        sub_unit: SubUnitId,
        token: SnapshotToken,
        actor: ActorId,
    ) -> Result<ConfirmSummary, ImportError> {
        let stored = self
            .snapshots
            .load(token)
            .await?
            .ok_or(ImportError::SnapshotNotFound)?;

        if stored.sub_unit != sub_unit {
            return Err(ImportError::SnapshotMismatch);
        }

        let total_parsed = stored.payload.records.len();
        let reconciled = self
            .reconcile_against_roster(sub_unit, stored.payload.records)
            .await?;

        let mut skipped = stored.payload.skipped;
        skipped.extend(reconciled.guard_skipped);

        let plan = WritePlan {
            sub_unit,
            actor,
            file_name: stored.file_name,
            file_hash: stored.file_hash,
            transfer_out_ids: reconciled.to_transfer_out.iter().map(|e| e.id).collect(),
            inserts: reconciled.to_add.iter().map(draft_from_candidate).collect(),
            total_parsed,
            already_active: reconciled.already_active.len(),
            skipped: skipped.len(),
        };
        let added = plan.inserts.len();
        let transferred_out = plan.transfer_out_ids.len();

        let batch_id = self.roster.apply(plan).await?;

        // The write is committed; a leftover snapshot only wastes space.
        if let Err(e) = self.snapshots.delete(token).await {
            tracing::warn!(token = %token, error = %e, "Failed to delete consumed snapshot");
        }

        tracing::info!(
            sub_unit_id = %sub_unit,
            batch_id = %batch_id,
            actor_id = %actor,
            added,
            transferred_out,
            already_active = reconciled.already_active.len(),
            skipped = skipped.len(),
            "Import confirmed"
        );

        Ok(ConfirmSummary {
            batch_id,
            total_parsed,
            added,
            transferred_out,
            already_active: reconciled.already_active.len(),
            skipped: skipped.len(),
            errors: skipped
                .iter()
                .map(|s| format!("line {}: {}", s.line, s.message))
                .collect(),
        })
    }

    /// Diff the records against the current active roster, classify the
    /// to-add partition, and screen it through the duplicate guard.
    async fn reconcile_against_roster(
        &self,
        sub_unit: SubUnitId,
        records: Vec<IncomingRecord>,
    ) -> Result<Reconciled, ImportError> {
        let current = self.roster.fetch_active_entries(sub_unit).await?;
        let diff = differ::reconcile(records, current);

        let today = Utc::now().date_naive();
        let candidates: Vec<AddCandidate> = diff
            .to_add
            .into_iter()
            .map(|record| {
                let classification = classify(&record, today, &self.config.thresholds);
                let age = record.birth_date.map(|b| age_in_years(b, today));
                AddCandidate {
                    record,
                    classification: classification.label,
                    classification_auto: classification.auto,
                    age,
                }
            })
            .collect();

        let (to_add, guard_skipped) =
            screen_candidates(self.roster.as_ref(), candidates).await?;

        Ok(Reconciled {
            to_add,
            to_transfer_out: diff.to_transfer_out,
            already_active: diff.already_active,
            guard_skipped,
        })
    }
}

/// SHA-256 hex digest of the uploaded bytes.
fn file_digest(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

fn draft_from_candidate(candidate: &AddCandidate) -> MemberDraft {
    let record = &candidate.record;
    MemberDraft {
        registry_normalized: record.registry_normalized.clone(),
        registry_formatted: record.registry_formatted.clone(),
        last_name: record.last_name.clone(),
        first_name: record.first_name.clone(),
        middle_name: record.middle_name.clone(),
        marital_surname: record.marital_surname.clone(),
        birth_date: record.birth_date,
        classification: candidate.classification,
        classification_auto: candidate.classification_auto,
        purok_grupo: record.purok_grupo.clone(),
    }
}
