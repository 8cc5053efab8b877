//! Global duplicate guard.
//!
//! A to-add candidate may be absent from this sub-unit's roster and still
//! hold a registry key that is active somewhere else in the system. The
//! guard screens every candidate against the global active-hash index and
//! demotes hits into the skip list; they are never inserted.

use sha2::{Digest, Sha256};

use crate::error::StoreError;
use crate::models::{AddCandidate, SkipReason, SkippedRow};
use crate::store::RosterStore;

/// Deterministic one-way hash of a registry key: SHA-256 over the
/// lower-cased normalized form, hex-encoded.
#[must_use]
pub fn registry_hash(registry_normalized: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(registry_normalized.to_lowercase().as_bytes());
    hex::encode(hasher.finalize())
}

/// Screen to-add candidates against the global active-hash index.
///
/// Returns the surviving candidates and the skip entries for the demoted
/// ones.
pub async fn screen_candidates(
    store: &dyn RosterStore,
    candidates: Vec<AddCandidate>,
) -> Result<(Vec<AddCandidate>, Vec<SkippedRow>), StoreError> {
    let mut surviving = Vec::with_capacity(candidates.len());
    let mut skipped = Vec::new();

    for candidate in candidates {
        let hash = registry_hash(&candidate.record.registry_normalized);
        if store.exists_by_hash(&hash).await? {
            tracing::info!(
                registry = %candidate.record.registry_formatted,
                line = candidate.record.source_line,
                "Duplicate registry number exists elsewhere; candidate skipped"
            );
            skipped.push(SkippedRow {
                line: candidate.record.source_line,
                registry: Some(candidate.record.registry_formatted.clone()),
                reason: SkipReason::DuplicateElsewhere,
                message: format!(
                    "registry number {} already exists in another sub-unit",
                    candidate.record.registry_formatted
                ),
            });
        } else {
            surviving.push(candidate);
        }
    }

    Ok((surviving, skipped))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{IncomingRecord, MemberClass, RosterEntry};
    use crate::store::WritePlan;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use talaan_core::{BatchId, SubUnitId};

    struct FixedHashStore {
        hashes: HashSet<String>,
    }

    #[async_trait]
    impl RosterStore for FixedHashStore {
        async fn fetch_active_entries(
            &self,
            _sub_unit: SubUnitId,
        ) -> Result<Vec<RosterEntry>, StoreError> {
            Ok(Vec::new())
        }

        async fn exists_by_hash(&self, registry_hash: &str) -> Result<bool, StoreError> {
            Ok(self.hashes.contains(registry_hash))
        }

        async fn apply(&self, _plan: WritePlan) -> Result<BatchId, StoreError> {
            Err(StoreError::Conflict("read-only test store".to_string()))
        }
    }

    fn candidate(key: &str, line: usize) -> AddCandidate {
        AddCandidate {
            record: IncomingRecord {
                registry_raw: key.to_string(),
                registry_normalized: key.to_string(),
                registry_formatted: key.to_string(),
                last_name: "DELA CRUZ".to_string(),
                first_name: "MARIA".to_string(),
                middle_name: None,
                marital_surname: None,
                birth_date: None,
                explicit_classification: None,
                purok_grupo: None,
                source_line: line,
            },
            classification: MemberClass::Married,
            classification_auto: true,
            age: None,
        }
    }

    #[test]
    fn test_hash_is_deterministic_and_case_folded() {
        assert_eq!(registry_hash("PPE0581000058"), registry_hash("PPE0581000058"));
        assert_eq!(registry_hash("PPE0581000058"), registry_hash("ppe0581000058"));
        assert_ne!(registry_hash("PPE0581000058"), registry_hash("PPE0581000059"));
        assert_eq!(registry_hash("x").len(), 64);
    }

    #[tokio::test]
    async fn test_known_hash_is_demoted_to_skipped() {
        let store = FixedHashStore {
            hashes: HashSet::from([registry_hash("PPE0581000058")]),
        };

        let (surviving, skipped) = screen_candidates(
            &store,
            vec![candidate("PPE0581000058", 2), candidate("PPE0581000059", 3)],
        )
        .await
        .unwrap();

        assert_eq!(surviving.len(), 1);
        assert_eq!(surviving[0].record.registry_normalized, "PPE0581000059");
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].reason, SkipReason::DuplicateElsewhere);
        assert_eq!(skipped[0].line, 2);
        assert!(skipped[0].message.contains("another sub-unit"));
    }

    #[tokio::test]
    async fn test_clean_candidates_all_survive() {
        let store = FixedHashStore {
            hashes: HashSet::new(),
        };
        let (surviving, skipped) =
            screen_candidates(&store, vec![candidate("A", 2), candidate("B", 3)])
                .await
                .unwrap();
        assert_eq!(surviving.len(), 2);
        assert!(skipped.is_empty());
    }
}
