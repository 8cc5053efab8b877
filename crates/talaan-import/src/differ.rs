//! Set reconciliation between the parsed extract and the active roster.
//!
//! Pure function over normalized registry keys for one sub-unit. The
//! caller must supply the complete active entry set (no paging or
//! sampling); in-file key duplicates are already resolved by the parser.

use std::collections::HashSet;

use crate::models::{IncomingRecord, RosterEntry};

/// The three reconciliation partitions.
#[derive(Debug, Clone, PartialEq)]
pub struct DiffOutcome {
    /// Parsed records absent from the active roster.
    pub to_add: Vec<IncomingRecord>,
    /// Parsed records already on the active roster.
    pub already_active: Vec<IncomingRecord>,
    /// Active entries absent from the extract.
    pub to_transfer_out: Vec<RosterEntry>,
}

/// Partition the extract against the current active roster.
#[must_use]
pub fn reconcile(records: Vec<IncomingRecord>, current: Vec<RosterEntry>) -> DiffOutcome {
    let current_keys: HashSet<&str> = current
        .iter()
        .map(|e| e.registry_normalized.as_str())
        .collect();
    let extract_keys: HashSet<String> = records
        .iter()
        .map(|r| r.registry_normalized.clone())
        .collect();

    let (already_active, to_add): (Vec<_>, Vec<_>) = records
        .into_iter()
        .partition(|r| current_keys.contains(r.registry_normalized.as_str()));

    let to_transfer_out = current
        .into_iter()
        .filter(|e| !extract_keys.contains(&e.registry_normalized))
        .collect();

    DiffOutcome {
        to_add,
        already_active,
        to_transfer_out,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn record(key: &str) -> IncomingRecord {
        IncomingRecord {
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
            source_line: 2,
        }
    }

    fn entry(key: &str) -> RosterEntry {
        RosterEntry {
            id: Uuid::new_v4(),
            registry_normalized: key.to_string(),
        }
    }

    #[test]
    fn test_basic_partition() {
        // current = {A, B}, extract = {B, C}
        let outcome = reconcile(vec![record("B"), record("C")], vec![entry("A"), entry("B")]);

        assert_eq!(outcome.to_add.len(), 1);
        assert_eq!(outcome.to_add[0].registry_normalized, "C");
        assert_eq!(outcome.already_active.len(), 1);
        assert_eq!(outcome.already_active[0].registry_normalized, "B");
        assert_eq!(outcome.to_transfer_out.len(), 1);
        assert_eq!(outcome.to_transfer_out[0].registry_normalized, "A");
    }

    #[test]
    fn test_empty_roster_adds_everything() {
        let outcome = reconcile(vec![record("A"), record("B")], vec![]);
        assert_eq!(outcome.to_add.len(), 2);
        assert!(outcome.already_active.is_empty());
        assert!(outcome.to_transfer_out.is_empty());
    }

    #[test]
    fn test_empty_extract_transfers_everything_out() {
        let outcome = reconcile(vec![], vec![entry("A"), entry("B")]);
        assert!(outcome.to_add.is_empty());
        assert!(outcome.already_active.is_empty());
        assert_eq!(outcome.to_transfer_out.len(), 2);
    }

    #[test]
    fn test_identical_sets_are_all_already_active() {
        let outcome = reconcile(vec![record("A"), record("B")], vec![entry("A"), entry("B")]);
        assert!(outcome.to_add.is_empty());
        assert!(outcome.to_transfer_out.is_empty());
        assert_eq!(outcome.already_active.len(), 2);
    }

    #[test]
    fn test_partitions_exhaust_inputs() {
        let records: Vec<_> = ["A", "B", "C", "D"].iter().map(|k| record(k)).collect();
        let current: Vec<_> = ["C", "D", "E"].iter().map(|k| entry(k)).collect();

        let outcome = reconcile(records, current);

        let mut extract_side: Vec<String> = outcome
            .to_add
            .iter()
            .chain(outcome.already_active.iter())
            .map(|r| r.registry_normalized.clone())
            .collect();
        extract_side.sort();
        assert_eq!(extract_side, vec!["A", "B", "C", "D"]);

        let mut current_side: Vec<String> = outcome
            .to_transfer_out
            .iter()
            .map(|e| e.registry_normalized.clone())
            .chain(outcome.already_active.iter().map(|r| r.registry_normalized.clone()))
            .collect();
        current_side.sort();
        assert_eq!(current_side, vec!["C", "D", "E"]);
    }

    #[test]
    fn test_preserves_record_order() {
        let outcome = reconcile(
            vec![record("C"), record("A"), record("B")],
            vec![entry("A")],
        );
        let keys: Vec<&str> = outcome
            .to_add
            .iter()
            .map(|r| r.registry_normalized.as_str())
            .collect();
        assert_eq!(keys, vec!["C", "B"]);
    }
}
