//! Engine data model: incoming records, reconciliation partitions,
//! run configuration, and the preview/confirm result types.
//!
//! Everything an operator reviews is serde-serializable; the parsed
//! record set additionally round-trips through the snapshot store.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use talaan_core::{BatchId, SnapshotToken};

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// The three mutually exclusive member classifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberClass {
    /// Married members, and the default-adult fallback.
    Married,
    /// Unmarried members within the youth age band.
    Youth,
    /// Members below the youth age band.
    Child,
}

impl MemberClass {
    /// Canonical lowercase label, as persisted.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            MemberClass::Married => "married",
            MemberClass::Youth => "youth",
            MemberClass::Child => "child",
        }
    }

    /// Parse an operator-supplied label, case-insensitively.
    ///
    /// Unknown labels yield `None`; the caller falls back to derivation.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "married" => Some(MemberClass::Married),
            "youth" => Some(MemberClass::Youth),
            "child" => Some(MemberClass::Child),
            _ => None,
        }
    }
}

impl std::fmt::Display for MemberClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Age thresholds for derived classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationThresholds {
    /// Ages strictly below this classify as child.
    pub child_below: u32,
    /// Ages up to and including this classify as youth.
    pub youth_through: u32,
}

impl Default for ClassificationThresholds {
    fn default() -> Self {
        Self {
            child_below: 13,
            youth_through: 35,
        }
    }
}

// ---------------------------------------------------------------------------
// Incoming records and parse bookkeeping
// ---------------------------------------------------------------------------

/// One valid row of the source extract, normalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomingRecord {
    /// Registry number exactly as it appeared in the source.
    pub registry_raw: String,

    /// Whitespace-stripped, uppercased comparison key.
    pub registry_normalized: String,

    /// Canonical display form (spaced grouping when the key matches the
    /// structural pattern, otherwise the normalized form).
    pub registry_formatted: String,

    pub last_name: String,
    pub first_name: String,
    pub middle_name: Option<String>,

    /// Absent when the source carried a sentinel value ("-", "n/a", ...).
    pub marital_surname: Option<String>,

    pub birth_date: Option<NaiveDate>,

    /// Operator-supplied classification, when the extract carried one.
    pub explicit_classification: Option<MemberClass>,

    /// Combined locality field, when the extract carried one.
    pub purok_grupo: Option<String>,

    /// 1-based line number in the source file (header = line 1).
    pub source_line: usize,
}

/// Machine-readable reason a row or candidate was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Row had fewer than two fields or could not be read at all.
    Empty,
    /// No resolvable registry number.
    NoRegistry,
    /// Missing last or first name.
    NoName,
    /// Column 0 carried a merged-row pattern that could not be split.
    MergedUnsplittable,
    /// Registry key already seen earlier in this file; first occurrence kept.
    DuplicateInFile,
    /// Registry key already active in another sub-unit.
    DuplicateElsewhere,
}

/// One skipped row or candidate, line-addressable for operator diagnosis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedRow {
    /// 1-based source line number.
    pub line: usize,
    /// Registry number in display form, when one was resolved.
    pub registry: Option<String>,
    pub reason: SkipReason,
    /// Human-readable explanation.
    pub message: String,
}

/// Aggregate parse counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseStats {
    /// Data rows read (header excluded).
    pub rows_read: usize,
    /// Rows skipped as empty or unreadable.
    pub skipped_empty: usize,
    /// Rows skipped for a missing or unrecoverable registry number.
    pub skipped_no_registry: usize,
    /// Rows skipped for a missing name.
    pub skipped_no_name: usize,
    /// Whether the merged-row format was seen (reported once per run).
    pub merged_format_detected: bool,
}

// ---------------------------------------------------------------------------
// Reconciliation result
// ---------------------------------------------------------------------------

/// An active roster entry as seen by the differ: the opaque id plus the
/// already-decrypted comparison key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub id: Uuid,
    pub registry_normalized: String,
}

/// A to-add record with its derived classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddCandidate {
    pub record: IncomingRecord,
    pub classification: MemberClass,
    /// False when the label came from the extract, true when derived.
    pub classification_auto: bool,
    /// Whole elapsed years at run time, when a birth date was present.
    pub age: Option<i32>,
}

/// The full outcome of one reconciliation pass.
///
/// The four partitions, restricted to registry keys, are pairwise
/// disjoint and jointly exhaust the valid parsed keys plus the current
/// active keys for the sub-unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationResult {
    pub to_add: Vec<AddCandidate>,
    pub to_transfer_out: Vec<RosterEntry>,
    pub already_active: Vec<IncomingRecord>,
    pub skipped: Vec<SkippedRow>,
    pub stats: ParseStats,
}

/// Outcome of a Preview call.
#[derive(Debug)]
pub enum PreviewOutcome {
    /// Auto-detection could not resolve the required columns and no
    /// explicit mapping was given. Carries the raw header list so the
    /// caller can collect a mapping and re-invoke.
    NeedsMapping { headers: Vec<String> },

    /// The extract was reconciled. The token references the stored
    /// snapshot that Confirm operates on.
    Ready {
        token: SnapshotToken,
        result: ReconciliationResult,
    },
}

/// Summary returned by a successful Confirm.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfirmSummary {
    /// Batch identifier stamped on every inserted member.
    pub batch_id: BatchId,
    pub total_parsed: usize,
    pub added: usize,
    pub transferred_out: usize,
    pub already_active: usize,
    pub skipped: usize,
    /// Line-addressable skip messages from this run.
    pub errors: Vec<String>,
}

// ---------------------------------------------------------------------------
// Snapshot payload
// ---------------------------------------------------------------------------

/// What Preview persists and Confirm re-reconciles: the validated record
/// set plus the parse-time skip list and counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotPayload {
    pub records: Vec<IncomingRecord>,
    pub skipped: Vec<SkippedRow>,
    pub stats: ParseStats,
}

// ---------------------------------------------------------------------------
// Run configuration
// ---------------------------------------------------------------------------

/// Maximum file size (10MB default).
pub const DEFAULT_MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

/// Maximum data rows per run (10,000 default).
pub const DEFAULT_MAX_ROWS: usize = 10_000;

/// Default snapshot lifetime in minutes.
pub const DEFAULT_SNAPSHOT_TTL_MINUTES: i64 = 30;

/// Configuration for one import run, threaded explicitly into each
/// component call.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportConfig {
    /// Maximum upload size in bytes.
    pub max_file_size: usize,
    /// Maximum data rows to process.
    pub max_rows: usize,
    /// Age thresholds for derived classification.
    pub thresholds: ClassificationThresholds,
    /// How long a Preview snapshot stays valid.
    pub snapshot_ttl_minutes: i64,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ImportConfig {
    /// Create a config with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            max_rows: DEFAULT_MAX_ROWS,
            thresholds: ClassificationThresholds::default(),
            snapshot_ttl_minutes: DEFAULT_SNAPSHOT_TTL_MINUTES,
        }
    }

    /// Set the maximum rows.
    #[must_use]
    pub fn with_max_rows(mut self, max_rows: usize) -> Self {
        self.max_rows = max_rows;
        self
    }

    /// Set the maximum file size.
    #[must_use]
    pub fn with_max_file_size(mut self, max_file_size: usize) -> Self {
        self.max_file_size = max_file_size;
        self
    }

    /// Set the classification thresholds.
    #[must_use]
    pub fn with_thresholds(mut self, thresholds: ClassificationThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Set the snapshot lifetime.
    #[must_use]
    pub fn with_snapshot_ttl_minutes(mut self, minutes: i64) -> Self {
        self.snapshot_ttl_minutes = minutes;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_class_labels() {
        assert_eq!(MemberClass::Married.as_str(), "married");
        assert_eq!(MemberClass::from_label("YOUTH"), Some(MemberClass::Youth));
        assert_eq!(MemberClass::from_label(" child "), Some(MemberClass::Child));
        assert_eq!(MemberClass::from_label("adult"), None);
        assert_eq!(MemberClass::from_label(""), None);
    }

    #[test]
    fn test_member_class_serde_lowercase() {
        let json = serde_json::to_string(&MemberClass::Child).unwrap();
        assert_eq!(json, "\"child\"");
        let back: MemberClass = serde_json::from_str("\"married\"").unwrap();
        assert_eq!(back, MemberClass::Married);
    }

    #[test]
    fn test_default_thresholds() {
        let t = ClassificationThresholds::default();
        assert_eq!(t.child_below, 13);
        assert_eq!(t.youth_through, 35);
    }

    #[test]
    fn test_config_builders() {
        let config = ImportConfig::new()
            .with_max_rows(50)
            .with_snapshot_ttl_minutes(5);
        assert_eq!(config.max_rows, 50);
        assert_eq!(config.snapshot_ttl_minutes, 5);
        assert_eq!(config.max_file_size, DEFAULT_MAX_FILE_SIZE);
    }

    #[test]
    fn test_snapshot_payload_roundtrip() {
        let payload = SnapshotPayload {
            records: vec![IncomingRecord {
                registry_raw: "ppe 058 1 000 058".to_string(),
                registry_normalized: "PPE0581000058".to_string(),
                registry_formatted: "PPE 058 1 000 058".to_string(),
                last_name: "DELA CRUZ".to_string(),
                first_name: "MARIA".to_string(),
                middle_name: Some("SANTOS".to_string()),
                marital_surname: None,
                birth_date: chrono::NaiveDate::from_ymd_opt(1990, 6, 15),
                explicit_classification: None,
                purok_grupo: Some("1-A".to_string()),
                source_line: 2,
            }],
            skipped: vec![SkippedRow {
                line: 3,
                registry: None,
                reason: SkipReason::NoName,
                message: "missing last name".to_string(),
            }],
            stats: ParseStats {
                rows_read: 2,
                skipped_no_name: 1,
                ..ParseStats::default()
            },
        };

        let json = serde_json::to_value(&payload).unwrap();
        let back: SnapshotPayload = serde_json::from_value(json).unwrap();
        assert_eq!(back, payload);
    }
}
