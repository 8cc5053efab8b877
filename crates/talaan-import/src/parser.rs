//! Record parsing and normalization.
//!
//! Turns raw extract rows into canonical [`IncomingRecord`]s: registry
//! normalization and canonical display formatting, merged-row recovery
//! for lossy exports, comma name splitting with sentinel cleanup, and
//! per-row skip recording with 1-based line numbers (header = line 1).

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::ImportError;
use crate::format::{ColumnMap, FieldKey};
use crate::models::{
    ImportConfig, IncomingRecord, MemberClass, ParseStats, SkipReason, SkippedRow,
};

/// Registry keys with this structure get the spaced canonical display form.
static REGISTRY_GROUPS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Z]{3})(\d{3})(\d)(\d{3})(\d{3})$").expect("registry grouping regex is valid")
});

/// Registry token embedded in a merged row: 3 letters + 10 digits, or 13
/// digits, delimited by whitespace or the cell boundary.
static MERGED_REGISTRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|\s)([A-Za-z]{3}\d{10}|\d{13})(?:\s|$)")
        .expect("merged registry regex is valid")
});

/// Marital-surname values treated as absent, case-insensitively.
const MARITAL_SENTINELS: &[&str] = &["", "-", "n/a", "na", "none", "null"];

/// Accepted birth date formats.
const BIRTH_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];

/// Everything the parser produces for one run.
#[derive(Debug)]
pub struct ParseOutput {
    pub records: Vec<IncomingRecord>,
    pub skipped: Vec<SkippedRow>,
    pub stats: ParseStats,
}

/// Strip all whitespace and uppercase: the comparison key used for all
/// diffing and duplicate checks.
#[must_use]
pub fn normalize_registry(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect()
}

/// Canonical display form: re-insert single spaces between the structural
/// groups when the normalized key matches the known pattern, otherwise
/// the normalized form unchanged.
#[must_use]
pub fn format_registry(normalized: &str) -> String {
    match REGISTRY_GROUPS.captures(normalized) {
        Some(caps) => format!(
            "{} {} {} {} {}",
            &caps[1], &caps[2], &caps[3], &caps[4], &caps[5]
        ),
        None => normalized.to_string(),
    }
}

/// Split a merged cell as `<ordinal> <registry> <name...>`.
///
/// Returns the registry token and the trailing name text, or `None` when
/// no name text follows the token.
fn split_merged_cell(cell: &str) -> Option<(String, String)> {
    let caps = MERGED_REGISTRY.captures(cell)?;
    let token = caps.get(1)?;
    let name_part = cell[token.end()..].trim();
    if name_part.is_empty() {
        return None;
    }
    Some((token.as_str().to_string(), name_part.to_string()))
}

/// Positional name parts from a comma-separated full name.
fn split_full_name(
    full: &str,
) -> (
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
) {
    let parts: Vec<String> = full
        .splitn(4, ',')
        .map(str::trim)
        .filter(|p| !p.is_empty() && *p != "-")
        .map(std::string::ToString::to_string)
        .collect();

    let mut iter = parts.into_iter();
    (iter.next(), iter.next(), iter.next(), iter.next())
}

/// Drop sentinel marital-surname values.
fn clean_marital(value: Option<&str>) -> Option<String> {
    let v = value?.trim();
    if MARITAL_SENTINELS.contains(&v.to_lowercase().as_str()) {
        None
    } else {
        Some(v.to_string())
    }
}

/// Parse a birth date in any accepted format.
fn parse_birth_date(value: &str) -> Option<chrono::NaiveDate> {
    BIRTH_DATE_FORMATS
        .iter()
        .find_map(|fmt| chrono::NaiveDate::parse_from_str(value, fmt).ok())
}

/// Parse all data rows of an extract against a resolved column map.
///
/// Recoverable row problems land in the skip list and counters; the whole
/// run fails only on the row cap or when no valid record survives.
pub fn parse_records(
    data: &[u8],
    map: &ColumnMap,
    config: &ImportConfig,
) -> Result<ParseOutput, ImportError> {
    let data = crate::format::strip_utf8_bom(data);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .delimiter(map.delimiter.as_byte())
        .from_reader(data);

    let mut records = Vec::new();
    let mut skipped = Vec::new();
    let mut stats = ParseStats::default();
    let mut seen_keys: HashSet<String> = HashSet::new();

    for (idx, row) in reader.records().enumerate() {
        // Header is line 1, first data row is line 2.
        let line = idx + 2;
        stats.rows_read += 1;

        if stats.rows_read > config.max_rows {
            return Err(ImportError::TooManyRows(format!(
                "extract exceeds the row limit of {}; stopped at row {}",
                config.max_rows, stats.rows_read
            )));
        }

        let row = match row {
            Ok(r) => r,
            Err(e) => {
                stats.skipped_empty += 1;
                skipped.push(SkippedRow {
                    line,
                    registry: None,
                    reason: SkipReason::Empty,
                    message: format!("row could not be read: {e}"),
                });
                continue;
            }
        };

        let column_zero = row.get(0).map(str::trim).unwrap_or_default();
        let registry_cell = map.value(&row, FieldKey::RegistryNumber);
        let merged_candidate = registry_cell.is_none() && MERGED_REGISTRY.is_match(column_zero);

        if row.len() < 2 && !merged_candidate {
            stats.skipped_empty += 1;
            skipped.push(SkippedRow {
                line,
                registry: None,
                reason: SkipReason::Empty,
                message: "row has fewer than 2 fields".to_string(),
            });
            continue;
        }

        // Registry resolution, with merged-row recovery when the mapped
        // registry column is empty but column 0 carries the pattern.
        let (registry_raw, merged_name) = if let Some(raw) = registry_cell {
            (raw.to_string(), None)
        } else if merged_candidate {
            match split_merged_cell(column_zero) {
                Some((token, name_part)) => {
                    stats.merged_format_detected = true;
                    (token, Some(name_part))
                }
                None => {
                    stats.skipped_no_registry += 1;
                    skipped.push(SkippedRow {
                        line,
                        registry: None,
                        reason: SkipReason::MergedUnsplittable,
                        message: "merged row carries a registry token but no name text"
                            .to_string(),
                    });
                    continue;
                }
            }
        } else {
            stats.skipped_no_registry += 1;
            skipped.push(SkippedRow {
                line,
                registry: None,
                reason: SkipReason::NoRegistry,
                message: "no registry number".to_string(),
            });
            continue;
        };

        let registry_normalized = normalize_registry(&registry_raw);
        if registry_normalized.is_empty() {
            stats.skipped_no_registry += 1;
            skipped.push(SkippedRow {
                line,
                registry: None,
                reason: SkipReason::NoRegistry,
                message: "registry number is empty after normalization".to_string(),
            });
            continue;
        }
        let registry_formatted = format_registry(&registry_normalized);

        // Name resolution: merged recovery supersedes the mapped columns,
        // otherwise full-name mode splits one column and separate mode
        // reads four.
        let (last_name, first_name, middle_name, marital_raw) =
            if let Some(ref name_part) = merged_name {
                split_full_name(name_part)
            } else if map.full_name_mode() {
                match map.value(&row, FieldKey::FullName) {
                    Some(full) => split_full_name(full),
                    None => (None, None, None, None),
                }
            } else {
                (
                    map.value(&row, FieldKey::LastName).map(str::to_string),
                    map.value(&row, FieldKey::FirstName).map(str::to_string),
                    map.value(&row, FieldKey::MiddleName).map(str::to_string),
                    map.value(&row, FieldKey::MaritalSurname).map(str::to_string),
                )
            };

        let (Some(last_name), Some(first_name)) = (last_name, first_name) else {
            stats.skipped_no_name += 1;
            skipped.push(SkippedRow {
                line,
                registry: Some(registry_formatted.clone()),
                reason: SkipReason::NoName,
                message: "missing last name or first name".to_string(),
            });
            continue;
        };

        if !seen_keys.insert(registry_normalized.clone()) {
            skipped.push(SkippedRow {
                line,
                registry: Some(registry_formatted.clone()),
                reason: SkipReason::DuplicateInFile,
                message: format!(
                    "registry number {registry_formatted} appears earlier in this file; \
                     first occurrence kept"
                ),
            });
            continue;
        }

        let marital_surname = clean_marital(marital_raw.as_deref());
        let birth_date = map
            .value(&row, FieldKey::BirthDate)
            .and_then(parse_birth_date);
        let explicit_classification = map
            .value(&row, FieldKey::Classification)
            .and_then(MemberClass::from_label);
        let purok_grupo = map.value(&row, FieldKey::PurokGrupo).map(str::to_string);

        records.push(IncomingRecord {
            registry_raw,
            registry_normalized,
            registry_formatted,
            last_name,
            first_name,
            middle_name,
            marital_surname,
            birth_date,
            explicit_classification,
            purok_grupo,
            source_line: line,
        });
    }

    if stats.rows_read == 0 {
        return Err(ImportError::NoValidRecords(
            "extract contains no data rows".to_string(),
        ));
    }

    if records.is_empty() {
        return Err(ImportError::NoValidRecords(format!(
            "no valid records after parsing: {} rows read, {} skipped",
            stats.rows_read,
            skipped.len()
        )));
    }

    if stats.merged_format_detected {
        tracing::warn!(
            rows_read = stats.rows_read,
            "Merged row format detected in extract"
        );
    }

    Ok(ParseOutput {
        records,
        skipped,
        stats,
    })
}
