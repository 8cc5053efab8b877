//! Format detection and column mapping for roster extracts.
//!
//! Detects the delimiter from the first line, builds a case-insensitive
//! canonical-field -> source-column mapping from the header row (or from
//! an operator-supplied explicit mapping, which overrides auto-detection
//! entirely), and reports a three-way outcome: `Ready`, `NeedsMapping`,
//! or `Invalid`. NeedsMapping is a first-class non-error outcome carrying
//! the raw header list so the caller can collect a mapping and re-invoke.

use std::collections::HashMap;

/// UTF-8 BOM bytes.
const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Strip UTF-8 BOM from the beginning of data if present.
#[must_use]
pub fn strip_utf8_bom(data: &[u8]) -> &[u8] {
    if data.starts_with(UTF8_BOM) {
        &data[UTF8_BOM.len()..]
    } else {
        data
    }
}

/// Supported extract delimiters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum Delimiter {
    /// Comma (,) - default
    #[default]
    Comma,
    /// Tab character (\t) - spreadsheet paste exports
    Tab,
}

impl Delimiter {
    /// Convert delimiter to byte for the csv crate.
    #[must_use]
    pub fn as_byte(self) -> u8 {
        match self {
            Delimiter::Comma => b',',
            Delimiter::Tab => b'\t',
        }
    }

    /// Pick the more frequent of tab vs comma in the first line.
    /// Ties favor comma.
    #[must_use]
    pub fn detect(first_line: &str) -> Self {
        let tabs = first_line.matches('\t').count();
        let commas = first_line.matches(',').count();
        if tabs > commas {
            Delimiter::Tab
        } else {
            Delimiter::Comma
        }
    }
}

/// Canonical fields a roster extract can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKey {
    RegistryNumber,
    FullName,
    LastName,
    FirstName,
    MiddleName,
    MaritalSurname,
    BirthDate,
    Classification,
    PurokGrupo,
}

impl FieldKey {
    /// All canonical fields, for diagnostics.
    pub const ALL: [FieldKey; 9] = [
        FieldKey::RegistryNumber,
        FieldKey::FullName,
        FieldKey::LastName,
        FieldKey::FirstName,
        FieldKey::MiddleName,
        FieldKey::MaritalSurname,
        FieldKey::BirthDate,
        FieldKey::Classification,
        FieldKey::PurokGrupo,
    ];

    /// Canonical field name, as used in explicit mappings.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            FieldKey::RegistryNumber => "registry_number",
            FieldKey::FullName => "full_name",
            FieldKey::LastName => "last_name",
            FieldKey::FirstName => "first_name",
            FieldKey::MiddleName => "middle_name",
            FieldKey::MaritalSurname => "marital_surname",
            FieldKey::BirthDate => "birth_date",
            FieldKey::Classification => "classification",
            FieldKey::PurokGrupo => "purok_grupo",
        }
    }

    /// Parse a canonical field name from an explicit mapping key.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        FieldKey::ALL
            .into_iter()
            .find(|k| k.as_str() == name.trim().to_lowercase())
    }
}

/// Map a source header onto its canonical field, if it is a known synonym.
///
/// Matching is case-insensitive and trimmed. Synonym groups cover the
/// spellings seen in real extracts, including the combined purok-grupo
/// locality field.
#[must_use]
fn canonical_for_header(header: &str) -> Option<FieldKey> {
    let normalized = header.trim().to_lowercase();
    let key = match normalized.as_str() {
        "registry_number" | "registry number" | "registry no" | "registry no." | "reg no"
        | "reg no." | "reg. no." | "registration number" | "registry" => FieldKey::RegistryNumber,
        "full_name" | "full name" | "fullname" | "name" | "member name" => FieldKey::FullName,
        "last_name" | "last name" | "lastname" | "surname" => FieldKey::LastName,
        "first_name" | "first name" | "firstname" | "given name" => FieldKey::FirstName,
        "middle_name" | "middle name" | "middlename" | "middle" => FieldKey::MiddleName,
        "marital_surname" | "marital surname" | "married name" | "married surname" => {
            FieldKey::MaritalSurname
        }
        "birth_date" | "birth date" | "birthdate" | "date of birth" | "dob" | "birthday" => {
            FieldKey::BirthDate
        }
        "classification" | "category" | "class" => FieldKey::Classification,
        "purok_grupo" | "purok-grupo" | "purok/grupo" | "purok grupo" | "purok at grupo"
        | "purok" => FieldKey::PurokGrupo,
        _ => return None,
    };
    Some(key)
}

/// Resolved delimiter and canonical-field -> column-index mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    pub delimiter: Delimiter,
    fields: HashMap<FieldKey, usize>,
}

impl ColumnMap {
    /// Column index of a canonical field, if resolved.
    #[must_use]
    pub fn index_of(&self, key: FieldKey) -> Option<usize> {
        self.fields.get(&key).copied()
    }

    /// Trimmed, non-empty value of a canonical field from a parsed row.
    #[must_use]
    pub fn value<'a>(&self, record: &'a csv::StringRecord, key: FieldKey) -> Option<&'a str> {
        self.index_of(key)
            .and_then(|idx| record.get(idx))
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Whether name parsing runs in full-name mode (a single combined
    /// name column) rather than separate-columns mode.
    #[must_use]
    pub fn full_name_mode(&self) -> bool {
        self.fields.contains_key(&FieldKey::FullName)
    }
}

/// Three-way outcome of format detection.
#[derive(Debug)]
pub enum FormatOutcome {
    /// Required columns resolved; parsing can proceed.
    Ready(ColumnMap),

    /// Auto-detection failed the required-field check and no explicit
    /// mapping was given. Carries the raw header list.
    NeedsMapping { headers: Vec<String> },

    /// The extract is structurally unusable, or an explicit mapping was
    /// supplied and still fails. Fatal.
    Invalid { reason: String },
}

/// Whether the resolved fields satisfy the required-field check: a
/// registry-number column, and either a full-name column or both
/// last-name and first-name columns.
fn required_fields_resolved(fields: &HashMap<FieldKey, usize>) -> bool {
    fields.contains_key(&FieldKey::RegistryNumber)
        && (fields.contains_key(&FieldKey::FullName)
            || (fields.contains_key(&FieldKey::LastName)
                && fields.contains_key(&FieldKey::FirstName)))
}

/// Detect the delimiter and build the column mapping for an extract.
///
/// `explicit` maps canonical field names to source column headers and,
/// when present, overrides auto-detected indices entirely.
#[must_use]
pub fn detect_format(
    data: &[u8],
    explicit: Option<&HashMap<String, String>>,
) -> FormatOutcome {
    let data = strip_utf8_bom(data);

    if data.is_empty() {
        return FormatOutcome::Invalid {
            reason: "file is empty".to_string(),
        };
    }

    let first_line = match data.iter().position(|&b| b == b'\n') {
        Some(pos) => &data[..pos],
        None => data,
    };
    let first_line = String::from_utf8_lossy(first_line);
    if first_line.trim().is_empty() {
        return FormatOutcome::Invalid {
            reason: "header row is empty".to_string(),
        };
    }
    let delimiter = Delimiter::detect(&first_line);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .delimiter(delimiter.as_byte())
        .from_reader(data);

    let headers: Vec<String> = match reader.headers() {
        Ok(h) => h.iter().map(std::string::ToString::to_string).collect(),
        Err(e) => {
            return FormatOutcome::Invalid {
                reason: format!("failed to read header row: {e}"),
            }
        }
    };

    if headers.iter().all(|h| h.trim().is_empty()) {
        return FormatOutcome::Invalid {
            reason: "header row is empty".to_string(),
        };
    }

    let fields = if let Some(mapping) = explicit {
        match resolve_explicit_mapping(&headers, mapping) {
            Ok(fields) => fields,
            Err(reason) => return FormatOutcome::Invalid { reason },
        }
    } else {
        let mut fields = HashMap::new();
        for (idx, header) in headers.iter().enumerate() {
            if let Some(key) = canonical_for_header(header) {
                // First matching column wins for each canonical field.
                fields.entry(key).or_insert(idx);
            }
        }
        fields
    };

    if !required_fields_resolved(&fields) {
        if explicit.is_some() {
            return FormatOutcome::Invalid {
                reason: format!(
                    "required columns unresolved after explicit mapping: need registry_number \
                     and full_name or last_name+first_name. Found columns: {}",
                    headers.join(", ")
                ),
            };
        }
        return FormatOutcome::NeedsMapping { headers };
    }

    FormatOutcome::Ready(ColumnMap { delimiter, fields })
}

/// Resolve an explicit canonical-field -> source-header mapping against
/// the header row. Header matching is case-insensitive and trimmed.
fn resolve_explicit_mapping(
    headers: &[String],
    mapping: &HashMap<String, String>,
) -> Result<HashMap<FieldKey, usize>, String> {
    let header_index: HashMap<String, usize> = headers
        .iter()
        .enumerate()
        .map(|(idx, h)| (h.trim().to_lowercase(), idx))
        .collect();

    let mut fields = HashMap::new();
    for (field_name, source_header) in mapping {
        let key = FieldKey::parse(field_name).ok_or_else(|| {
            format!(
                "unknown canonical field '{}' in column mapping. Valid fields: {}",
                field_name,
                FieldKey::ALL
                    .iter()
                    .map(|k| k.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            )
        })?;

        let idx = header_index
            .get(&source_header.trim().to_lowercase())
            .copied()
            .ok_or_else(|| {
                format!(
                    "mapped source column '{}' not found in header row. Available columns: {}",
                    source_header,
                    headers.join(", ")
                )
            })?;

        fields.insert(key, idx);
    }

    Ok(fields)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_delimiter_detection() {
        assert_eq!(Delimiter::detect("a,b,c"), Delimiter::Comma);
        assert_eq!(Delimiter::detect("a\tb\tc"), Delimiter::Tab);
        // Ties favor comma
        assert_eq!(Delimiter::detect("a,b\tc"), Delimiter::Comma);
        assert_eq!(Delimiter::detect("plain"), Delimiter::Comma);
    }

    #[test]
    fn test_detect_auto_comma() {
        let data = b"Registry No,Full Name,Birth Date\nPPE0581000058,\"DELA CRUZ, JUAN\",1990-01-01";
        match detect_format(data, None) {
            FormatOutcome::Ready(map) => {
                assert_eq!(map.delimiter, Delimiter::Comma);
                assert_eq!(map.index_of(FieldKey::RegistryNumber), Some(0));
                assert_eq!(map.index_of(FieldKey::FullName), Some(1));
                assert_eq!(map.index_of(FieldKey::BirthDate), Some(2));
                assert!(map.full_name_mode());
            }
            other => panic!("expected Ready, got {other:?}"),
        }
    }

    #[test]
    fn test_detect_auto_tab() {
        let data = b"Registry No\tSurname\tGiven Name\nPPE0581000058\tDELA CRUZ\tJUAN";
        match detect_format(data, None) {
            FormatOutcome::Ready(map) => {
                assert_eq!(map.delimiter, Delimiter::Tab);
                assert_eq!(map.index_of(FieldKey::LastName), Some(1));
                assert_eq!(map.index_of(FieldKey::FirstName), Some(2));
                assert!(!map.full_name_mode());
            }
            other => panic!("expected Ready, got {other:?}"),
        }
    }

    #[test]
    fn test_detect_strips_bom() {
        let mut data = vec![0xEF, 0xBB, 0xBF];
        data.extend_from_slice(b"registry number,name\nPPE0581000058,X Y");
        assert!(matches!(
            detect_format(&data, None),
            FormatOutcome::Ready(_)
        ));
    }

    #[test]
    fn test_purok_grupo_synonyms() {
        for header in ["Purok-Grupo", "purok/grupo", "PUROK GRUPO", "Purok"] {
            let data = format!("Registry No,Name,{header}\n");
            match detect_format(data.as_bytes(), None) {
                FormatOutcome::Ready(map) => {
                    assert_eq!(map.index_of(FieldKey::PurokGrupo), Some(2), "{header}");
                }
                other => panic!("expected Ready for {header}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_needs_mapping_preserves_headers() {
        let data = b"Col A,Col B,Col C\n1,2,3";
        match detect_format(data, None) {
            FormatOutcome::NeedsMapping { headers } => {
                assert_eq!(headers, vec!["Col A", "Col B", "Col C"]);
            }
            other => panic!("expected NeedsMapping, got {other:?}"),
        }
    }

    #[test]
    fn test_registry_alone_is_not_enough() {
        let data = b"Registry No,Other\nPPE0581000058,x";
        assert!(matches!(
            detect_format(data, None),
            FormatOutcome::NeedsMapping { .. }
        ));
    }

    #[test]
    fn test_explicit_mapping_overrides_detection() {
        let data = b"Kol1,Kol2,Kol3\nPPE0581000058,DELA CRUZ,JUAN";
        let m = mapping(&[
            ("registry_number", "Kol1"),
            ("last_name", "Kol2"),
            ("first_name", "Kol3"),
        ]);
        match detect_format(data, Some(&m)) {
            FormatOutcome::Ready(map) => {
                assert_eq!(map.index_of(FieldKey::RegistryNumber), Some(0));
                assert_eq!(map.index_of(FieldKey::LastName), Some(1));
                assert_eq!(map.index_of(FieldKey::FirstName), Some(2));
            }
            other => panic!("expected Ready, got {other:?}"),
        }
    }

    #[test]
    fn test_explicit_mapping_is_case_insensitive() {
        let data = b"KOL1,KOL2\nPPE0581000058,\"DELA CRUZ, JUAN\"";
        let m = mapping(&[("registry_number", "kol1"), ("full_name", "kol2")]);
        assert!(matches!(detect_format(data, Some(&m)), FormatOutcome::Ready(_)));
    }

    #[test]
    fn test_explicit_mapping_missing_source_is_invalid() {
        let data = b"Kol1\nx";
        let m = mapping(&[("registry_number", "Nowhere")]);
        match detect_format(data, Some(&m)) {
            FormatOutcome::Invalid { reason } => assert!(reason.contains("Nowhere")),
            other => panic!("expected Invalid, got {other:?}"),
        }
    }

    #[test]
    fn test_explicit_mapping_unknown_field_is_invalid() {
        let data = b"Kol1\nx";
        let m = mapping(&[("shoe_size", "Kol1")]);
        match detect_format(data, Some(&m)) {
            FormatOutcome::Invalid { reason } => assert!(reason.contains("shoe_size")),
            other => panic!("expected Invalid, got {other:?}"),
        }
    }

    #[test]
    fn test_explicit_mapping_unresolved_required_is_invalid() {
        // Mapping resolves, but covers no registry column: fatal, not NeedsMapping.
        let data = b"Kol1,Kol2\nx,y";
        let m = mapping(&[("full_name", "Kol1")]);
        assert!(matches!(
            detect_format(data, Some(&m)),
            FormatOutcome::Invalid { .. }
        ));
    }

    #[test]
    fn test_empty_file_is_invalid() {
        assert!(matches!(
            detect_format(b"", None),
            FormatOutcome::Invalid { .. }
        ));
    }

    #[test]
    fn test_empty_header_row_is_invalid() {
        assert!(matches!(
            detect_format(b"\nrow", None),
            FormatOutcome::Invalid { .. }
        ));
    }

    #[test]
    fn test_first_synonym_column_wins() {
        let data = b"Registry No,Reg No,Name\nA,B,C";
        match detect_format(data, None) {
            FormatOutcome::Ready(map) => {
                assert_eq!(map.index_of(FieldKey::RegistryNumber), Some(0));
            }
            other => panic!("expected Ready, got {other:?}"),
        }
    }

    #[test]
    fn test_field_key_parse() {
        assert_eq!(FieldKey::parse("registry_number"), Some(FieldKey::RegistryNumber));
        assert_eq!(FieldKey::parse(" MARITAL_SURNAME "), Some(FieldKey::MaritalSurname));
        assert_eq!(FieldKey::parse("email"), None);
    }
}
