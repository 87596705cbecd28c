//! Row validator
//!
//! Checks every row for required values and for master-data names that do
//! not exist. Validation never fails: it returns a [`ValidationResult`] the
//! caller treats as blocking (strict mode) or advisory (partial mode).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::decode::RawRow;
use crate::fields::{TargetField, CORE_REQUIRED, DOMAIN_REQUIRED};
use crate::mapping::ColumnMapping;
use crate::reference::{MasterDataKind, ReferenceSet};

/// Fields whose values must name an existing master-data record
pub const REFERENCE_CHECKED: [TargetField; 4] = [
    TargetField::Module,
    TargetField::Submodule,
    TargetField::Department,
    TargetField::FunctionalArea,
];

/// A single problem found in a row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RowIssue {
    /// Strict mode: a core field is unmapped or empty
    MissingRequired { field: TargetField },
    /// The field is mapped but this row has no value for it
    MissingMappedValue { field: TargetField },
    /// The value names no known master-data record
    InvalidReference { field: TargetField, value: String },
}

impl RowIssue {
    /// Histogram key: the field id for missing values, `invalid_<field>`
    /// for unknown references
    pub fn category(&self) -> String {
        match self {
            RowIssue::MissingRequired { field } | RowIssue::MissingMappedValue { field } => {
                field.id().to_string()
            }
            RowIssue::InvalidReference { field, .. } => format!("invalid_{}", field.id()),
        }
    }

    pub fn field(&self) -> TargetField {
        match self {
            RowIssue::MissingRequired { field }
            | RowIssue::MissingMappedValue { field }
            | RowIssue::InvalidReference { field, .. } => *field,
        }
    }
}

impl fmt::Display for RowIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowIssue::MissingRequired { field } => write!(f, "Missing required field: {}", field),
            RowIssue::MissingMappedValue { field } => {
                write!(f, "Missing value for mapped field: {}", field)
            }
            RowIssue::InvalidReference { field, value } => {
                write!(f, "Invalid {}: {}", field, value)
            }
        }
    }
}

/// Outcome of validating every row of an import
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Issues per row, indexed like the input rows
    pub row_issues: Vec<Vec<RowIssue>>,
    /// Category -> number of rows with an issue in that category
    pub errors_by_type: BTreeMap<String, usize>,
    /// Core fields left unmapped in partial mode
    pub skipped_required_fields: Vec<TargetField>,
    pub allow_partial: bool,
}

impl ValidationResult {
    /// Human-readable errors for one row
    pub fn errors_for(&self, row: usize) -> Vec<String> {
        self.row_issues
            .get(row)
            .map(|issues| issues.iter().map(|i| i.to_string()).collect())
            .unwrap_or_default()
    }

    /// Indices of rows with at least one issue
    pub fn rows_in_error(&self) -> Vec<usize> {
        self.row_issues
            .iter()
            .enumerate()
            .filter(|(_, issues)| !issues.is_empty())
            .map(|(i, _)| i)
            .collect()
    }

    pub fn error_count(&self) -> usize {
        self.row_issues.iter().map(|issues| issues.len()).sum()
    }

    pub fn is_clean(&self) -> bool {
        self.row_issues.iter().all(|issues| issues.is_empty())
    }

    /// Strict mode blocks submission on any error; partial mode never does
    pub fn blocks_submission(&self) -> bool {
        !self.allow_partial && !self.is_clean()
    }
}

/// Validate every row against the mapping and reference data
pub fn validate_rows(
    rows: &[RawRow],
    mapping: &ColumnMapping,
    allow_partial: bool,
    references: &ReferenceSet,
) -> ValidationResult {
    let mut result = ValidationResult {
        allow_partial,
        skipped_required_fields: if allow_partial {
            mapping.unmapped_core()
        } else {
            Vec::new()
        },
        ..Default::default()
    };

    for row in rows {
        let issues = validate_row(row, mapping, allow_partial, references);
        for issue in &issues {
            *result.errors_by_type.entry(issue.category()).or_default() += 1;
        }
        result.row_issues.push(issues);
    }

    result
}

/// Validate a single row
pub fn validate_row(
    row: &RawRow,
    mapping: &ColumnMapping,
    allow_partial: bool,
    references: &ReferenceSet,
) -> Vec<RowIssue> {
    let mut issues = Vec::new();

    for field in CORE_REQUIRED {
        match value_of(row, mapping, field) {
            None if !allow_partial => issues.push(RowIssue::MissingRequired { field }),
            None => {}
            Some(v) if v.is_empty() => {
                if allow_partial {
                    issues.push(RowIssue::MissingMappedValue { field });
                } else {
                    issues.push(RowIssue::MissingRequired { field });
                }
            }
            Some(_) => {}
        }
    }

    // domain fields only count when mapped, whatever the mode
    for field in DOMAIN_REQUIRED {
        if let Some("") = value_of(row, mapping, field) {
            issues.push(RowIssue::MissingMappedValue { field });
        }
    }

    for field in REFERENCE_CHECKED {
        let Some(value) = value_of(row, mapping, field).filter(|v| !v.is_empty()) else {
            continue;
        };
        let Some(kind) = MasterDataKind::for_field(field) else {
            continue;
        };
        if references.contains(kind, value) == Some(false) {
            issues.push(RowIssue::InvalidReference {
                field,
                value: value.to_string(),
            });
        }
    }

    issues
}

/// Trimmed value of the header mapped to `field`; None when unmapped
fn value_of<'a>(row: &'a RawRow, mapping: &ColumnMapping, field: TargetField) -> Option<&'a str> {
    mapping
        .header_for(field)
        .map(|header| row.get(header).unwrap_or("").trim())
}
