use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use uuid::Uuid;

use crate::api::RowFailure;
use crate::fields::TargetField;
use crate::session::ImportSession;

/// Errors found in one row. `row` is the 1-based data row number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowReport {
    pub row: usize,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionReport {
    pub imported: usize,
    pub failures: Vec<RowFailure>,
}

/// JSON report of a validation run, optionally with the submission result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub session_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub file_name: Option<String>,
    pub allow_partial: bool,
    pub needs_review: bool,
    pub total_rows: usize,
    pub error_count: usize,
    pub errors_by_type: BTreeMap<String, usize>,
    pub skipped_required_fields: Vec<TargetField>,
    /// Only rows with at least one error
    pub rows: Vec<RowReport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submission: Option<SubmissionReport>,
}

impl ValidationReport {
    /// Build a report from the session's last validation, validating now if
    /// the session has none
    pub fn from_session(session: &ImportSession) -> Self {
        let validated;
        let session = if session.validation().is_some() {
            session
        } else {
            validated = session.validate();
            &validated
        };
        let validation = session.validation().cloned().unwrap_or_default();

        let rows = validation
            .rows_in_error()
            .into_iter()
            .map(|i| RowReport {
                row: i + 1,
                errors: validation.errors_for(i),
            })
            .collect();

        Self {
            session_id: session.id(),
            generated_at: Utc::now(),
            file_name: session.file().map(|f| f.file_name.clone()),
            allow_partial: session.allow_partial(),
            needs_review: session.needs_review(),
            total_rows: validation.row_issues.len(),
            error_count: validation.error_count(),
            errors_by_type: validation.errors_by_type.clone(),
            skipped_required_fields: validation.skipped_required_fields.clone(),
            rows,
            submission: session.outcome().map(|o| SubmissionReport {
                imported: o.imported(),
                failures: o.failures().to_vec(),
            }),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize validation report")
    }

    /// Write the report as pretty JSON, creating parent directories
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, self.to_json()?)
            .with_context(|| format!("Failed to write report to {:?}", path.as_ref()))?;
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read report: {:?}", path.as_ref()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse report: {:?}", path.as_ref()))
    }
}
