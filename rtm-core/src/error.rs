//! Error types for the import pipeline

use thiserror::Error;

use crate::fields::TargetField;
use crate::session::WizardStep;

/// Errors raised by the requirements API client
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("API base URL is not configured")]
    NotConfigured,

    #[error("API request failed: {0}")]
    RequestFailed(String),

    #[error("API returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Invalid response from API: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ApiError::InvalidResponse(e.to_string())
        } else {
            ApiError::RequestFailed(e.to_string())
        }
    }
}

/// Errors surfaced by the import wizard
///
/// None of these are fatal to the application; each one leaves the session
/// at a step the user can recover from.
#[derive(Error, Debug)]
pub enum ImportError {
    /// The uploaded file could not be decoded
    #[error("Failed to parse file: {0}")]
    Parse(String),

    #[error("Unsupported file type '{0}' (expected csv, txt, xlsx, xlsm, xls, xlsb or ods)")]
    UnsupportedFormat(String),

    /// Blocks MapColumns -> Review
    #[error("{}", describe_incomplete(.missing, .conflicts))]
    MappingIncomplete {
        missing: Vec<TargetField>,
        conflicts: Vec<TargetField>,
    },

    #[error("Column '{0}' is not part of the uploaded file")]
    UnknownHeader(String),

    #[error("No file has been uploaded")]
    NoFileLoaded,

    /// Strict mode refuses to submit while rows have errors
    #[error("Validation reported {errors} error(s) in {rows} row(s); fix the file or enable partial mapping")]
    ValidationFailed { errors: usize, rows: usize },

    /// The session already submitted its rows
    #[error("This import was already submitted ({imported} created); upload the rejected rows as a new import")]
    AlreadySubmitted { imported: usize },

    #[error("Operation requires the {expected} step, but the session is at {actual}")]
    WrongStep {
        expected: WizardStep,
        actual: WizardStep,
    },

    /// Network or server failure on bulk create
    #[error("Submission failed: {0}")]
    Submission(#[from] ApiError),
}

fn describe_incomplete(missing: &[TargetField], conflicts: &[TargetField]) -> String {
    let join = |fields: &[TargetField]| {
        fields
            .iter()
            .map(|f| f.id())
            .collect::<Vec<_>>()
            .join(", ")
    };

    let mut parts = Vec::new();
    if !missing.is_empty() {
        parts.push(format!("required fields not mapped: {}", join(missing)));
    }
    if !conflicts.is_empty() {
        parts.push(format!("fields mapped more than once: {}", join(conflicts)));
    }
    format!("Mapping incomplete - {}", parts.join("; "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mapping_incomplete_message() {
        let err = ImportError::MappingIncomplete {
            missing: vec![TargetField::Function, TargetField::FitGap],
            conflicts: vec![],
        };
        assert_eq!(
            err.to_string(),
            "Mapping incomplete - required fields not mapped: function, fitgap"
        );

        let err = ImportError::MappingIncomplete {
            missing: vec![TargetField::Title],
            conflicts: vec![TargetField::Module],
        };
        assert_eq!(
            err.to_string(),
            "Mapping incomplete - required fields not mapped: title; fields mapped more than once: module"
        );
    }
}
