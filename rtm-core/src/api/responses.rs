//! Request and response bodies of the bulk-create endpoint

use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::transform::TransformedRequirement;

/// Body of `POST requirements/bulk`
#[derive(Debug, Clone, Serialize)]
pub struct BulkCreateRequest<'a> {
    pub requirements: &'a [TransformedRequirement],
}

/// A row the server refused
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowFailure {
    /// Index into the submitted requirements
    pub index: usize,
    #[serde(default)]
    pub data: serde_json::Value,
    pub error: String,
}

/// Response of `POST requirements/bulk`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkCreateResponse {
    #[serde(default)]
    pub imported_requirements: Vec<serde_json::Value>,
    #[serde(default)]
    pub errors: Option<Vec<RowFailure>>,
}

impl BulkCreateResponse {
    pub fn failures(&self) -> &[RowFailure] {
        self.errors.as_deref().unwrap_or(&[])
    }
}

/// What a submission achieved
///
/// A partial outcome is not an error: both counts are reported and the
/// refused rows are not retried automatically.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionOutcome {
    /// Every row was created
    Complete { imported: usize },
    /// Some rows were created, some refused
    Partial {
        imported: usize,
        failures: Vec<RowFailure>,
    },
}

impl SubmissionOutcome {
    pub fn imported(&self) -> usize {
        match self {
            SubmissionOutcome::Complete { imported } => *imported,
            SubmissionOutcome::Partial { imported, .. } => *imported,
        }
    }

    pub fn failures(&self) -> &[RowFailure] {
        match self {
            SubmissionOutcome::Complete { .. } => &[],
            SubmissionOutcome::Partial { failures, .. } => failures,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, SubmissionOutcome::Complete { .. })
    }
}

impl From<BulkCreateResponse> for SubmissionOutcome {
    fn from(response: BulkCreateResponse) -> Self {
        let imported = response.imported_requirements.len();
        match response.errors {
            Some(failures) if !failures.is_empty() => {
                SubmissionOutcome::Partial { imported, failures }
            }
            _ => SubmissionOutcome::Complete { imported },
        }
    }
}

/// Parse a bulk-create response body
pub fn parse_bulk_create_response(body: &str) -> Result<BulkCreateResponse, ApiError> {
    serde_json::from_str(body).map_err(|e| {
        ApiError::InvalidResponse(format!(
            "Failed to parse bulk create response: {}. Body: {}",
            e,
            body.chars().take(200).collect::<String>()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_complete_response() {
        let body = r#"{"importedRequirements": [{"id": 1}, {"id": 2}]}"#;
        let response = parse_bulk_create_response(body).unwrap();
        assert_eq!(response.imported_requirements.len(), 2);
        assert!(response.failures().is_empty());

        let outcome = SubmissionOutcome::from(response);
        assert_eq!(outcome, SubmissionOutcome::Complete { imported: 2 });
    }

    #[test]
    fn test_parse_partial_response() {
        let body = r#"{
  "importedRequirements": [{"id": 7}],
  "errors": [
    {"index": 1, "data": {"title": ""}, "error": "Unknown module 'Finanse'"}
  ]
}"#;
        let outcome = SubmissionOutcome::from(parse_bulk_create_response(body).unwrap());
        assert!(!outcome.is_complete());
        assert_eq!(outcome.imported(), 1);
        assert_eq!(outcome.failures()[0].index, 1);
        assert_eq!(outcome.failures()[0].error, "Unknown module 'Finanse'");
    }

    #[test]
    fn test_empty_error_list_is_complete() {
        let body = r#"{"importedRequirements": [], "errors": []}"#;
        let outcome = SubmissionOutcome::from(parse_bulk_create_response(body).unwrap());
        assert!(outcome.is_complete());
    }

    #[test]
    fn test_parse_garbage_response() {
        let err = parse_bulk_create_response("<html>oops</html>").unwrap_err();
        assert!(matches!(err, ApiError::InvalidResponse(_)));
    }

    #[test]
    fn test_request_shape() {
        let reqs = vec![TransformedRequirement::default()];
        let json = serde_json::to_value(BulkCreateRequest { requirements: &reqs }).unwrap();
        assert_eq!(json["requirements"].as_array().unwrap().len(), 1);
    }
}
