//! Import wizard session
//!
//! An [`ImportSession`] is an immutable value: every step returns a new
//! session instead of mutating the current one, so a stale validation result
//! can never survive a mapping edit.
//!
//! Steps run `Upload -> MapColumns -> Review -> Complete`, with `back`
//! available from MapColumns and Review.

use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

use crate::api::{RequirementsApi, SubmissionOutcome};
use crate::decode::{decode_file, DecodedFile};
use crate::error::ImportError;
use crate::fields::TargetField;
use crate::infer::infer_mapping;
use crate::mapping::ColumnMapping;
use crate::reference::ReferenceSet;
use crate::transform::{self, TransformedRequirement};
use crate::validate::{validate_rows, ValidationResult};

/// Where the wizard currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WizardStep {
    Upload,
    MapColumns,
    Review,
    /// A submission created every row
    Complete,
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WizardStep::Upload => write!(f, "Upload"),
            WizardStep::MapColumns => write!(f, "Map Columns"),
            WizardStep::Review => write!(f, "Review"),
            WizardStep::Complete => write!(f, "Complete"),
        }
    }
}

/// State of one import, from upload to submission
#[derive(Debug, Clone)]
pub struct ImportSession {
    id: Uuid,
    started_at: DateTime<Utc>,
    step: WizardStep,
    file: Option<Arc<DecodedFile>>,
    mapping: ColumnMapping,
    allow_partial: bool,
    references: Arc<ReferenceSet>,
    validation: Option<ValidationResult>,
    outcome: Option<SubmissionOutcome>,
}

impl ImportSession {
    /// Start a session at the Upload step
    pub fn new(references: ReferenceSet) -> Self {
        let session = Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            step: WizardStep::Upload,
            file: None,
            mapping: ColumnMapping::default(),
            allow_partial: false,
            references: Arc::new(references),
            validation: None,
            outcome: None,
        };
        debug!("Import session {} started", session.id);
        session
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn file(&self) -> Option<&DecodedFile> {
        self.file.as_deref()
    }

    pub fn mapping(&self) -> &ColumnMapping {
        &self.mapping
    }

    pub fn allow_partial(&self) -> bool {
        self.allow_partial
    }

    pub fn references(&self) -> &ReferenceSet {
        &self.references
    }

    /// Result of the last explicit validation; None once inputs changed
    pub fn validation(&self) -> Option<&ValidationResult> {
        self.validation.as_ref()
    }

    pub fn outcome(&self) -> Option<&SubmissionOutcome> {
        self.outcome.as_ref()
    }

    fn expect_step(&self, expected: WizardStep) -> Result<(), ImportError> {
        if self.step == expected {
            Ok(())
        } else {
            Err(ImportError::WrongStep {
                expected,
                actual: self.step,
            })
        }
    }

    fn rows(&self) -> &[crate::decode::RawRow] {
        self.file.as_deref().map(|f| f.rows.as_slice()).unwrap_or(&[])
    }

    /// Decode an uploaded file and move to MapColumns
    ///
    /// On a parse error the current session is untouched; callers keep (or
    /// [`reset`](Self::reset)) it and stay at Upload.
    pub fn upload(&self, file_name: &str, bytes: &[u8]) -> Result<Self, ImportError> {
        let decoded = decode_file(file_name, bytes)?;
        Ok(self.load(decoded))
    }

    /// Adopt an already decoded file, seeding the mapping by inference
    pub fn load(&self, file: DecodedFile) -> Self {
        let mapping = infer_mapping(&file.headers);
        info!(
            "Session {}: loaded {} ({} rows), {} of {} columns mapped",
            self.id,
            file.file_name,
            file.rows.len(),
            mapping.mapped().count(),
            file.headers.len()
        );

        Self {
            step: WizardStep::MapColumns,
            file: Some(Arc::new(file)),
            mapping,
            validation: None,
            outcome: None,
            ..self.clone()
        }
    }

    /// Back to an empty Upload step, keeping reference data and mode
    pub fn reset(&self) -> Self {
        Self {
            step: WizardStep::Upload,
            file: None,
            mapping: ColumnMapping::default(),
            validation: None,
            outcome: None,
            ..self.clone()
        }
    }

    /// Re-enter MapColumns from Upload when a file is already decoded
    pub fn proceed_to_mapping(&self) -> Result<Self, ImportError> {
        self.expect_step(WizardStep::Upload)?;
        if self.file.is_none() {
            return Err(ImportError::NoFileLoaded);
        }
        Ok(Self {
            step: WizardStep::MapColumns,
            ..self.clone()
        })
    }

    /// Assign (or clear) the field for one column
    pub fn set_mapping(
        &self,
        header: &str,
        field: Option<TargetField>,
    ) -> Result<Self, ImportError> {
        self.expect_step(WizardStep::MapColumns)?;

        let mut mapping = self.mapping.clone();
        if !mapping.set(header, field) {
            return Err(ImportError::UnknownHeader(header.to_string()));
        }
        debug!(
            "Session {}: '{}' -> {}",
            self.id,
            header,
            field.map(|f| f.id()).unwrap_or("(ignored)")
        );

        Ok(Self {
            mapping,
            validation: None,
            ..self.clone()
        })
    }

    /// Toggle partial-mapping mode
    pub fn set_allow_partial(&self, allow_partial: bool) -> Result<Self, ImportError> {
        self.expect_step(WizardStep::MapColumns)?;
        Ok(Self {
            allow_partial,
            validation: None,
            ..self.clone()
        })
    }

    /// Replace the reference data; an existing validation is recomputed
    pub fn with_references(&self, references: ReferenceSet) -> Self {
        let next = Self {
            references: Arc::new(references),
            ..self.clone()
        };
        if next.validation.is_some() {
            next.validate()
        } else {
            next
        }
    }

    /// Check the MapColumns -> Review gate without moving
    pub fn check_mapping(&self) -> Result<(), ImportError> {
        let missing = if self.allow_partial {
            Vec::new()
        } else {
            self.mapping.unmapped_core()
        };
        let conflicts = self.mapping.conflicts();

        if missing.is_empty() && conflicts.is_empty() {
            Ok(())
        } else {
            Err(ImportError::MappingIncomplete { missing, conflicts })
        }
    }

    /// Run validation on demand without changing step
    pub fn validate(&self) -> Self {
        let result = validate_rows(
            self.rows(),
            &self.mapping,
            self.allow_partial,
            &self.references,
        );
        debug!(
            "Session {}: validation found {} errors in {} rows",
            self.id,
            result.error_count(),
            result.rows_in_error().len()
        );

        Self {
            validation: Some(result),
            ..self.clone()
        }
    }

    /// MapColumns -> Review, validating as a side effect
    pub fn proceed_to_review(&self) -> Result<Self, ImportError> {
        self.expect_step(WizardStep::MapColumns)?;
        if self.file.is_none() {
            return Err(ImportError::NoFileLoaded);
        }
        self.check_mapping()?;

        let next = Self {
            step: WizardStep::Review,
            ..self.validate()
        };
        info!("Session {}: entered review", self.id);
        Ok(next)
    }

    /// One step back; Complete and Upload stay where they are
    pub fn back(&self) -> Self {
        let step = match self.step {
            WizardStep::Review => WizardStep::MapColumns,
            WizardStep::MapColumns => WizardStep::Upload,
            other => other,
        };
        Self {
            step,
            ..self.clone()
        }
    }

    /// True in Review when validation permits submission
    pub fn is_ready_to_submit(&self) -> bool {
        self.step == WizardStep::Review
            && self.outcome.is_none()
            && !self.rows().is_empty()
            && self
                .validation
                .as_ref()
                .is_some_and(|v| !v.blocks_submission())
    }

    /// The session-level review flag stamped on every payload
    pub fn needs_review(&self) -> bool {
        transform::needs_review(&self.mapping, self.allow_partial)
    }

    /// Submission payloads for every row
    pub fn payloads(&self) -> Vec<TransformedRequirement> {
        transform::transform_rows(self.rows(), &self.mapping, self.allow_partial)
    }

    /// Submit every row through `api`
    ///
    /// A transport or server failure leaves the caller's session in Review
    /// for a retry.
    pub fn submit(&self, api: &dyn RequirementsApi) -> Result<Self, ImportError> {
        self.expect_step(WizardStep::Review)?;
        // rows already created must not be sent twice; start over with a
        // fresh upload of the rejected rows instead
        if let Some(outcome) = &self.outcome {
            return Err(ImportError::AlreadySubmitted {
                imported: outcome.imported(),
            });
        }
        if !self.is_ready_to_submit() {
            let (errors, rows) = self
                .validation
                .as_ref()
                .map(|v| (v.error_count(), v.rows_in_error().len()))
                .unwrap_or((0, 0));
            return Err(ImportError::ValidationFailed { errors, rows });
        }

        let payloads = self.payloads();
        let response = api.bulk_create(&payloads)?;
        Ok(self.record_submission(SubmissionOutcome::from(response)))
    }

    /// Record a submission result: a clean outcome completes the wizard, a
    /// partial one stays in Review for inspection
    pub fn record_submission(&self, outcome: SubmissionOutcome) -> Self {
        let step = if outcome.is_complete() {
            WizardStep::Complete
        } else {
            WizardStep::Review
        };
        info!(
            "Session {}: {} imported, {} rejected",
            self.id,
            outcome.imported(),
            outcome.failures().len()
        );

        Self {
            step,
            outcome: Some(outcome),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::FakeApi;
    use crate::reference::MasterDataKind;

    const CSV: &str = "Title,Desc,Module,SubModule,Function,Priority,Status,FitGap\n\
Approve invoices,Two-level approval,Sales,Orders,Approve,High,Open,Fit\n\
Ship orders,Pick and pack,Operations,Orders,Ship,Low,Open,Gap\n";

    const CSV_NO_FUNCTION: &str = "Title,Desc,Module,SubModule,Priority,Status,FitGap\n\
Approve invoices,Two-level approval,Sales,Orders,High,Open,Fit\n";

    fn references() -> ReferenceSet {
        ReferenceSet::new()
            .with(MasterDataKind::Modules, &["Sales", "Operations"])
            .with(MasterDataKind::Submodules, &["Orders"])
    }

    fn uploaded(csv: &str) -> ImportSession {
        ImportSession::new(references())
            .upload("reqs.csv", csv.as_bytes())
            .unwrap()
    }

    #[test]
    fn test_upload_seeds_mapping() {
        let session = uploaded(CSV);
        assert_eq!(session.step(), WizardStep::MapColumns);
        assert_eq!(session.mapping().get("FitGap"), Some(TargetField::FitGap));
        assert!(session.validation().is_none());
    }

    #[test]
    fn test_parse_error_keeps_upload_step() {
        let session = ImportSession::new(references());
        let err = session.upload("reqs.csv", b"Title\n").unwrap_err();
        assert!(matches!(err, ImportError::Parse(_)));
        assert_eq!(session.step(), WizardStep::Upload);
        assert!(matches!(
            session.proceed_to_mapping(),
            Err(ImportError::NoFileLoaded)
        ));
    }

    #[test]
    fn test_strict_mode_blocks_review_when_core_unmapped() {
        let session = uploaded(CSV_NO_FUNCTION);
        let err = session.proceed_to_review().unwrap_err();
        match err {
            ImportError::MappingIncomplete { missing, conflicts } => {
                assert_eq!(missing, vec![TargetField::Function]);
                assert!(conflicts.is_empty());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_partial_mode_flags_review() {
        let session = uploaded(CSV_NO_FUNCTION)
            .set_allow_partial(true)
            .unwrap()
            .proceed_to_review()
            .unwrap();

        assert_eq!(session.step(), WizardStep::Review);
        let validation = session.validation().unwrap();
        assert!(validation.is_clean());
        assert_eq!(validation.skipped_required_fields, vec![TargetField::Function]);
        assert!(session.is_ready_to_submit());
        assert!(session.payloads().iter().all(|p| p.needs_review));
    }

    #[test]
    fn test_conflict_blocks_review() {
        let session = uploaded(CSV)
            .set_mapping("Desc", Some(TargetField::Title))
            .unwrap();
        let err = session.proceed_to_review().unwrap_err();
        assert!(matches!(
            err,
            ImportError::MappingIncomplete { ref conflicts, .. } if conflicts == &vec![TargetField::Title]
        ));
    }

    #[test]
    fn test_mapping_edit_discards_validation() {
        let session = uploaded(CSV).validate();
        assert!(session.validation().is_some());

        let edited = session.set_mapping("Status", None).unwrap();
        assert!(edited.validation().is_none());
        // the previous session is untouched
        assert!(session.validation().is_some());
        assert_eq!(session.mapping().get("Status"), Some(TargetField::Status));
    }

    #[test]
    fn test_unknown_header() {
        let err = uploaded(CSV)
            .set_mapping("Nope", Some(TargetField::Phase))
            .unwrap_err();
        assert!(matches!(err, ImportError::UnknownHeader(h) if h == "Nope"));
    }

    #[test]
    fn test_strict_errors_block_submission() {
        let csv = CSV.replace("Operations", "Finance");
        let session = uploaded(&csv).proceed_to_review().unwrap();
        assert!(!session.is_ready_to_submit());

        let api = FakeApi::new();
        let err = session.submit(&api).unwrap_err();
        assert!(matches!(err, ImportError::ValidationFailed { errors: 1, rows: 1 }));
        assert!(api.submitted.lock().unwrap().is_empty());
    }

    #[test]
    fn test_complete_submission() {
        let api = FakeApi::new();
        let session = uploaded(CSV).proceed_to_review().unwrap();
        let done = session.submit(&api).unwrap();

        assert_eq!(done.step(), WizardStep::Complete);
        assert_eq!(done.outcome().unwrap().imported(), 2);
        assert_eq!(api.submitted.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_partial_submission_stays_in_review() {
        let api = FakeApi::new().rejecting_row(1);
        let session = uploaded(CSV).proceed_to_review().unwrap();
        let after = session.submit(&api).unwrap();

        assert_eq!(after.step(), WizardStep::Review);
        let outcome = after.outcome().unwrap();
        assert_eq!(outcome.imported(), 1);
        assert_eq!(outcome.failures()[0].index, 1);
    }

    #[test]
    fn test_second_submission_is_refused() {
        let api = FakeApi::new().rejecting_row(1);
        let after = uploaded(CSV)
            .proceed_to_review()
            .unwrap()
            .submit(&api)
            .unwrap();
        assert!(!after.is_ready_to_submit());

        let err = after.submit(&api).unwrap_err();
        assert!(matches!(err, ImportError::AlreadySubmitted { imported: 1 }));
        assert_eq!(api.submitted.lock().unwrap().len(), 1);

        // going back and forth does not re-arm submission
        let again = after.back().proceed_to_review().unwrap();
        assert!(matches!(
            again.submit(&api),
            Err(ImportError::AlreadySubmitted { .. })
        ));

        // a new upload does
        let fresh = after.reset().upload("retry.csv", CSV.as_bytes()).unwrap();
        assert!(fresh.outcome().is_none());
    }

    #[test]
    fn test_submission_failure_is_reported() {
        let api = FakeApi::new().unreachable();
        let session = uploaded(CSV).proceed_to_review().unwrap();
        let err = session.submit(&api).unwrap_err();
        assert!(matches!(err, ImportError::Submission(_)));
        assert_eq!(session.step(), WizardStep::Review);
    }

    #[test]
    fn test_back_and_forward() {
        let review = uploaded(CSV).proceed_to_review().unwrap();
        let mapping = review.back();
        assert_eq!(mapping.step(), WizardStep::MapColumns);
        let upload = mapping.back();
        assert_eq!(upload.step(), WizardStep::Upload);
        let again = upload.proceed_to_mapping().unwrap();
        assert_eq!(again.step(), WizardStep::MapColumns);
        assert_eq!(again.mapping(), review.mapping());
    }

    #[test]
    fn test_wrong_step_errors() {
        let session = ImportSession::new(ReferenceSet::new());
        assert!(matches!(
            session.set_allow_partial(true),
            Err(ImportError::WrongStep {
                expected: WizardStep::MapColumns,
                actual: WizardStep::Upload
            })
        ));
        assert!(matches!(
            session.submit(&FakeApi::new()),
            Err(ImportError::WrongStep { .. })
        ));
    }

    #[test]
    fn test_new_references_revalidate() {
        let csv = CSV.replace("Operations", "Finance");
        let session = uploaded(&csv).proceed_to_review().unwrap();
        assert!(!session.is_ready_to_submit());

        let refreshed = session.with_references(
            references().with(MasterDataKind::Modules, &["Sales", "Finance"]),
        );
        assert!(refreshed.is_ready_to_submit());
    }
}
