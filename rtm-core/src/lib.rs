pub mod api;
pub mod config;
pub mod decode;
pub mod error;
pub mod export;
pub mod fields;
pub mod infer;
pub mod mapping;
pub mod reference;
pub mod session;
pub mod template;
pub mod transform;
pub mod validate;

// Re-export commonly used types
pub use api::{
    BulkCreateResponse, HttpApiClient, RequirementsApi, RowFailure, SubmissionOutcome,
};
pub use config::{get_config_path, ApiConfig, ImportConfig, ImportDefaults};
pub use decode::{decode_file, DecodedFile, FileKind, RawRow};
pub use error::{ApiError, ImportError};
pub use export::ValidationReport;
pub use fields::{FieldTier, TargetField, CORE_REQUIRED, DOMAIN_REQUIRED};
pub use infer::{infer_field, infer_mapping};
pub use mapping::{ColumnMapping, MappingEntry};
pub use reference::{load_reference_sets, MasterDataKind, MasterDataRecord, ReferenceSet};
pub use session::{ImportSession, WizardStep};
pub use template::{generate_template, write_template, TemplateFormat};
pub use transform::{EntityRef, TransformedRequirement, DEFAULT_PHASE};
pub use validate::{RowIssue, ValidationResult};
