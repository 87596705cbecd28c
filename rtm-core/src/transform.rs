//! Row transformer
//!
//! Converts one mapped row into the payload accepted by the requirements
//! create/bulk-create API. Master-data references are passed through by
//! name for server-side resolution.

use serde::{Deserialize, Serialize};

use crate::decode::RawRow;
use crate::fields::TargetField;
use crate::mapping::ColumnMapping;

/// Phase given to requirements whose file has no phase column
pub const DEFAULT_PHASE: &str = "Phase 1";

/// A foreign-key slot in the payload
///
/// Serialized untagged: an id as a JSON number, a pending name as a JSON
/// string the server resolves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityRef {
    Id(i64),
    Name(String),
}

impl Default for EntityRef {
    fn default() -> Self {
        EntityRef::Id(0)
    }
}

impl EntityRef {
    /// Name awaiting resolution, if any
    pub fn pending_name(&self) -> Option<&str> {
        match self {
            EntityRef::Name(name) => Some(name),
            EntityRef::Id(_) => None,
        }
    }
}

/// Canonical requirement creation payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformedRequirement {
    pub title: String,
    pub description: String,
    pub module_id: EntityRef,
    pub submodule_id: EntityRef,
    pub function_id: EntityRef,
    pub priority_id: EntityRef,
    pub status_id: EntityRef,
    pub fitgap_id: EntityRef,
    pub department_id: EntityRef,
    pub department_name: Option<String>,
    pub functional_area_id: EntityRef,
    pub functional_area_name: Option<String>,
    pub consultant: String,
    pub client_owner: String,
    pub phase: String,
    pub option_id: EntityRef,
    pub option_1: String,
    pub option_1_time: Option<f64>,
    pub option_2: String,
    pub option_2_time: Option<f64>,
    pub option_3: String,
    pub option_3_time: Option<f64>,
    pub workshop_name: String,
    pub comments: String,
    pub in_scope: bool,
    pub requires_customization: bool,
    pub needs_review: bool,
}

impl Default for TransformedRequirement {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            module_id: EntityRef::default(),
            submodule_id: EntityRef::default(),
            function_id: EntityRef::default(),
            priority_id: EntityRef::default(),
            status_id: EntityRef::default(),
            fitgap_id: EntityRef::default(),
            department_id: EntityRef::default(),
            department_name: None,
            functional_area_id: EntityRef::default(),
            functional_area_name: None,
            consultant: String::new(),
            client_owner: String::new(),
            phase: DEFAULT_PHASE.to_string(),
            option_id: EntityRef::default(),
            option_1: String::new(),
            option_1_time: None,
            option_2: String::new(),
            option_2_time: None,
            option_3: String::new(),
            option_3_time: None,
            workshop_name: String::new(),
            comments: String::new(),
            in_scope: true,
            requires_customization: false,
            needs_review: false,
        }
    }
}

/// `true`, `yes` and `1` (any case) are true; anything else is false
pub fn parse_bool(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "true" | "yes" | "1")
}

/// Float estimate, or None when empty or not a number
pub fn parse_estimate(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Session-level review flag: relaxed mode left a required field unmapped
pub fn needs_review(mapping: &ColumnMapping, allow_partial: bool) -> bool {
    allow_partial && (!mapping.unmapped_core().is_empty() || !mapping.unmapped_domain().is_empty())
}

/// Build the payload for one row
pub fn transform_row(
    row: &RawRow,
    mapping: &ColumnMapping,
    needs_review: bool,
) -> TransformedRequirement {
    let mut req = TransformedRequirement {
        needs_review,
        ..Default::default()
    };

    for (header, field) in mapping.mapped() {
        if let Some(value) = row.get(header) {
            apply(&mut req, field, value);
        }
    }

    req
}

/// Transform every row with the same mapping and review flag
pub fn transform_rows(
    rows: &[RawRow],
    mapping: &ColumnMapping,
    allow_partial: bool,
) -> Vec<TransformedRequirement> {
    let review = needs_review(mapping, allow_partial);
    rows.iter()
        .map(|row| transform_row(row, mapping, review))
        .collect()
}

fn apply(req: &mut TransformedRequirement, field: TargetField, value: &str) {
    // an empty reference stays unresolved (id 0); every other field takes
    // the cell as-is
    let name = |current: &EntityRef| {
        if value.is_empty() {
            current.clone()
        } else {
            EntityRef::Name(value.to_string())
        }
    };

    match field {
        TargetField::Title => req.title = value.to_string(),
        TargetField::Description => req.description = value.to_string(),
        TargetField::Module => req.module_id = name(&req.module_id),
        TargetField::Submodule => req.submodule_id = name(&req.submodule_id),
        TargetField::Function => req.function_id = name(&req.function_id),
        TargetField::Priority => req.priority_id = name(&req.priority_id),
        TargetField::Status => req.status_id = name(&req.status_id),
        TargetField::FitGap => req.fitgap_id = name(&req.fitgap_id),
        TargetField::Department => {
            if !value.is_empty() {
                req.department_name = Some(value.to_string());
            }
            req.department_id = name(&req.department_id);
        }
        TargetField::FunctionalArea => {
            if !value.is_empty() {
                req.functional_area_name = Some(value.to_string());
            }
            req.functional_area_id = name(&req.functional_area_id);
        }
        TargetField::Consultant => req.consultant = value.to_string(),
        TargetField::ClientOwner => req.client_owner = value.to_string(),
        TargetField::Phase => req.phase = value.to_string(),
        TargetField::Option1 => req.option_1 = value.to_string(),
        TargetField::Option1Time => req.option_1_time = parse_estimate(value),
        TargetField::Option2 => req.option_2 = value.to_string(),
        TargetField::Option2Time => req.option_2_time = parse_estimate(value),
        TargetField::Option3 => req.option_3 = value.to_string(),
        TargetField::Option3Time => req.option_3_time = parse_estimate(value),
        TargetField::WorkshopName => req.workshop_name = value.to_string(),
        TargetField::Comments => req.comments = value.to_string(),
        TargetField::InScope => req.in_scope = parse_bool(value),
        TargetField::RequiresCustomization => req.requires_customization = parse_bool(value),
        TargetField::SolutionOption => req.option_id = name(&req.option_id),
        TargetField::SolutionDescription => req.comments = value.to_string(),
    }
}
