//! Target field catalog
//!
//! The closed set of canonical requirement fields an imported column can be
//! mapped onto, partitioned into the tiers that drive validation severity.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Validation tier of a target field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldTier {
    /// Gates the import in strict mode
    CoreRequired,
    /// Required in spirit, only enforced when the column is mapped
    DomainRequired,
    /// Never validated for presence
    Optional,
}

impl fmt::Display for FieldTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldTier::CoreRequired => write!(f, "Core required"),
            FieldTier::DomainRequired => write!(f, "Domain required"),
            FieldTier::Optional => write!(f, "Optional"),
        }
    }
}

/// A canonical requirement field that a column can be mapped onto
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetField {
    Title,
    Description,
    Module,
    Submodule,
    Function,
    Priority,
    Status,
    #[serde(rename = "fitgap")]
    FitGap,
    Department,
    FunctionalArea,
    Consultant,
    ClientOwner,
    Phase,
    #[serde(rename = "option_1")]
    Option1,
    #[serde(rename = "option_1_time")]
    Option1Time,
    #[serde(rename = "option_2")]
    Option2,
    #[serde(rename = "option_2_time")]
    Option2Time,
    #[serde(rename = "option_3")]
    Option3,
    #[serde(rename = "option_3_time")]
    Option3Time,
    WorkshopName,
    Comments,
    InScope,
    RequiresCustomization,
    /// Legacy column, redirected onto `option_id`
    SolutionOption,
    /// Legacy column, redirected onto `comments`
    SolutionDescription,
}

/// Core-required fields in catalog order
pub const CORE_REQUIRED: [TargetField; 8] = [
    TargetField::Title,
    TargetField::Description,
    TargetField::Module,
    TargetField::Submodule,
    TargetField::Function,
    TargetField::Priority,
    TargetField::Status,
    TargetField::FitGap,
];

/// Domain-required fields in catalog order
pub const DOMAIN_REQUIRED: [TargetField; 4] = [
    TargetField::Department,
    TargetField::FunctionalArea,
    TargetField::Consultant,
    TargetField::ClientOwner,
];

impl TargetField {
    /// Every field in catalog order (also the template column order)
    pub fn all() -> &'static [TargetField] {
        &[
            TargetField::Title,
            TargetField::Description,
            TargetField::Module,
            TargetField::Submodule,
            TargetField::Function,
            TargetField::Priority,
            TargetField::Status,
            TargetField::FitGap,
            TargetField::Department,
            TargetField::FunctionalArea,
            TargetField::Consultant,
            TargetField::ClientOwner,
            TargetField::Phase,
            TargetField::Option1,
            TargetField::Option1Time,
            TargetField::Option2,
            TargetField::Option2Time,
            TargetField::Option3,
            TargetField::Option3Time,
            TargetField::WorkshopName,
            TargetField::Comments,
            TargetField::InScope,
            TargetField::RequiresCustomization,
            TargetField::SolutionOption,
            TargetField::SolutionDescription,
        ]
    }

    /// Stable identifier used in templates, error messages and histograms
    pub fn id(&self) -> &'static str {
        match self {
            TargetField::Title => "title",
            TargetField::Description => "description",
            TargetField::Module => "module",
            TargetField::Submodule => "submodule",
            TargetField::Function => "function",
            TargetField::Priority => "priority",
            TargetField::Status => "status",
            TargetField::FitGap => "fitgap",
            TargetField::Department => "department",
            TargetField::FunctionalArea => "functional_area",
            TargetField::Consultant => "consultant",
            TargetField::ClientOwner => "client_owner",
            TargetField::Phase => "phase",
            TargetField::Option1 => "option_1",
            TargetField::Option1Time => "option_1_time",
            TargetField::Option2 => "option_2",
            TargetField::Option2Time => "option_2_time",
            TargetField::Option3 => "option_3",
            TargetField::Option3Time => "option_3_time",
            TargetField::WorkshopName => "workshop_name",
            TargetField::Comments => "comments",
            TargetField::InScope => "in_scope",
            TargetField::RequiresCustomization => "requires_customization",
            TargetField::SolutionOption => "solution_option",
            TargetField::SolutionDescription => "solution_description",
        }
    }

    /// Display label for prompts and tables
    pub fn label(&self) -> &'static str {
        match self {
            TargetField::Title => "Title",
            TargetField::Description => "Description",
            TargetField::Module => "Module",
            TargetField::Submodule => "Sub-module",
            TargetField::Function => "Function",
            TargetField::Priority => "Priority",
            TargetField::Status => "Status",
            TargetField::FitGap => "Fit/Gap",
            TargetField::Department => "Department",
            TargetField::FunctionalArea => "Functional Area",
            TargetField::Consultant => "Consultant",
            TargetField::ClientOwner => "Client Owner",
            TargetField::Phase => "Phase",
            TargetField::Option1 => "Solution Option 1",
            TargetField::Option1Time => "Option 1 Time Estimate",
            TargetField::Option2 => "Solution Option 2",
            TargetField::Option2Time => "Option 2 Time Estimate",
            TargetField::Option3 => "Solution Option 3",
            TargetField::Option3Time => "Option 3 Time Estimate",
            TargetField::WorkshopName => "Workshop Name",
            TargetField::Comments => "Comments",
            TargetField::InScope => "In Scope",
            TargetField::RequiresCustomization => "Requires Customization",
            TargetField::SolutionOption => "Solution Option (legacy)",
            TargetField::SolutionDescription => "Solution Description (legacy)",
        }
    }

    pub fn tier(&self) -> FieldTier {
        if CORE_REQUIRED.contains(self) {
            FieldTier::CoreRequired
        } else if DOMAIN_REQUIRED.contains(self) {
            FieldTier::DomainRequired
        } else {
            FieldTier::Optional
        }
    }

    pub fn is_core_required(&self) -> bool {
        self.tier() == FieldTier::CoreRequired
    }

    pub fn is_domain_required(&self) -> bool {
        self.tier() == FieldTier::DomainRequired
    }

    /// Fields whose value is a master-data name (template sample rows use
    /// the first reference entry for these)
    pub fn is_categorical(&self) -> bool {
        matches!(
            self,
            TargetField::Module
                | TargetField::Submodule
                | TargetField::Function
                | TargetField::Priority
                | TargetField::Status
                | TargetField::FitGap
                | TargetField::Department
                | TargetField::FunctionalArea
        )
    }

    /// Look up a field by id or label, ignoring case
    pub fn from_id(s: &str) -> Option<Self> {
        let needle = s.trim();
        TargetField::all().iter().copied().find(|f| {
            f.id().eq_ignore_ascii_case(needle) || f.label().eq_ignore_ascii_case(needle)
        })
    }
}

impl fmt::Display for TargetField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl FromStr for TargetField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TargetField::from_id(s).ok_or_else(|| format!("Unknown target field: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tiers_partition_catalog() {
        let core = TargetField::all().iter().filter(|f| f.is_core_required()).count();
        let domain = TargetField::all().iter().filter(|f| f.is_domain_required()).count();
        assert_eq!(core, 8);
        assert_eq!(domain, 4);
        assert_eq!(TargetField::all().len(), 25);
        assert_eq!(TargetField::Phase.tier(), FieldTier::Optional);
    }

    #[test]
    fn test_id_serde_agree() {
        for field in TargetField::all() {
            let json = serde_json::to_string(field).unwrap();
            assert_eq!(json, format!("\"{}\"", field.id()));
        }
    }

    #[test]
    fn test_from_str_accepts_id_and_label() {
        assert_eq!("fitgap".parse::<TargetField>(), Ok(TargetField::FitGap));
        assert_eq!("Functional Area".parse::<TargetField>(), Ok(TargetField::FunctionalArea));
        assert_eq!("CLIENT_OWNER".parse::<TargetField>(), Ok(TargetField::ClientOwner));
        assert!("nonsense".parse::<TargetField>().is_err());
    }
}
