//! Mapping inference
//!
//! Proposes a column mapping from header text alone. Each header is
//! normalised (lower-cased, punctuation and spaces dropped) and tested
//! against [`KEYWORD_RULES`] in order; the first rule whose keywords all
//! occur in the header wins. Order matters: compound and more specific rules
//! sit above the generic ones they would otherwise lose to.

use crate::fields::TargetField;
use crate::mapping::ColumnMapping;

/// A header matches when it contains every keyword
#[derive(Debug, Clone, Copy)]
pub struct KeywordRule {
    pub field: TargetField,
    pub all_of: &'static [&'static str],
}

const fn rule(field: TargetField, all_of: &'static [&'static str]) -> KeywordRule {
    KeywordRule { field, all_of }
}

/// Ordered keyword table, first match wins
pub const KEYWORD_RULES: &[KeywordRule] = &[
    // "client" alone also shows up in status and comment headers
    rule(TargetField::ClientOwner, &["client", "owner"]),
    rule(TargetField::Option1Time, &["option1", "time"]),
    rule(TargetField::Option1Time, &["option1", "estimate"]),
    rule(TargetField::Option2Time, &["option2", "time"]),
    rule(TargetField::Option2Time, &["option2", "estimate"]),
    rule(TargetField::Option3Time, &["option3", "time"]),
    rule(TargetField::Option3Time, &["option3", "estimate"]),
    rule(TargetField::Option1, &["option1"]),
    rule(TargetField::Option2, &["option2"]),
    rule(TargetField::Option3, &["option3"]),
    rule(TargetField::SolutionDescription, &["solution", "desc"]),
    rule(TargetField::SolutionOption, &["solution"]),
    rule(TargetField::Title, &["title"]),
    rule(TargetField::Description, &["desc"]),
    rule(TargetField::FunctionalArea, &["functional", "area"]),
    rule(TargetField::Submodule, &["submodule"]),
    rule(TargetField::Module, &["module"]),
    rule(TargetField::Function, &["function"]),
    rule(TargetField::Priority, &["priorit"]),
    rule(TargetField::FitGap, &["fit"]),
    rule(TargetField::FitGap, &["gap"]),
    rule(TargetField::Status, &["status"]),
    rule(TargetField::Department, &["depart"]),
    rule(TargetField::Department, &["dept"]),
    rule(TargetField::Consultant, &["consult"]),
    rule(TargetField::Phase, &["phase"]),
    rule(TargetField::WorkshopName, &["workshop"]),
    rule(TargetField::Comments, &["comment"]),
    rule(TargetField::Comments, &["remark"]),
    rule(TargetField::Comments, &["note"]),
    rule(TargetField::InScope, &["scope"]),
    rule(TargetField::RequiresCustomization, &["customi"]),
];

/// Lower-case and keep only alphanumerics, so "Sub-Module", "sub_module"
/// and "SubModule" all read "submodule"
pub fn normalize_header(header: &str) -> String {
    header
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Best-guess field for a single header
pub fn infer_field(header: &str) -> Option<TargetField> {
    let normalized = normalize_header(header);
    if normalized.is_empty() {
        return None;
    }

    KEYWORD_RULES
        .iter()
        .find(|r| r.all_of.iter().all(|kw| normalized.contains(kw)))
        .map(|r| r.field)
}

/// Seed a mapping for every header
pub fn infer_mapping(headers: &[String]) -> ColumnMapping {
    ColumnMapping::from_pairs(headers.iter().map(|h| (h.clone(), infer_field(h))))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_core_headers_map_one_to_one() {
        let hs = headers(&[
            "Title", "Desc", "Module", "SubModule", "Function", "Priority", "Status", "FitGap",
        ]);
        let mapping = infer_mapping(&hs);

        let expected = [
            TargetField::Title,
            TargetField::Description,
            TargetField::Module,
            TargetField::Submodule,
            TargetField::Function,
            TargetField::Priority,
            TargetField::Status,
            TargetField::FitGap,
        ];
        for (h, f) in hs.iter().zip(expected) {
            assert_eq!(mapping.get(h), Some(f), "header {}", h);
        }
        assert!(mapping.conflicts().is_empty());
        assert!(mapping.unmapped_core().is_empty());
    }

    #[test]
    fn test_every_field_id_maps_to_itself() {
        for field in TargetField::all() {
            assert_eq!(infer_field(field.id()), Some(*field), "id {}", field.id());
        }
    }

    #[test]
    fn test_compound_rules_win_over_generic() {
        assert_eq!(infer_field("Client Owner"), Some(TargetField::ClientOwner));
        assert_eq!(infer_field("Client Status"), Some(TargetField::Status));
        assert_eq!(infer_field("Client Comments"), Some(TargetField::Comments));
        assert_eq!(infer_field("Functional Area"), Some(TargetField::FunctionalArea));
        assert_eq!(infer_field("Sub-Module"), Some(TargetField::Submodule));
        assert_eq!(infer_field("Solution Description"), Some(TargetField::SolutionDescription));
        assert_eq!(infer_field("Option 2 Time (hrs)"), Some(TargetField::Option2Time));
        assert_eq!(infer_field("Solution Option 2"), Some(TargetField::Option2));
        assert_eq!(infer_field("Fit / Gap"), Some(TargetField::FitGap));
        assert_eq!(infer_field("Dept."), Some(TargetField::Department));
    }

    #[test]
    fn test_unmatched_headers_stay_unmapped() {
        assert_eq!(infer_field("Row ID"), None);
        assert_eq!(infer_field(""), None);
        assert_eq!(infer_field("---"), None);
    }

    #[test]
    fn test_inference_is_deterministic() {
        let hs = headers(&["Requirement Title", "Client Owner", "Dept", "Random", "Notes"]);
        assert_eq!(infer_mapping(&hs), infer_mapping(&hs));
    }
}
