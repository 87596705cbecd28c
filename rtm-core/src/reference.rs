//! Master-data reference sets
//!
//! Name lists used for case-insensitive existence checks during validation
//! and for template sample rows. Lists are loaded independently; one that
//! failed to load is simply absent and its check is skipped.

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::api::RequirementsApi;
use crate::fields::TargetField;

/// The master-data entities the import pipeline reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MasterDataKind {
    Modules,
    Submodules,
    Functions,
    Priorities,
    Statuses,
    FitGaps,
    Departments,
    FunctionalAreas,
}

impl MasterDataKind {
    pub fn all() -> &'static [MasterDataKind] {
        &[
            MasterDataKind::Modules,
            MasterDataKind::Submodules,
            MasterDataKind::Functions,
            MasterDataKind::Priorities,
            MasterDataKind::Statuses,
            MasterDataKind::FitGaps,
            MasterDataKind::Departments,
            MasterDataKind::FunctionalAreas,
        ]
    }

    /// Path of the list endpoint, relative to the API base URL
    pub fn endpoint(&self) -> &'static str {
        match self {
            MasterDataKind::Modules => "modules",
            MasterDataKind::Submodules => "submodules",
            MasterDataKind::Functions => "functions",
            MasterDataKind::Priorities => "priorities",
            MasterDataKind::Statuses => "statuses",
            MasterDataKind::FitGaps => "fitgaps",
            MasterDataKind::Departments => "departments",
            MasterDataKind::FunctionalAreas => "functional-areas",
        }
    }

    /// The list whose names are valid values for `field`
    pub fn for_field(field: TargetField) -> Option<Self> {
        match field {
            TargetField::Module => Some(MasterDataKind::Modules),
            TargetField::Submodule => Some(MasterDataKind::Submodules),
            TargetField::Function => Some(MasterDataKind::Functions),
            TargetField::Priority => Some(MasterDataKind::Priorities),
            TargetField::Status => Some(MasterDataKind::Statuses),
            TargetField::FitGap => Some(MasterDataKind::FitGaps),
            TargetField::Department => Some(MasterDataKind::Departments),
            TargetField::FunctionalArea => Some(MasterDataKind::FunctionalAreas),
            _ => None,
        }
    }
}

impl fmt::Display for MasterDataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MasterDataKind::Modules => write!(f, "Modules"),
            MasterDataKind::Submodules => write!(f, "Sub-modules"),
            MasterDataKind::Functions => write!(f, "Functions"),
            MasterDataKind::Priorities => write!(f, "Priorities"),
            MasterDataKind::Statuses => write!(f, "Statuses"),
            MasterDataKind::FitGaps => write!(f, "Fit/Gap"),
            MasterDataKind::Departments => write!(f, "Departments"),
            MasterDataKind::FunctionalAreas => write!(f, "Functional Areas"),
        }
    }
}

/// One record of a master-data list endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MasterDataRecord {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Valid entity names per master-data kind
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceSet {
    lists: BTreeMap<MasterDataKind, Vec<String>>,
}

impl ReferenceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, handy for fixtures
    pub fn with(mut self, kind: MasterDataKind, names: &[&str]) -> Self {
        self.insert(kind, names.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn insert(&mut self, kind: MasterDataKind, names: Vec<String>) {
        self.lists.insert(kind, names);
    }

    /// Names for `kind`, or None if that list was never loaded
    pub fn names(&self, kind: MasterDataKind) -> Option<&[String]> {
        self.lists.get(&kind).map(|v| v.as_slice())
    }

    pub fn is_loaded(&self, kind: MasterDataKind) -> bool {
        self.lists.contains_key(&kind)
    }

    /// First name of a loaded, non-empty list
    pub fn first(&self, kind: MasterDataKind) -> Option<&str> {
        self.names(kind)
            .and_then(|names| names.first())
            .map(|s| s.as_str())
    }

    /// Case-insensitive existence check. Returns None when the list is not
    /// loaded, so callers can skip the check.
    pub fn contains(&self, kind: MasterDataKind, value: &str) -> Option<bool> {
        let value = value.trim().to_lowercase();
        self.names(kind)
            .map(|names| names.iter().any(|n| n.trim().to_lowercase() == value))
    }

    pub fn loaded_kinds(&self) -> impl Iterator<Item = MasterDataKind> + '_ {
        self.lists.keys().copied()
    }
}

/// Fetch every master-data list concurrently and collect what succeeded
///
/// A failing list is logged and left out of the set; the import degrades to
/// skipping that referential check instead of aborting.
pub fn load_reference_sets(api: &dyn RequirementsApi) -> ReferenceSet {
    let results: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = MasterDataKind::all()
            .iter()
            .map(|kind| (*kind, scope.spawn(move || api.list_master_data(*kind))))
            .collect();

        handles
            .into_iter()
            .map(|(kind, handle)| (kind, handle.join()))
            .collect()
    });

    let mut set = ReferenceSet::new();
    for (kind, result) in results {
        match result {
            Ok(Ok(records)) => {
                debug!("Loaded {} {}", records.len(), kind);
                set.insert(kind, records.into_iter().map(|r| r.name).collect());
            }
            Ok(Err(e)) => warn!("Could not load {}: {}", kind, e),
            Err(_) => warn!("Loader for {} panicked", kind),
        }
    }
    set
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::FakeApi;

    #[test]
    fn test_contains_is_case_insensitive() {
        let refs = ReferenceSet::new().with(MasterDataKind::Modules, &["Sales", "Operations"]);
        assert_eq!(refs.contains(MasterDataKind::Modules, "sales"), Some(true));
        assert_eq!(refs.contains(MasterDataKind::Modules, " OPERATIONS "), Some(true));
        assert_eq!(refs.contains(MasterDataKind::Modules, "Finance"), Some(false));
        assert_eq!(refs.contains(MasterDataKind::Departments, "IT"), None);
    }

    #[test]
    fn test_first() {
        let refs = ReferenceSet::new()
            .with(MasterDataKind::Priorities, &["High", "Low"])
            .with(MasterDataKind::Statuses, &[]);
        assert_eq!(refs.first(MasterDataKind::Priorities), Some("High"));
        assert_eq!(refs.first(MasterDataKind::Statuses), None);
        assert_eq!(refs.first(MasterDataKind::Modules), None);
    }

    #[test]
    fn test_loader_degrades_on_single_failure() {
        let api = FakeApi::new()
            .with_master_data(MasterDataKind::Modules, &["Sales"])
            .with_master_data(MasterDataKind::Departments, &["IT", "HR"])
            .failing(MasterDataKind::Submodules);

        let refs = load_reference_sets(&api);

        assert_eq!(refs.first(MasterDataKind::Modules), Some("Sales"));
        assert_eq!(refs.names(MasterDataKind::Departments).unwrap().len(), 2);
        assert!(!refs.is_loaded(MasterDataKind::Submodules));
        // lists the fake has no data for still load, empty
        assert_eq!(refs.names(MasterDataKind::Statuses).unwrap().len(), 0);
    }

    #[test]
    fn test_field_kind_lookup() {
        assert_eq!(
            MasterDataKind::for_field(TargetField::FunctionalArea),
            Some(MasterDataKind::FunctionalAreas)
        );
        assert_eq!(MasterDataKind::for_field(TargetField::Title), None);
        assert_eq!(MasterDataKind::FunctionalAreas.endpoint(), "functional-areas");
    }
}
