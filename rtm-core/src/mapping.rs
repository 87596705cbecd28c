//! Column mapping and editor state
//!
//! A [`ColumnMapping`] keeps one entry per uploaded header, in header order.
//! Assigning a field that another header already claims is allowed, but both
//! headers are then reported as conflicting until the user resolves it;
//! nothing is unmapped behind the user's back.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::fields::{TargetField, CORE_REQUIRED, DOMAIN_REQUIRED};

/// A single header's mapping
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingEntry {
    pub header: String,
    /// None means the column is ignored
    pub field: Option<TargetField>,
}

/// Header -> target field mapping, in header order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    entries: Vec<MappingEntry>,
}

impl ColumnMapping {
    /// A mapping with every header ignored
    pub fn unmapped(headers: &[String]) -> Self {
        Self::from_pairs(headers.iter().map(|h| (h.clone(), None)))
    }

    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, Option<TargetField>)>) -> Self {
        Self {
            entries: pairs
                .into_iter()
                .map(|(header, field)| MappingEntry { header, field })
                .collect(),
        }
    }

    pub fn entries(&self) -> &[MappingEntry] {
        &self.entries
    }

    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.header.as_str())
    }

    /// Mapped (header, field) pairs in header order
    pub fn mapped(&self) -> impl Iterator<Item = (&str, TargetField)> {
        self.entries
            .iter()
            .filter_map(|e| e.field.map(|f| (e.header.as_str(), f)))
    }

    pub fn contains_header(&self, header: &str) -> bool {
        self.entries.iter().any(|e| e.header == header)
    }

    /// Field currently assigned to `header`
    pub fn get(&self, header: &str) -> Option<TargetField> {
        self.entries
            .iter()
            .find(|e| e.header == header)
            .and_then(|e| e.field)
    }

    /// Assign (or clear, with None) the field for `header`
    ///
    /// Returns false if the header is not part of this mapping. Other headers
    /// already mapped to the same field keep their mapping and become
    /// conflicting.
    pub fn set(&mut self, header: &str, field: Option<TargetField>) -> bool {
        match self.entries.iter_mut().find(|e| e.header == header) {
            Some(entry) => {
                entry.field = field;
                true
            }
            None => false,
        }
    }

    /// First header mapped to `field`
    pub fn header_for(&self, field: TargetField) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.field == Some(field))
            .map(|e| e.header.as_str())
    }

    pub fn is_mapped(&self, field: TargetField) -> bool {
        self.header_for(field).is_some()
    }

    /// Fields claimed by more than one header, in catalog order
    pub fn conflicts(&self) -> Vec<TargetField> {
        let mut counts: BTreeMap<TargetField, usize> = BTreeMap::new();
        for (_, field) in self.mapped() {
            *counts.entry(field).or_default() += 1;
        }
        counts
            .into_iter()
            .filter(|(_, n)| *n > 1)
            .map(|(f, _)| f)
            .collect()
    }

    /// True when `header` shares its field with another header
    pub fn is_conflicted(&self, header: &str) -> bool {
        match self.get(header) {
            Some(field) => self.mapped().filter(|(_, f)| *f == field).count() > 1,
            None => false,
        }
    }

    /// Fields an editor should offer for `header`: the header's own field
    /// plus every field no other header has claimed
    pub fn available_fields(&self, header: &str) -> Vec<TargetField> {
        TargetField::all()
            .iter()
            .copied()
            .filter(|f| {
                !self
                    .mapped()
                    .any(|(h, claimed)| claimed == *f && h != header)
            })
            .collect()
    }

    /// Core-required fields no header maps to
    pub fn unmapped_core(&self) -> Vec<TargetField> {
        CORE_REQUIRED
            .iter()
            .copied()
            .filter(|f| !self.is_mapped(*f))
            .collect()
    }

    /// Domain-required fields no header maps to
    pub fn unmapped_domain(&self) -> Vec<TargetField> {
        DOMAIN_REQUIRED
            .iter()
            .copied()
            .filter(|f| !self.is_mapped(*f))
            .collect()
    }
}
