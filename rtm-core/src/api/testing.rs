//! In-memory [`RequirementsApi`] for tests

use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

use crate::api::client::RequirementsApi;
use crate::api::responses::{BulkCreateResponse, RowFailure};
use crate::error::ApiError;
use crate::reference::{MasterDataKind, MasterDataRecord};
use crate::transform::TransformedRequirement;

#[derive(Default)]
pub struct FakeApi {
    master_data: BTreeMap<MasterDataKind, Vec<String>>,
    failing_lists: HashSet<MasterDataKind>,
    /// Row indices the server refuses
    rejected_rows: HashSet<usize>,
    unreachable: bool,
    pub submitted: Mutex<Vec<TransformedRequirement>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_master_data(mut self, kind: MasterDataKind, names: &[&str]) -> Self {
        self.master_data
            .insert(kind, names.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn failing(mut self, kind: MasterDataKind) -> Self {
        self.failing_lists.insert(kind);
        self
    }

    pub fn rejecting_row(mut self, index: usize) -> Self {
        self.rejected_rows.insert(index);
        self
    }

    pub fn unreachable(mut self) -> Self {
        self.unreachable = true;
        self
    }
}

impl RequirementsApi for FakeApi {
    fn list_master_data(&self, kind: MasterDataKind) -> Result<Vec<MasterDataRecord>, ApiError> {
        if self.unreachable || self.failing_lists.contains(&kind) {
            return Err(ApiError::RequestFailed(format!("{} unavailable", kind)));
        }

        Ok(self
            .master_data
            .get(&kind)
            .map(|names| {
                names
                    .iter()
                    .enumerate()
                    .map(|(i, name)| MasterDataRecord {
                        id: i as i64 + 1,
                        name: name.clone(),
                        description: None,
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    fn bulk_create(
        &self,
        requirements: &[TransformedRequirement],
    ) -> Result<BulkCreateResponse, ApiError> {
        if self.unreachable {
            return Err(ApiError::RequestFailed("connection refused".to_string()));
        }

        let mut imported = Vec::new();
        let mut errors = Vec::new();
        for (index, req) in requirements.iter().enumerate() {
            let data = serde_json::to_value(req)
                .map_err(|e| ApiError::InvalidResponse(e.to_string()))?;
            if self.rejected_rows.contains(&index) {
                errors.push(RowFailure {
                    index,
                    data,
                    error: "rejected by server".to_string(),
                });
            } else {
                self.submitted.lock().unwrap().push(req.clone());
                imported.push(data);
            }
        }

        Ok(BulkCreateResponse {
            imported_requirements: imported,
            errors: if errors.is_empty() { None } else { Some(errors) },
        })
    }
}
