//! Requirements API integration
//!
//! Reads master-data lists and submits bulk creates to the external
//! requirements service. The [`RequirementsApi`] trait is the seam between
//! the import pipeline and the network.

pub mod client;
pub mod responses;

#[cfg(test)]
pub mod testing;

pub use client::{HttpApiClient, RequirementsApi};
pub use responses::{
    BulkCreateRequest, BulkCreateResponse, RowFailure, SubmissionOutcome,
};
