//! Requirements API client
//!
//! Blocking HTTP implementation of [`RequirementsApi`].

use log::{debug, info};
use reqwest::blocking::{Client, RequestBuilder, Response};
use std::time::Duration;

use crate::api::responses::{self, BulkCreateRequest, BulkCreateResponse};
use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::reference::{MasterDataKind, MasterDataRecord};
use crate::transform::TransformedRequirement;

/// Operations the import pipeline needs from the requirements service
///
/// Implementations must be shareable across threads: master-data lists are
/// fetched concurrently.
pub trait RequirementsApi: Send + Sync {
    /// Read one master-data list
    fn list_master_data(&self, kind: MasterDataKind) -> Result<Vec<MasterDataRecord>, ApiError>;

    /// Create many requirements in one call
    fn bulk_create(
        &self,
        requirements: &[TransformedRequirement],
    ) -> Result<BulkCreateResponse, ApiError>;
}

/// HTTP client for the requirements service
#[derive(Debug, Clone)]
pub struct HttpApiClient {
    base_url: String,
    token: Option<String>,
    client: Client,
}

impl HttpApiClient {
    /// Create a client for `base_url`, e.g. `https://rtm.example.com/api`
    pub fn new(
        base_url: &str,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(ApiError::NotConfigured);
        }

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url,
            token: token.filter(|t| !t.is_empty()),
            client,
        })
    }

    /// Create a client from the `api` section of the configuration
    pub fn from_config(config: &ApiConfig) -> Result<Self, ApiError> {
        Self::new(
            &config.base_url,
            config.token.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Turn non-2xx responses into [`ApiError::HttpStatus`]
    fn check_status(response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().unwrap_or_default();
        Err(ApiError::HttpStatus {
            status: status.as_u16(),
            body: body.chars().take(500).collect(),
        })
    }
}

impl RequirementsApi for HttpApiClient {
    fn list_master_data(&self, kind: MasterDataKind) -> Result<Vec<MasterDataRecord>, ApiError> {
        let url = self.url(kind.endpoint());
        debug!("GET {}", url);

        let response = self.authorize(self.client.get(&url)).send()?;
        let records = Self::check_status(response)?.json::<Vec<MasterDataRecord>>()?;
        Ok(records)
    }

    fn bulk_create(
        &self,
        requirements: &[TransformedRequirement],
    ) -> Result<BulkCreateResponse, ApiError> {
        let url = self.url("requirements/bulk");
        info!("Submitting {} requirements to {}", requirements.len(), url);

        let response = self
            .authorize(self.client.post(&url))
            .json(&BulkCreateRequest { requirements })
            .send()?;
        let body = Self::check_status(response)?.text()?;
        responses::parse_bulk_create_response(&body)
    }
}
