// Remote consultation API client

use crate::record::Consultation;
use reqwest::Url;
use reqwest::blocking::Client;
use std::time::Duration;
use tracing::{debug, info};

/// Failures reported by the remote API
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("failed to fetch consultations: {0}")]
    Fetch(String),
    #[error("failed to delete consultation {id}: {reason}")]
    Delete { id: String, reason: String },
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

/// List and delete operations against the consultation service
pub trait ConsultationApi {
    fn list(&self) -> Result<Vec<Consultation>, ApiError>;

    fn delete(&self, id: &str) -> Result<(), ApiError>;
}

/// Blocking HTTP client for the consultation endpoint
#[derive(Debug, Clone)]
pub struct HttpApi {
    endpoint: Url,
    client: Client,
}

impl HttpApi {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, ApiError> {
        let endpoint = Url::parse(endpoint).map_err(|e| ApiError::InvalidEndpoint(format!("{}: {}", endpoint, e)))?;
        if endpoint.cannot_be_a_base() {
            return Err(ApiError::InvalidEndpoint(endpoint.to_string()));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Client(e.to_string()))?;

        Ok(Self { endpoint, client })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// `{endpoint}/{id}` with `id` encoded as a single path segment
    pub fn record_url(&self, id: &str) -> Result<Url, ApiError> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidEndpoint(self.endpoint.to_string()))?
            .pop_if_empty()
            .push(id);
        Ok(url)
    }
}

impl ConsultationApi for HttpApi {
    fn list(&self) -> Result<Vec<Consultation>, ApiError> {
        debug!(url = %self.endpoint, "Fetching consultations");

        let response = self
            .client
            .get(self.endpoint.clone())
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| ApiError::Fetch(e.to_string()))?;

        let records: Vec<Consultation> = response.json().map_err(|e| ApiError::Fetch(e.to_string()))?;

        info!(count = records.len(), "Fetched consultations");
        Ok(records)
    }

    fn delete(&self, id: &str) -> Result<(), ApiError> {
        let url = self.record_url(id)?;
        debug!(url = %url, "Deleting consultation");

        self.client
            .delete(url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| ApiError::Delete {
                id: id.to_string(),
                reason: e.to_string(),
            })?;

        info!(id, "Deleted consultation");
        Ok(())
    }
}
