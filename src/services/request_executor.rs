// src/services/request_executor.rs
//! Authenticated Request Executor
//!
//! Every call to App Store Connect goes through [`ApiClient::execute`], which
//! obtains a valid credential from the [`CredentialManager`] first, attaches
//! it as a bearer token and classifies the response. Calls are issued one at
//! a time and never retried; the caller decides what to do with a failure.

use crate::error::ClientError;
use crate::models::resources::{ApiErrorEntry, ErrorDocument};
use crate::services::credential_manager::CredentialManager;
use crate::storage::config_store::ConfigStore;
use chrono::Utc;
use log::{debug, error, warn};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde_json::Value;

/// App Store Connect API origin.
pub const DEFAULT_API_BASE: &str = "https://api.appstoreconnect.apple.com/v1";

/// Methods the API surface needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Delete,
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Successful response payload.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
    /// 204, or a success status with an empty body.
    NoContent,
    Json(Value),
}

impl ApiResponse {
    /// The JSON document, or `None` for an empty response.
    pub fn into_json(self) -> Option<Value> {
        match self {
            ApiResponse::NoContent => None,
            ApiResponse::Json(value) => Some(value),
        }
    }
}

/// Logs each error entry and, for entries whose detail carries the region
/// restriction marker, a hint about regional availability. Returns the
/// number of hints emitted.
pub fn report_api_errors(errors: &[ApiErrorEntry]) -> usize {
    let mut hints = 0;
    for entry in errors {
        error!("API error: {}", entry.title.as_deref().unwrap_or("Unknown error"));
        error!("  detail: {}", entry.detail.as_deref().unwrap_or("No details"));
        error!("  code: {}", entry.code.as_deref().unwrap_or("No code"));

        if entry.is_region_restricted() {
            warn!("Alternative distribution is not available in your region (currently EU only)");
            hints += 1;
        }
    }
    hints
}

/// App Store Connect client gated on a valid credential.
pub struct ApiClient<S: ConfigStore> {
    http: reqwest::Client,
    base_url: String,
    credentials: CredentialManager<S>,
    region_hints: usize,
}

impl<S: ConfigStore> ApiClient<S> {
    /// Creates a client sending every request to `base_url` with the
    /// credentials held by `credentials`.
    ///
    /// # Arguments
    /// * `credentials` - Lifecycle manager owning the credential
    /// * `base_url` - API origin; a trailing `/` is ignored
    pub fn new(credentials: CredentialManager<S>, base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials,
            region_hints: 0,
        }
    }

    /// The credential lifecycle manager.
    pub fn credentials(&self) -> &CredentialManager<S> {
        &self.credentials
    }

    /// Mutable access to the manager, e.g. to cache a discovered id.
    pub fn credentials_mut(&mut self) -> &mut CredentialManager<S> {
        &mut self.credentials
    }

    /// Region restriction hints emitted by this client so far.
    pub fn region_hints(&self) -> usize {
        self.region_hints
    }

    /// Sends `method path` with the current credential.
    ///
    /// # Arguments
    /// * `path` - Resource path appended to the base URL, e.g. `/apps`
    /// * `body` - JSON body, if any
    /// * `query` - Query parameters, if any
    ///
    /// # Errors
    /// - [`ClientError::NoCredentialAvailable`] when there is no credential;
    ///   nothing is sent
    /// - [`ClientError::Credential`] when regeneration failed
    /// - [`ClientError::Api`] for statuses >= 400
    /// - [`ClientError::Transport`] for connection, timeout or DNS failures
    /// - [`ClientError::Decode`] for a success body that is not JSON
    pub async fn execute(
        &mut self,
        method: HttpMethod,
        path: &str,
        body: Option<&Value>,
        query: Option<&[(&str, &str)]>,
    ) -> Result<ApiResponse, ClientError> {
        let credential = self
            .credentials
            .get_valid_credential(Utc::now())?
            .ok_or_else(|| {
                error!("No valid credential available");
                ClientError::NoCredentialAvailable
            })?;

        let url = format!("{}{}", self.base_url, path);
        debug!("{:?} {}", method, url);

        let mut request = self
            .http
            .request(method.into(), &url)
            .header(AUTHORIZATION, format!("Bearer {}", credential))
            .header(CONTENT_TYPE, "application/json");
        if let Some(query) = query {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            error!("Request error: {}", e);
            ClientError::Transport(e)
        })?;

        let status = response.status();
        if status == StatusCode::NO_CONTENT {
            return Ok(ApiResponse::NoContent);
        }

        let bytes = response.bytes().await.map_err(|e| {
            error!("Request error: {}", e);
            ClientError::Transport(e)
        })?;

        if status.as_u16() >= 400 {
            let document: ErrorDocument = serde_json::from_slice(&bytes).unwrap_or_default();
            if document.errors.is_empty() {
                error!("API returned {} without error details", status);
            }
            self.region_hints += report_api_errors(&document.errors);
            return Err(ClientError::Api {
                status: status.as_u16(),
                errors: document.errors,
            });
        }

        if bytes.is_empty() {
            return Ok(ApiResponse::NoContent);
        }
        serde_json::from_slice(&bytes)
            .map(ApiResponse::Json)
            .map_err(|e| ClientError::Decode(e.to_string()))
    }
}
