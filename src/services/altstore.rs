// src/services/altstore.rs
//! AltStore collaborator endpoints.
//!
//! These calls do not use the App Store Connect credential and are sent
//! without authentication. Each is a single POST or GET with no retry:
//! - `POST /register`: registers the developer and may return a credential
//! - `POST /federate`: federates the configured source
//! - `POST /adps`: triggers processing of the alternative distribution package
//! - `GET /adps/{id}`: polls processing status and the download URL

use crate::error::ClientError;
use crate::models::resources::ErrorDocument;
use crate::services::credential_manager::CredentialManager;
use crate::storage::config_store::ConfigStore;
use log::{error, info};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// AltStore API origin.
pub const DEFAULT_ALTSTORE_BASE: &str = "https://api.altstore.io";

#[derive(Serialize, Debug)]
struct RegisterRequest<'a> {
    #[serde(rename = "developerID")]
    developer_id: &'a str,
    email: &'a str,
}

#[derive(Serialize, Debug)]
struct FederateRequest<'a> {
    source: &'a str,
}

#[derive(Serialize, Debug)]
struct ProcessRequest<'a> {
    #[serde(rename = "adpID")]
    adp_id: &'a str,
}

/// Body of a successful registration.
#[derive(Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Registration {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub expiration: Option<Value>,
}

/// Processing state of an alternative distribution package.
#[derive(Deserialize, Debug, Clone, PartialEq, Default)]
pub struct PackageStatus {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(rename = "downloadURL", default)]
    pub download_url: Option<String>,
}

impl PackageStatus {
    /// The package can be downloaded once a URL is published.
    pub fn is_ready(&self) -> bool {
        self.download_url.is_some()
    }
}

/// Client for the AltStore API.
#[derive(Clone)]
pub struct AltStoreClient {
    http: reqwest::Client,
    base_url: String,
}

impl AltStoreClient {
    /// Creates a client for the AltStore API at `base_url`.
    ///
    /// # Arguments
    /// * `base_url` - API origin, e.g. [`DEFAULT_ALTSTORE_BASE`]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Sends the request and returns the body when the status is one of
    /// `accepted`.
    async fn send(&self, request: reqwest::RequestBuilder, accepted: &[StatusCode]) -> Result<String, ClientError> {
        let response = request.send().await.map_err(|e| {
            error!("Request error: {}", e);
            ClientError::Transport(e)
        })?;
        let status = response.status();
        let body = response.text().await?;
        info!("Status: {}", status);

        if accepted.contains(&status) {
            return Ok(body);
        }

        error!("Request rejected with {}: {}", status, body);
        let document: ErrorDocument = serde_json::from_str(&body).unwrap_or_default();
        Err(ClientError::Api {
            status: status.as_u16(),
            errors: document.errors,
        })
    }

    /// Registers the developer from the configuration record. A returned
    /// token replaces the current credential and is persisted.
    ///
    /// # Errors
    /// [`ClientError::MissingSetting`] when `developer_id` or `email` is empty;
    /// otherwise request and decoding errors.
    pub async fn register<S: ConfigStore>(&self, credentials: &mut CredentialManager<S>) -> Result<Registration, ClientError> {
        let config = credentials.config();
        if config.developer_id.is_empty() {
            return Err(ClientError::MissingSetting("developer_id"));
        }
        if config.email.is_empty() {
            return Err(ClientError::MissingSetting("email"));
        }

        let request = self
            .http
            .post(format!("{}/register", self.base_url))
            .json(&RegisterRequest {
                developer_id: &config.developer_id,
                email: &config.email,
            });
        let body = self.send(request, &[StatusCode::OK, StatusCode::CREATED]).await?;
        let registration: Registration =
            serde_json::from_str(&body).map_err(|e| ClientError::Decode(e.to_string()))?;

        if let Some(token) = &registration.token {
            credentials.adopt(token.clone());
            info!("Registered; the security token was saved to the configuration");
            if let Some(expiration) = &registration.expiration {
                info!("Token expires: {}", expiration);
            }
        }
        Ok(registration)
    }

    /// Federates `source_url` with AltStore.
    ///
    /// # Errors
    /// [`ClientError::MissingSetting`] for an empty URL; request errors.
    pub async fn federate(&self, source_url: &str) -> Result<(), ClientError> {
        if source_url.is_empty() {
            return Err(ClientError::MissingSetting("source_url"));
        }
        let request = self
            .http
            .post(format!("{}/federate", self.base_url))
            .json(&FederateRequest { source: source_url });
        let body = self.send(request, &[StatusCode::OK, StatusCode::CREATED, StatusCode::ACCEPTED]).await?;
        info!("Federated: {}", body);
        Ok(())
    }

    /// Triggers processing of the package `adp_id`.
    ///
    /// # Errors
    /// [`ClientError::MissingSetting`] for an empty id; request errors.
    pub async fn trigger_processing(&self, adp_id: Option<&str>) -> Result<(), ClientError> {
        let adp_id = adp_id.ok_or(ClientError::MissingSetting("adp_id"))?;
        let request = self
            .http
            .post(format!("{}/adps", self.base_url))
            .json(&ProcessRequest { adp_id });
        self.send(request, &[StatusCode::OK, StatusCode::CREATED, StatusCode::ACCEPTED]).await?;
        info!("Processing triggered; run `download` to check its status");
        Ok(())
    }

    /// Fetches the processing status of `adp_id`.
    ///
    /// # Errors
    /// [`ClientError::MissingSetting`] for an empty id; request and decoding
    /// errors.
    pub async fn package_status(&self, adp_id: Option<&str>) -> Result<PackageStatus, ClientError> {
        let adp_id = adp_id.ok_or(ClientError::MissingSetting("adp_id"))?;
        let request = self.http.get(format!("{}/adps/{}", self.base_url, adp_id));
        let body = self.send(request, &[StatusCode::OK]).await?;
        let status: PackageStatus =
            serde_json::from_str(&body).map_err(|e| ClientError::Decode(e.to_string()))?;

        if let Some(state) = &status.status {
            info!("ADP status: {}", state);
        }
        match status.download_url.as_deref() {
            Some(url) if status.is_ready() => info!("Download URL: {}", url),
            _ => info!("Still processing; no download URL yet"),
        }
        Ok(status)
    }
}
