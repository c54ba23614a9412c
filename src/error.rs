// src/error.rs
//! Error types for configuration, credential lifecycle and API calls.
//!
//! Every error here is reported to the operator and absorbed by the caller.
//! The only one that stops the process is [`ConfigError::Missing`], which
//! asks the operator to fill in the freshly written template.

use crate::models::resources::ApiErrorEntry;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading or writing the configuration record.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No record on disk. A default template has been written in its place.
    #[error("configuration not found at {path}; a template was created, fill it in and re-run")]
    Missing { path: PathBuf },

    #[error("failed to read configuration: {0}")]
    Read(#[from] config::ConfigError),

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("failed to write configuration {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised by the credential lifecycle manager.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// The signing key id could not be derived from the current credential.
    #[error("signing key id is unknown; cannot mint a new credential")]
    MissingKeyIdentifier,

    /// No private key material is available at the configured path.
    #[error("private key not found: {path}")]
    MissingPrivateKey { path: PathBuf },

    /// Reading the key file or signing failed. The previous credential is kept.
    #[error("credential generation failed: {0}")]
    Generation(String),

    /// The credential could not be decoded. Treated as stale by callers.
    #[error("malformed credential: {0}")]
    MalformedCredential(String),
}

/// Errors raised by the authenticated request executor and the collaborator
/// clients built on reqwest.
#[derive(Debug, Error)]
pub enum ClientError {
    /// No credential could be obtained; no request was sent.
    #[error("no valid credential available")]
    NoCredentialAvailable,

    #[error(transparent)]
    Credential(#[from] CredentialError),

    /// Structured error reported by the remote API.
    #[error("API returned {status} with {} error(s)", .errors.len())]
    Api {
        status: u16,
        errors: Vec<ApiErrorEntry>,
    },

    /// Connection, timeout or DNS failure.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// A success response whose body could not be interpreted.
    #[error("unexpected response body: {0}")]
    Decode(String),

    /// A required configuration value is empty.
    #[error("missing configuration value: {0}")]
    MissingSetting(&'static str),
}

