// src/services/credential_manager.rs
//! Credential Lifecycle Manager
//!
//! Owns the single credential of the process together with the signing
//! material needed to replace it:
//! - derives the signing key id from the current credential header
//! - checks freshness lazily, at the moment a credential is needed
//! - mints a replacement from the `.p8` private key when the current one is
//!   stale, and persists it immediately
//! - falls back to the stale credential when no key material exists
//!
//! Header and payload are decoded without verifying the signature. No
//! verification key exists locally; the remote API performs the only
//! authenticity check.

use crate::error::{ConfigError, CredentialError};
use crate::models::configuration::Configuration;
use crate::models::credential::{CredentialClaims, CredentialHeader, Freshness};
use crate::storage::config_store::ConfigStore;
use crate::utils::serialization::decode_segment;
use crate::wallet::key_management::SigningIdentity;
use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};

/// Returns the `kid` header field of `credential`, or `None` when the
/// credential is absent, malformed or carries no key id.
///
/// The header is read as plain JSON, so any `alg` value (or none at all)
/// still yields the key id.
pub fn extract_signing_key_id(credential: Option<&str>) -> Option<String> {
    let token = credential.filter(|t| !t.is_empty())?;
    decode_segment::<CredentialHeader>(token, 0)
        .ok()
        .and_then(|header| header.kid)
        .filter(|kid| !kid.is_empty())
}

/// Classifies `credential` at `now` without reporting anything.
pub fn check_freshness(credential: Option<&str>, now: DateTime<Utc>) -> Freshness {
    let token = match credential.filter(|t| !t.is_empty()) {
        Some(token) => token,
        None => return Freshness::Absent,
    };

    match decode_segment::<CredentialClaims>(token, 1) {
        Ok(claims) => Freshness::of(&claims, now),
        Err(reason) => {
            warn!("{}", CredentialError::MalformedCredential(reason));
            Freshness::Unreadable
        }
    }
}

/// Returns `now < expiry` for `credential` and reports the outcome: the
/// remaining validity when fresh, the expiry instant when stale.
pub fn is_fresh(credential: Option<&str>, now: DateTime<Utc>) -> bool {
    let freshness = check_freshness(credential, now);
    match &freshness {
        Freshness::Fresh { remaining } => info!(
            "Credential valid ({}h {}m remaining)",
            remaining.num_hours(),
            remaining.num_minutes() % 60
        ),
        Freshness::Stale { expired_at } => warn!("Credential expired at {}", expired_at),
        Freshness::Unreadable => warn!("Credential could not be read; treating it as expired"),
        Freshness::Absent => error!("No credential configured"),
    }
    freshness.is_fresh()
}

/// Outcome of a regeneration attempt that did not fail outright.
#[derive(Debug)]
pub enum Renewal {
    /// A new credential was minted and persisted.
    Minted(String),
    /// No key material; the current credential (possibly stale) is handed
    /// back unchanged.
    Unavailable {
        fallback: Option<String>,
        reason: CredentialError,
    },
}

/// Explicit context for the credential and the configuration record it is
/// persisted in.
pub struct CredentialManager<S: ConfigStore> {
    config: Configuration,
    key_id: Option<String>,
    private_key_path: Option<PathBuf>,
    store: S,
}

impl<S: ConfigStore> CredentialManager<S> {
    /// Creates a manager over an already loaded record.
    pub fn new(config: Configuration, store: S) -> Self {
        let key_id = extract_signing_key_id(config.security_token.as_deref());
        let private_key_path = config.private_key_path.as_ref().map(PathBuf::from);
        Self {
            config,
            key_id,
            private_key_path,
            store,
        }
    }

    /// Loads the record from `store` and builds a manager over it.
    ///
    /// # Errors
    /// Propagates [`ConfigError::Missing`] and read errors from the store.
    pub fn load(store: S) -> Result<Self, ConfigError> {
        let config = store.load()?;
        Ok(Self::new(config, store))
    }

    /// The configuration record as currently held in memory.
    pub fn config(&self) -> &Configuration {
        &self.config
    }

    /// The current credential, fresh or not.
    pub fn credential(&self) -> Option<&str> {
        self.config.security_token.as_deref()
    }

    /// Signing key id derived from the current credential header.
    pub fn key_id(&self) -> Option<&str> {
        self.key_id.as_deref()
    }

    /// Key file used for minting; `None` once a missing file was detected.
    pub fn private_key_path(&self) -> Option<&Path> {
        self.private_key_path.as_deref()
    }

    /// Startup probe of the key material. A configured key file that does
    /// not exist is reported and forgotten for the rest of the run, leaving
    /// the identity read-only. Returns whether minting is possible.
    pub fn check_key_material(&mut self) -> bool {
        match &self.private_key_path {
            Some(path) if path.exists() => {
                info!("Private key found: {}", path.display());
                true
            }
            Some(path) => {
                warn!(
                    "Private key file not found: {}; new credentials cannot be minted, the existing one will be used",
                    path.display()
                );
                self.private_key_path = None;
                false
            }
            None => false,
        }
    }

    /// Mints a new credential at `now`.
    ///
    /// Preconditions, checked in order:
    /// 1. a private key path is configured
    /// 2. the key file exists (otherwise the path is forgotten)
    /// 3. the signing key id is known
    ///
    /// 1 and 2 yield [`Renewal::Unavailable`] with the current credential.
    /// Nothing is modified unless minting succeeds.
    ///
    /// # Errors
    /// - [`CredentialError::MissingKeyIdentifier`] when 3 fails
    /// - [`CredentialError::Generation`] when reading the key or signing fails
    pub fn regenerate(&mut self, now: DateTime<Utc>) -> Result<Renewal, CredentialError> {
        let path = match &self.private_key_path {
            Some(path) => path.clone(),
            None => {
                warn!("No private key configured; using the existing credential. Set 'private_key_path' in the configuration");
                return Ok(Renewal::Unavailable {
                    fallback: self.config.security_token.clone(),
                    reason: CredentialError::MissingPrivateKey {
                        path: PathBuf::new(),
                    },
                });
            }
        };

        if !path.exists() {
            let reason = CredentialError::MissingPrivateKey { path };
            error!("{}", reason);
            self.private_key_path = None;
            return Ok(Renewal::Unavailable {
                fallback: self.config.security_token.clone(),
                reason,
            });
        }

        let key_id = self.key_id.clone().ok_or_else(|| {
            error!("{}", CredentialError::MissingKeyIdentifier);
            CredentialError::MissingKeyIdentifier
        })?;

        let identity = SigningIdentity::new(&self.config.developer_id, key_id, &path);
        let credential = identity.mint(now).map_err(|e| {
            error!("{}", e);
            e
        })?;

        self.config.security_token = Some(credential.clone());
        if let Err(e) = self.persist() {
            error!("Failed to save the new credential: {}", e);
        }
        info!("Minted a new credential");
        Ok(Renewal::Minted(credential))
    }

    /// The credential to send with a request made at `now`.
    ///
    /// A fresh credential is returned as is, without touching the
    /// filesystem. A stale one is regenerated when possible; without a
    /// private key path the stale credential is returned as a best effort.
    ///
    /// # Errors
    /// Regeneration errors from [`Self::regenerate`].
    pub fn get_valid_credential(&mut self, now: DateTime<Utc>) -> Result<Option<String>, CredentialError> {
        if is_fresh(self.credential(), now) {
            return Ok(self.config.security_token.clone());
        }

        if self.private_key_path.is_none() {
            warn!("Credential is expired; set 'private_key_path' in the configuration to renew it");
            return Ok(self.config.security_token.clone());
        }

        info!("Renewing credential...");
        match self.regenerate(now)? {
            Renewal::Minted(credential) => Ok(Some(credential)),
            Renewal::Unavailable { fallback, reason } => {
                debug!("Falling back to the existing credential: {}", reason);
                Ok(fallback)
            }
        }
    }

    /// Replaces the credential with one issued elsewhere and persists it.
    pub fn adopt(&mut self, credential: String) {
        self.key_id = extract_signing_key_id(Some(&credential));
        self.config.security_token = Some(credential);
        if let Err(e) = self.persist() {
            error!("Failed to save the credential: {}", e);
        }
    }

    /// Caches the alternative distribution package id if none is known yet.
    /// Returns `true` (and persists) only when `id` was newly cached.
    pub fn cache_resource_id(&mut self, id: &str) -> bool {
        if !self.config.adp_id.cache_if_unset(id) {
            return false;
        }
        match self.persist() {
            Ok(()) => info!("Saved ADP id {} to the configuration", id),
            Err(e) => error!("Failed to save ADP id {}: {}", id, e),
        }
        true
    }

    /// Writes the record through the store.
    ///
    /// # Errors
    /// Store write failures.
    pub fn persist(&mut self) -> Result<(), ConfigError> {
        self.store.save(&self.config)
    }
}
