// src/models/configuration.rs
//! The persisted configuration record (`configure.json`).

use crate::utils::serialization::{blank_as_none, null_as_empty};
use serde::{Deserialize, Serialize};

/// Placeholder written into a freshly created template.
pub const DEFAULT_PRIVATE_KEY_PATH: &str = "./ApiKey_XXXXXXXXXX.p8";

/// A resource id learned from the API and remembered permanently.
///
/// Once `Cached`, the value never changes: later discoveries are ignored.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(from = "Option<String>", into = "String")]
pub enum CachedId {
    #[default]
    Unset,
    Cached(String),
}

impl CachedId {
    /// Stores `id` if nothing is cached yet. Returns `true` when the value
    /// was stored, `false` when an earlier id is kept or `id` is empty.
    pub fn cache_if_unset(&mut self, id: &str) -> bool {
        match self {
            CachedId::Unset if !id.is_empty() => {
                *self = CachedId::Cached(id.to_string());
                true
            }
            _ => false,
        }
    }

    /// The cached id, if any.
    pub fn get(&self) -> Option<&str> {
        match self {
            CachedId::Unset => None,
            CachedId::Cached(id) => Some(id),
        }
    }
}

impl From<Option<String>> for CachedId {
    fn from(value: Option<String>) -> Self {
        match value {
            Some(id) if !id.trim().is_empty() => CachedId::Cached(id),
            _ => CachedId::Unset,
        }
    }
}

impl From<CachedId> for String {
    fn from(value: CachedId) -> Self {
        match value {
            CachedId::Unset => String::new(),
            CachedId::Cached(id) => id,
        }
    }
}

/// Operator-maintained settings plus the current credential.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Configuration {
    /// AltStore source feed to federate.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub source_url: String,

    /// App Store Connect issuer id.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub developer_id: String,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub email: String,

    /// Current credential.
    #[serde(default, with = "blank_as_none")]
    pub security_token: Option<String>,

    /// Alternative distribution package id, first value wins.
    #[serde(default)]
    pub adp_id: CachedId,

    /// Path to the `.p8` private key used to mint credentials.
    #[serde(default, with = "blank_as_none")]
    pub private_key_path: Option<String>,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            source_url: String::new(),
            developer_id: String::new(),
            email: String::new(),
            security_token: None,
            adp_id: CachedId::Unset,
            private_key_path: None,
        }
    }
}

impl Configuration {
    /// The record written when no configuration exists yet.
    pub fn template() -> Self {
        Self {
            private_key_path: Some(DEFAULT_PRIVATE_KEY_PATH.to_string()),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_if_unset_keeps_first_value() {
        let mut id = CachedId::Unset;

        assert!(id.cache_if_unset("1234567890"));
        assert!(!id.cache_if_unset("9999999999"));
        assert_eq!(id.get(), Some("1234567890"));
    }

    #[test]
    fn test_cache_if_unset_ignores_empty_id() {
        let mut id = CachedId::Unset;
        assert!(!id.cache_if_unset(""));
        assert_eq!(id, CachedId::Unset);
    }

    #[test]
    fn test_reads_original_file_layout() {
        let json = r#"{
            "source_url": "https://example.com/source.json",
            "developer_id": "69a6de70-03db-47e3-e053-5b8c7c11a4d1",
            "email": "dev@example.com",
            "security_token": "",
            "adp_id": "",
            "private_key_path": "./ApiKey_2X9R4HXF34.p8"
        }"#;

        let config: Configuration = serde_json::from_str(json).unwrap();

        assert_eq!(config.security_token, None);
        assert_eq!(config.adp_id, CachedId::Unset);
        assert_eq!(config.private_key_path.as_deref(), Some("./ApiKey_2X9R4HXF34.p8"));
    }

    #[test]
    fn test_template_shape() {
        let value = serde_json::to_value(Configuration::template()).unwrap();

        assert_eq!(value["private_key_path"], DEFAULT_PRIVATE_KEY_PATH);
        assert_eq!(value["adp_id"], "");
        assert_eq!(value["security_token"], "");
        assert_eq!(value["developer_id"], "");
    }
}
