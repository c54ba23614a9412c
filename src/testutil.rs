// src/testutil.rs
//! Shared fixtures for unit tests.

use crate::error::ConfigError;
use crate::models::configuration::Configuration;
use crate::models::credential::{CredentialClaims, API_AUDIENCE};
use crate::storage::config_store::ConfigStore;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use std::io::Write;
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

/// P-256 PKCS#8 key in the format App Store Connect hands out.
pub const TEST_KEY: &str = include_str!("../testdata/AuthKey_TEST.p8");

pub const TEST_KEY_ID: &str = "2X9R4HXF34";
pub const TEST_ISSUER: &str = "69a6de70-03db-47e3-e053-5b8c7c11a4d1";

/// Writes [`TEST_KEY`] to a temporary `.p8` file.
pub fn key_file() -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".p8").tempfile().unwrap();
    file.write_all(TEST_KEY.as_bytes()).unwrap();
    file
}

/// Signs a credential with [`TEST_KEY`] carrying the given key id and expiry.
pub fn signed_credential(kid: &str, exp: i64) -> String {
    let mut header = Header::new(Algorithm::ES256);
    header.kid = Some(kid.to_string());
    header.typ = Some("JWT".to_string());
    let claims = CredentialClaims {
        iss: TEST_ISSUER.to_string(),
        iat: exp - 1200,
        exp,
        aud: API_AUDIENCE.to_string(),
    };
    let key = EncodingKey::from_ec_pem(TEST_KEY.as_bytes()).unwrap();
    encode(&header, &claims, &key).unwrap()
}

/// In-memory store recording every save.
#[derive(Clone, Default)]
pub struct MemoryStore {
    pub initial: Configuration,
    pub saved: Arc<Mutex<Vec<Configuration>>>,
}

impl MemoryStore {
    pub fn new(initial: Configuration) -> Self {
        Self {
            initial,
            saved: Arc::default(),
        }
    }

    pub fn save_count(&self) -> usize {
        self.saved.lock().unwrap().len()
    }

    pub fn last_saved(&self) -> Option<Configuration> {
        self.saved.lock().unwrap().last().cloned()
    }
}

impl ConfigStore for MemoryStore {
    fn load(&self) -> Result<Configuration, ConfigError> {
        Ok(self.initial.clone())
    }

    fn save(&mut self, config: &Configuration) -> Result<(), ConfigError> {
        self.saved.lock().unwrap().push(config.clone());
        Ok(())
    }
}
