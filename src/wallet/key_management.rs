// src/wallet/key_management.rs
//! Signing identity and ES256 credential minting.
//!
//! The signing identity is the tuple (issuer id, key id, private key). The
//! key id is never configured on its own: it is read from the header of the
//! credential being replaced, so every minted credential is bound to the
//! same App Store Connect API key as its predecessor.
//!
//! Uses the following primitives:
//! - ECDSA over P-256 with SHA-256 (ES256) via the `jsonwebtoken` crate
//! - PKCS#8 PEM private keys, as downloaded from App Store Connect (`.p8`)

use crate::error::CredentialError;
use crate::models::credential::CredentialClaims;
use chrono::{DateTime, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use std::fs;
use std::path::{Path, PathBuf};

/// Material needed to mint a credential.
///
/// Built on demand by the lifecycle manager once it has checked that the key
/// file exists and the key id is known.
#[derive(Debug, Clone)]
pub struct SigningIdentity {
    /// Issuer id placed in the `iss` claim
    pub issuer_id: String,
    /// API key id placed in the `kid` header
    pub key_id: String,
    private_key_path: PathBuf,
}

impl SigningIdentity {
    /// # Arguments
    /// * `issuer_id` - Developer (issuer) id
    /// * `key_id` - Key id of the credential being replaced
    /// * `private_key_path` - `.p8` file holding the PKCS#8 key
    pub fn new(issuer_id: impl Into<String>, key_id: impl Into<String>, private_key_path: impl AsRef<Path>) -> Self {
        Self {
            issuer_id: issuer_id.into(),
            key_id: key_id.into(),
            private_key_path: private_key_path.as_ref().to_path_buf(),
        }
    }

    /// Mints a credential issued at `now`.
    ///
    /// # Process Flow
    /// 1. Builds the header `{alg: ES256, kid, typ: JWT}`
    /// 2. Builds the claims `{iss, iat, exp = iat + 1200, aud}`
    /// 3. Reads the PEM key from disk and signs header and claims
    ///
    /// # Errors
    /// [`CredentialError::Generation`] if the key file cannot be read, is not
    /// a P-256 PKCS#8 key, or signing fails.
    pub fn mint(&self, now: DateTime<Utc>) -> Result<String, CredentialError> {
        let mut header = Header::new(Algorithm::ES256);
        header.kid = Some(self.key_id.clone());
        header.typ = Some("JWT".to_string());

        let claims = CredentialClaims::issued_at(&self.issuer_id, now);

        let pem = fs::read(&self.private_key_path).map_err(|e| {
            CredentialError::Generation(format!(
                "cannot read {}: {}",
                self.private_key_path.display(),
                e
            ))
        })?;
        let key = EncodingKey::from_ec_pem(&pem)
            .map_err(|e| CredentialError::Generation(format!("invalid private key: {}", e)))?;

        encode(&header, &claims, &key).map_err(|e| CredentialError::Generation(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::credential::CredentialHeader;
    use crate::utils::serialization::decode_segment;
    use crate::testutil::TEST_KEY;
    use chrono::TimeZone;
    use std::io::Write;

    #[test]
    fn test_mint_builds_es256_credential() {
        let mut key_file = tempfile::NamedTempFile::new().unwrap();
        key_file.write_all(TEST_KEY.as_bytes()).unwrap();
        let identity = SigningIdentity::new("issuer-1", "2X9R4HXF34", key_file.path());
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();

        let token = identity.mint(now).unwrap();

        let header: CredentialHeader = decode_segment(&token, 0).unwrap();
        let claims: CredentialClaims = decode_segment(&token, 1).unwrap();
        assert_eq!(header.alg, "ES256");
        assert_eq!(header.kid.as_deref(), Some("2X9R4HXF34"));
        assert_eq!(header.typ.as_deref(), Some("JWT"));
        assert_eq!(claims, CredentialClaims::issued_at("issuer-1", now));
    }

    #[test]
    fn test_mint_rejects_non_ec_key() {
        let mut key_file = tempfile::NamedTempFile::new().unwrap();
        key_file.write_all(b"not a key").unwrap();
        let identity = SigningIdentity::new("issuer-1", "KID", key_file.path());

        let result = identity.mint(Utc::now());
        assert!(matches!(result, Err(CredentialError::Generation(_))));
    }

    #[test]
    fn test_mint_reports_unreadable_file() {
        let dir = tempfile::tempdir().unwrap();
        let identity = SigningIdentity::new("issuer-1", "KID", dir.path().join("gone.p8"));

        let result = identity.mint(Utc::now());
        assert!(matches!(result, Err(CredentialError::Generation(_))));
    }
}
