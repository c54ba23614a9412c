// src/models/credential.rs
//! Credential data model.
//!
//! A credential is a compact JWT (`header.payload.signature`, each segment
//! base64url without padding). Header and payload are readable without the
//! signature; this crate never verifies the signature locally because no
//! verification key is available here. The remote API is the verifier.

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Audience accepted by App Store Connect.
pub const API_AUDIENCE: &str = "appstoreconnect-v1";

/// Fixed lifetime of every minted credential, in seconds.
pub const CREDENTIAL_LIFETIME_SECS: i64 = 1200;

/// Unverified view of the credential header.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CredentialHeader {
    #[serde(default)]
    pub alg: String,
    #[serde(default)]
    pub kid: Option<String>,
    #[serde(default)]
    pub typ: Option<String>,
}

/// Claims carried in the credential payload.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CredentialClaims {
    /// Issuer id (the developer id from the configuration record).
    #[serde(default)]
    pub iss: String,
    /// Issued at, seconds since epoch.
    #[serde(default)]
    pub iat: i64,
    /// Expiry, seconds since epoch. The only claim freshness depends on.
    pub exp: i64,
    #[serde(default)]
    pub aud: String,
}

impl CredentialClaims {
    /// Claims for a credential issued at `now`, valid for
    /// [`CREDENTIAL_LIFETIME_SECS`].
    pub fn issued_at(issuer_id: &str, now: DateTime<Utc>) -> Self {
        let iat = now.timestamp();
        Self {
            iss: issuer_id.to_string(),
            iat,
            exp: iat + CREDENTIAL_LIFETIME_SECS,
            aud: API_AUDIENCE.to_string(),
        }
    }

    /// Expiry as an instant, if the timestamp is representable.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.exp, 0).single()
    }
}

/// Validity state of a credential relative to a point in time.
#[derive(Debug, Clone, PartialEq)]
pub enum Freshness {
    /// No credential configured.
    Absent,
    /// Header or payload could not be decoded.
    Unreadable,
    Fresh { remaining: Duration },
    Stale { expired_at: DateTime<Utc> },
}

impl Freshness {
    /// `true` only for [`Freshness::Fresh`].
    pub fn is_fresh(&self) -> bool {
        matches!(self, Freshness::Fresh { .. })
    }

    /// Classifies `claims` at `now`. Equality with the expiry is stale.
    pub fn of(claims: &CredentialClaims, now: DateTime<Utc>) -> Self {
        match claims.expires_at() {
            Some(expiry) if now < expiry => Freshness::Fresh {
                remaining: expiry - now,
            },
            Some(expiry) => Freshness::Stale { expired_at: expiry },
            None => Freshness::Unreadable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims_expiring(exp: i64) -> CredentialClaims {
        CredentialClaims {
            iss: "issuer".to_string(),
            iat: exp - CREDENTIAL_LIFETIME_SECS,
            exp,
            aud: API_AUDIENCE.to_string(),
        }
    }

    #[test]
    fn test_issued_claims_use_fixed_lifetime() {
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let claims = CredentialClaims::issued_at("69a6de70-03db", now);

        assert_eq!(claims.iat, 1_700_000_000);
        assert_eq!(claims.exp, 1_700_001_200);
        assert_eq!(claims.aud, "appstoreconnect-v1");
        assert_eq!(claims.iss, "69a6de70-03db");
    }

    #[test]
    fn test_expiry_boundary_is_stale() {
        let claims = claims_expiring(1_700_000_000);
        let at_expiry = Utc.timestamp_opt(1_700_000_000, 0).unwrap();

        assert!(!Freshness::of(&claims, at_expiry).is_fresh());
        assert!(Freshness::of(&claims, at_expiry - Duration::seconds(1)).is_fresh());
    }

    #[test]
    fn test_fresh_reports_remaining_time() {
        let claims = claims_expiring(1_700_003_900);
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();

        match Freshness::of(&claims, now) {
            Freshness::Fresh { remaining } => {
                assert_eq!(remaining.num_hours(), 1);
                assert_eq!(remaining.num_minutes() % 60, 5);
            }
            other => panic!("expected fresh, got {:?}", other),
        }
    }

    #[test]
    fn test_unrepresentable_expiry_is_unreadable() {
        let claims = claims_expiring(i64::MAX);
        let now = Utc.timestamp_opt(0, 0).unwrap();

        assert_eq!(Freshness::of(&claims, now), Freshness::Unreadable);
    }
}
