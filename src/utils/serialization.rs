// src/utils/serialization.rs
//! Serialization utilities.
//!
//! Provides:
//! - Unverified decoding of a single JWT segment into JSON
//! - Serde helpers for the configuration record, where an empty string
//!   means "not set"

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serializer};

/// Decodes segment `index` (0 = header, 1 = payload) of a compact JWT.
///
/// No signature check is performed; the result only reflects the structure
/// of the token.
///
/// # Errors
/// Returns a description of the failure when the token does not have three
/// segments, the segment is not base64url, or the JSON does not match `T`.
pub fn decode_segment<T: DeserializeOwned>(token: &str, index: usize) -> Result<T, String> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err(format!("expected 3 segments, found {}", parts.len()));
    }

    let segment = parts
        .get(index)
        .copied()
        .ok_or_else(|| format!("no segment at index {}", index))?;

    let bytes = base64::decode_config(segment, base64::URL_SAFE_NO_PAD)
        .map_err(|e| format!("base64 decoding failed: {}", e))?;
    serde_json::from_slice(&bytes).map_err(|e| format!("JSON decoding failed: {}", e))
}

/// `Option<String>` fields stored as `""` when unset.
pub mod blank_as_none {
    use super::*;

    pub fn serialize<S: Serializer>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(value.as_deref().unwrap_or(""))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
        let value: Option<String> = Option::deserialize(deserializer)?;
        Ok(value.filter(|s| !s.trim().is_empty()))
    }
}

/// `String` fields that tolerate `null` in hand-edited files.
pub fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Record {
        #[serde(with = "blank_as_none", default)]
        token: Option<String>,
    }

    #[test]
    fn test_decode_segment_rejects_wrong_shape() {
        let err = decode_segment::<serde_json::Value>("only.two", 0).unwrap_err();
        assert!(err.contains("3 segments"));
    }

    #[test]
    fn test_decode_segment_out_of_range_index() {
        let err = decode_segment::<serde_json::Value>("e30.e30.sig", 3).unwrap_err();
        assert!(err.contains("index 3"));
    }

    #[test]
    fn test_decode_segment_reads_payload() {
        let payload = base64::encode_config(br#"{"exp":42}"#, base64::URL_SAFE_NO_PAD);
        let token = format!("e30.{}.sig", payload);

        let value: serde_json::Value = decode_segment(&token, 1).unwrap();
        assert_eq!(value["exp"], 42);
    }

    #[test]
    fn test_blank_string_reads_as_none() {
        let record: Record = serde_json::from_str(r#"{"token": ""}"#).unwrap();
        assert_eq!(record.token, None);

        let record: Record = serde_json::from_str(r#"{"token": null}"#).unwrap();
        assert_eq!(record.token, None);

        let written = serde_json::to_string(&Record { token: None }).unwrap();
        assert_eq!(written, r#"{"token":""}"#);
    }
}
