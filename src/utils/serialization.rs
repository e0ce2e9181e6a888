// src/utils/serialization.rs
//! Serialization utilities for the claims protocol.
//!
//! Provides serialization and deserialization functions for:
//! - JSON data structures (wire frames, registry payloads)
//! - Opaque byte payloads carried inside JSON as base64

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Serializes a value to a JSON string.
///
/// # Arguments
/// * `data` - The value to serialize (must implement `Serialize`)
///
/// # Returns
/// - `Ok(String)` with JSON representation on success
/// - `Err(serde_json::Error)` if serialization fails
pub fn serialize<T: Serialize>(data: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string(data)
}

/// Deserializes a value from a JSON string.
///
/// # Arguments
/// * `data` - JSON string to deserialize
///
/// # Returns
/// - `Ok(T)` with deserialized value on success
/// - `Err(serde_json::Error)` if deserialization fails
pub fn deserialize<'a, T: Deserialize<'a>>(data: &'a str) -> Result<T, serde_json::Error> {
    serde_json::from_str(data)
}

/// `#[serde(with = "base64_bytes")]` adapter for `Vec<u8>` fields.
pub mod base64_bytes {
    use super::*;

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&base64::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        base64::decode(encoded).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Blob {
        #[serde(with = "base64_bytes")]
        payload: Vec<u8>,
    }

    #[test]
    fn test_bytes_are_base64_in_json() {
        let blob = Blob { payload: vec![1, 2, 3] };
        let json = serialize(&blob).unwrap();
        assert_eq!(json, r#"{"payload":"AQID"}"#);
        let back: Blob = deserialize(&json).unwrap();
        assert_eq!(back, blob);
    }

    #[test]
    fn test_invalid_base64_rejected() {
        let result: Result<Blob, _> = deserialize(r#"{"payload":"***"}"#);
        assert!(result.is_err());
    }
}
