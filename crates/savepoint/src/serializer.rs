//! Serializer collaborator
//!
//! The facade treats serialization as a pluggable capability: anything that
//! can turn a value into bytes and back. The default implementation uses
//! JSON via `serde_json`, matching the persisted layout of catalogs and
//! metadata.

use savepoint_core::{Error, Result};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// Converts values to and from byte payloads
pub trait Serializer: Send + Sync {
    fn to_bytes<T>(&self, identifier: &str, value: &T) -> Result<Vec<u8>>
    where
        T: Serialize + ?Sized;

    fn from_bytes<T>(&self, identifier: &str, bytes: &[u8]) -> Result<T>
    where
        T: DeserializeOwned;

    /// Deserialize into an existing target instead of constructing a new
    /// value
    fn from_bytes_into<T>(&self, identifier: &str, bytes: &[u8], target: &mut T) -> Result<()>
    where
        T: DeserializeOwned;
}

/// JSON serializer backed by `serde_json`
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer;

impl Serializer for JsonSerializer {
    fn to_bytes<T>(&self, identifier: &str, value: &T) -> Result<Vec<u8>>
    where
        T: Serialize + ?Sized,
    {
        serde_json::to_vec(value).map_err(|e| Error::serialization(identifier, "serialize", e))
    }

    fn from_bytes<T>(&self, identifier: &str, bytes: &[u8]) -> Result<T>
    where
        T: DeserializeOwned,
    {
        serde_json::from_slice(bytes).map_err(|e| Error::serialization(identifier, "deserialize", e))
    }

    fn from_bytes_into<T>(&self, identifier: &str, bytes: &[u8], target: &mut T) -> Result<()>
    where
        T: DeserializeOwned,
    {
        let mut deserializer = serde_json::Deserializer::from_slice(bytes);
        Deserialize::deserialize_in_place(&mut deserializer, target)
            .map_err(|e| Error::serialization(identifier, "deserialize", e))?;
        deserializer
            .end()
            .map_err(|e| Error::serialization(identifier, "deserialize", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, Serialize, serde::Deserialize)]
    struct Sample {
        hp: u32,
        name: String,
    }

    #[test]
    fn json_round_trip() {
        let serializer = JsonSerializer;
        let value = Sample {
            hp: 10,
            name: "hero".to_string(),
        };
        let bytes = serializer.to_bytes("item", &value).unwrap();
        let parsed: Sample = serializer.from_bytes("item", &bytes).unwrap();
        assert_eq!(parsed, value);
    }

    #[test]
    fn deserialize_into_replaces_target_state() {
        let serializer = JsonSerializer;
        let bytes = serializer
            .to_bytes(
                "item",
                &Sample {
                    hp: 1,
                    name: "after".to_string(),
                },
            )
            .unwrap();

        let mut target = Sample {
            hp: 99,
            name: "before".to_string(),
        };
        serializer.from_bytes_into("item", &bytes, &mut target).unwrap();
        assert_eq!(target.hp, 1);
        assert_eq!(target.name, "after");
    }

    #[test]
    fn garbage_bytes_fail_cleanly() {
        let serializer = JsonSerializer;
        let result: Result<Sample> = serializer.from_bytes("item", b"\x00\x01 not json");
        assert!(result.is_err());
    }
}
