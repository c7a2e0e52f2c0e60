//! Value encoding for cached entries.
//!
//! Values are stored as CBOR: binary, self-describing (structs keep their
//! field names, so readers tolerate added optional fields) and exact for
//! every serde data model type, including non-finite floats and maps with
//! non-string keys.

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::error::{CacheError, Result};

pub fn encode<T: Serialize>(key: &str, value: &T) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    ciborium::into_writer(value, &mut bytes)
        .map_err(|source| CacheError::Encode { key: key.to_string(), source })?;
    Ok(bytes)
}

pub fn decode<T: DeserializeOwned>(key: &str, bytes: &[u8]) -> Result<T> {
    ciborium::from_reader(bytes).map_err(|source| CacheError::Decode { key: key.to_string(), source })
}
