//! Codec Module
//!
//! Turns keys and entries into the opaque byte strings stored remotely.
//! JSON keeps the stored blobs readable from any client of the store.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;

/// Encodes a key or entry into bytes.
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(value)?)
}

/// Decodes bytes produced by [`encode`].
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    Ok(serde_json::from_slice(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheEntry;
    use crate::error::CacheError;
    use std::collections::HashMap;

    #[test]
    fn test_entry_with_nested_value() {
        let mut value = HashMap::new();
        value.insert("key1".to_string(), 22);
        value.insert("key2".to_string(), 23);
        let entry = CacheEntry::new(value, 5_000);

        let bytes = encode(&entry).unwrap();
        let back: CacheEntry<HashMap<String, i32>> = decode(&bytes).unwrap();

        assert_eq!(back, entry);
    }

    #[test]
    fn test_string_key_bytes() {
        assert_eq!(encode("foo").unwrap(), b"\"foo\"".to_vec());
    }

    #[test]
    fn test_decode_garbage_is_serialization_error() {
        let result: Result<CacheEntry<String>> = decode(b"\xff\x00not json");
        assert!(matches!(result, Err(CacheError::Serialization(_))));
    }

    #[test]
    fn test_decode_wrong_shape_is_serialization_error() {
        let bytes = encode(&CacheEntry::new("text".to_string(), 1)).unwrap();
        let result: Result<CacheEntry<u64>> = decode(&bytes);
        assert!(matches!(result, Err(CacheError::Serialization(_))));
    }

    #[test]
    fn test_encode_non_string_map_keys_fails() {
        let value: HashMap<(u8, u8), u8> = HashMap::from([((1, 2), 3)]);
        assert!(matches!(encode(&value), Err(CacheError::Serialization(_))));
    }
}
