//! Compact URL-safe document id encoding.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::types::DocId;

/// Source value for a compact encoded document id.
///
/// The closed set of supported sources keeps id derivation deterministic:
/// equal sources always encode to equal ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdSource {
    /// 32-bit unsigned integer.
    U32(u32),
    /// 64-bit unsigned integer.
    U64(u64),
    /// 32-bit signed integer.
    I32(i32),
    /// 64-bit signed integer.
    I64(i64),
    /// UUID, encoded from its 16 bytes.
    Uuid(Uuid),
    /// Raw byte sequence, encoded as given.
    Bytes(Vec<u8>),
}

impl IdSource {
    /// Encode into a compact URL-safe document id.
    ///
    /// Integers contribute their big-endian bytes, UUIDs their 16 bytes,
    /// byte sequences themselves; the bytes are rendered as unpadded
    /// URL-safe base64. An empty byte sequence is rejected.
    pub fn encode(&self) -> Result<DocId> {
        let bytes: Vec<u8> = match self {
            Self::U32(v) => v.to_be_bytes().to_vec(),
            Self::U64(v) => v.to_be_bytes().to_vec(),
            Self::I32(v) => v.to_be_bytes().to_vec(),
            Self::I64(v) => v.to_be_bytes().to_vec(),
            Self::Uuid(v) => v.as_bytes().to_vec(),
            Self::Bytes(v) => {
                if v.is_empty() {
                    return Err(Error::Validation(
                        "id byte sequence must not be empty".to_string(),
                    ));
                }
                v.clone()
            }
        };
        DocId::new(URL_SAFE_NO_PAD.encode(bytes))
    }
}

impl From<u32> for IdSource {
    fn from(v: u32) -> Self {
        Self::U32(v)
    }
}

impl From<u64> for IdSource {
    fn from(v: u64) -> Self {
        Self::U64(v)
    }
}

impl From<i32> for IdSource {
    fn from(v: i32) -> Self {
        Self::I32(v)
    }
}

impl From<i64> for IdSource {
    fn from(v: i64) -> Self {
        Self::I64(v)
    }
}

impl From<Uuid> for IdSource {
    fn from(v: Uuid) -> Self {
        Self::Uuid(v)
    }
}

impl From<Vec<u8>> for IdSource {
    fn from(v: Vec<u8>) -> Self {
        Self::Bytes(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded(source: IdSource) -> String {
        source.encode().unwrap().to_string()
    }

    #[test]
    fn test_integer_encoding_is_big_endian() {
        assert_eq!(encoded(IdSource::U32(1)), "AAAAAQ");
        assert_eq!(encoded(IdSource::U64(1)), "AAAAAAAAAAE");
        // same value, different width, different id
        assert_ne!(encoded(IdSource::U32(1)), encoded(IdSource::U64(1)));
    }

    #[test]
    fn test_byte_encoding_is_url_safe_unpadded() {
        let id = encoded(IdSource::Bytes(vec![0xff, 0xfe]));
        assert_eq!(id, "__4");
        assert!(!id.contains('='));
        assert!(!id.contains('/'));
        assert!(!id.contains('+'));
    }

    #[test]
    fn test_uuid_encoding() {
        assert_eq!(
            encoded(IdSource::Uuid(Uuid::nil())),
            "AAAAAAAAAAAAAAAAAAAAAA"
        );
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let a = IdSource::I64(-42).encode().unwrap();
        let b = IdSource::I64(-42).encode().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_bytes_rejected() {
        assert!(IdSource::Bytes(Vec::new()).encode().is_err());
    }
}
