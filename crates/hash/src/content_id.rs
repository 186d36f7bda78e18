//! SHA-256 content identifiers and their canonical string form.

use crate::{HashError, HashResult};
use sha2::{Digest, Sha256};
use std::{fmt, str::FromStr};

/// Length of a canonical identifier in hex characters (full SHA-256 digest).
pub const CONTENT_ID_HEX_LEN: usize = 64;

/// Derives the identifier for `bytes`.
///
/// Pure function of the input: the filename, upload time and upload order play no part, so two
/// uploads of identical content always map to the same blob.
pub fn identifier(bytes: &[u8]) -> ContentId {
    let digest: [u8; 32] = Sha256::digest(bytes).into();
    ContentId::from_bytes(&digest)
}

/// OSS's canonical content identifier (64 lowercase hex characters).
///
/// Once constructed the contained string is guaranteed to be canonical, which makes it safe to
/// use directly as a filename component.
///
/// # Construction
/// - [`identifier`] hashes content.
/// - [`ContentId::from_bytes`] wraps a raw digest.
/// - [`ContentId::parse`] validates an externally supplied identifier. Uppercase or truncated
///   input is rejected rather than normalised.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentId(String);

impl ContentId {
    /// Wraps a raw 32-byte SHA-256 digest.
    pub fn from_bytes(digest: &[u8; 32]) -> Self {
        Self(hex::encode(digest))
    }

    /// Validates and wraps an identifier string that must already be canonical.
    ///
    /// # Errors
    ///
    /// Returns [`HashError::InvalidInput`] if `input` is not 64 lowercase hex characters.
    pub fn parse(input: &str) -> HashResult<Self> {
        if Self::is_canonical(input) {
            return Ok(Self(input.to_owned()));
        }
        Err(HashError::InvalidInput(format!(
            "identifier must be {} lowercase hex characters, got: '{}'",
            CONTENT_ID_HEX_LEN, input
        )))
    }

    /// Returns true if `input` is a canonical identifier.
    ///
    /// Purely syntactic; says nothing about whether a blob with this identifier exists.
    pub fn is_canonical(input: &str) -> bool {
        input.len() == CONTENT_ID_HEX_LEN
            && input
                .bytes()
                .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Recomputes the digest of `bytes` and compares it with this identifier.
    pub fn verify(&self, bytes: &[u8]) -> bool {
        identifier(bytes) == *self
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ContentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for ContentId {
    type Err = HashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ContentId::parse(s)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for ContentId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for ContentId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        ContentId::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    const ABC_SHA256: &str = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad";
    const EMPTY_SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    #[test]
    fn test_identifier_known_vectors() {
        assert_eq!(identifier(b"abc").as_str(), ABC_SHA256);
        assert_eq!(identifier(b"").as_str(), EMPTY_SHA256);
    }

    #[test]
    fn test_identifier_is_deterministic() {
        let data: Vec<u8> = (0..=255).cycle().take(10_000).collect();
        let first = identifier(&data);
        for _ in 0..10 {
            assert_eq!(identifier(&data), first);
        }
    }

    #[test]
    fn test_identifier_is_canonical() {
        let id = identifier(b"Hello, World!");
        assert_eq!(id.as_str().len(), CONTENT_ID_HEX_LEN);
        assert!(ContentId::is_canonical(id.as_str()));
    }

    #[test]
    fn test_no_collisions_across_distinct_inputs() {
        let mut seen = HashSet::new();
        for i in 0u32..5_000 {
            let content = format!("blob-{}", i);
            assert!(seen.insert(identifier(content.as_bytes())));
        }

        // Single-bit differences must still diverge
        let mut base = vec![0u8; 64];
        let base_id = identifier(&base);
        base[63] = 1;
        assert_ne!(identifier(&base), base_id);
    }

    #[test]
    fn test_parse_valid_identifier() {
        let id = ContentId::parse(ABC_SHA256).unwrap();
        assert_eq!(id.to_string(), ABC_SHA256);
        assert_eq!(ABC_SHA256.parse::<ContentId>().unwrap(), id);
    }

    #[test]
    fn test_parse_rejects_uppercase() {
        let upper = ABC_SHA256.to_uppercase();
        match ContentId::parse(&upper) {
            Err(HashError::InvalidInput(msg)) => {
                assert!(msg.contains("64 lowercase hex characters"));
            }
            _ => panic!("Expected InvalidInput error"),
        }
    }

    #[test]
    fn test_parse_rejects_wrong_length() {
        assert!(ContentId::parse(&ABC_SHA256[..32]).is_err());
        assert!(ContentId::parse(&format!("{}0", ABC_SHA256)).is_err());
        assert!(ContentId::parse("").is_err());
    }

    #[test]
    fn test_parse_rejects_non_hex() {
        let mut bad = ABC_SHA256.to_string();
        bad.replace_range(0..1, "g");
        assert!(!ContentId::is_canonical(&bad));
        assert!(!ContentId::is_canonical(&format!("../{}", &ABC_SHA256[3..])));
    }

    #[test]
    fn test_verify() {
        let id = identifier(b"abc");
        assert!(id.verify(b"abc"));
        assert!(!id.verify(b"abd"));
    }

    #[test]
    fn test_serde_round_trip_validates() {
        let id = identifier(b"abc");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", ABC_SHA256));

        let back: ContentId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);

        let bad: Result<ContentId, _> = serde_json::from_str("\"not-a-hash\"");
        assert!(bad.is_err());
    }
}
