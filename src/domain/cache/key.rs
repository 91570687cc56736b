//! Cache key derivation

use std::fmt;

use sha2::{Digest, Sha256};

/// Content-addressed key: hex-encoded SHA-256 of a query text
///
/// Keys are derived from the exact text. Two queries that differ only in
/// whitespace or variable names get different keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    /// Length of the hex representation (256 bits)
    pub const HEX_LEN: usize = 64;

    /// Digests the given text into a key
    pub fn digest(text: &str) -> Self {
        let hash = Sha256::digest(text.as_bytes());
        Self(hex::encode(hash))
    }

    /// Returns true if the value looks like a hex-encoded key
    pub fn is_valid_hex(value: &str) -> bool {
        value.len() == Self::HEX_LEN && value.bytes().all(|b| b.is_ascii_hexdigit())
    }

    /// Returns the hex representation
    pub fn as_hex(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Maps query text to a cache key
///
/// The cache contract only sees `CacheKey`, so a canonicalizing generator
/// can replace the default without touching the stores.
pub trait CacheKeyGenerator: Send + Sync + fmt::Debug {
    /// Derives the key for a query text
    fn generate(&self, query_text: &str) -> CacheKey;
}

/// Default generator: SHA-256 over the raw query text
#[derive(Debug, Clone, Default)]
pub struct Sha256KeyGenerator;

impl Sha256KeyGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl CacheKeyGenerator for Sha256KeyGenerator {
    fn generate(&self, query_text: &str) -> CacheKey {
        CacheKey::digest(query_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_known_value() {
        let key = CacheKey::digest("abc");
        assert_eq!(
            key.as_hex(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_identical_text_identical_key() {
        let generator = Sha256KeyGenerator::new();
        let query = "SELECT ?movie WHERE { ?movie a dbo:Film } LIMIT 10";

        assert_eq!(generator.generate(query), generator.generate(query));
    }

    #[test]
    fn test_textual_variation_changes_key() {
        let generator = Sha256KeyGenerator::new();

        let a = generator.generate("SELECT ?m WHERE { ?m a dbo:Film }");
        let b = generator.generate("SELECT ?m WHERE {  ?m a dbo:Film }");

        assert_ne!(a, b);
    }

    #[test]
    fn test_key_length() {
        let key = CacheKey::digest("");
        assert_eq!(key.as_hex().len(), CacheKey::HEX_LEN);
        assert_eq!(key.to_string(), key.as_hex());
    }

    #[test]
    fn test_is_valid_hex() {
        assert!(CacheKey::is_valid_hex(CacheKey::digest("query").as_hex()));
        assert!(!CacheKey::is_valid_hex("not-a-key"));
        assert!(!CacheKey::is_valid_hex(&"z".repeat(64)));
        assert!(!CacheKey::is_valid_hex(&"a".repeat(63)));
    }
}
