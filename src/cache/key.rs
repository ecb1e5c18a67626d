use std::fmt;

use sha2::{Digest, Sha256};

/// Store key for a request: the lowercase hex SHA-256 of its path and query.
///
/// Method and headers do not participate, so every request for the same
/// target shares one entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Length of every key, in hex characters.
    pub const LEN: usize = 64;

    pub fn derive(path_with_query: &str) -> Self {
        Self(format!("{:x}", Sha256::digest(path_with_query.as_bytes())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_digest() {
        assert_eq!(
            CacheKey::derive("").as_str(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(
            CacheKey::derive("abc").as_str(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn same_identifier_same_key() {
        assert_eq!(CacheKey::derive("/foo?x=1"), CacheKey::derive("/foo?x=1"));
    }

    #[test]
    fn query_participates_in_key() {
        let keys = [
            CacheKey::derive("/foo"),
            CacheKey::derive("/foo?x=1"),
            CacheKey::derive("/foo?x=2"),
            CacheKey::derive("/foo?"),
            CacheKey::derive("/Foo?x=1"),
        ];
        for (i, a) in keys.iter().enumerate() {
            for b in &keys[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn fixed_length_lowercase_hex() {
        let key = CacheKey::derive("/some/long/path?with=query&and=more");
        assert_eq!(key.as_str().len(), CacheKey::LEN);
        assert!(
            key.as_str()
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
        );
    }
}
