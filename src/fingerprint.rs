//! Content addressing for ingested documents.
//!
//! The dedup key is a digest of the document *locator*, not its bytes: two
//! different URLs serving identical content are distinct keys.

use sha2::{Digest, Sha256};

/// SHA-256 hex digest of a document locator.
pub fn content_hash(locator: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(locator.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic() {
        let a = content_hash("https://example.com/policy.pdf");
        let b = content_hash("https://example.com/policy.pdf");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn distinct_locators_distinct_hashes() {
        let a = content_hash("https://example.com/a.pdf");
        let b = content_hash("https://example.com/b.pdf");
        assert_ne!(a, b);
    }
}
