//! Content hasher
//!
//! SHA-256 digests serve two roles: the integrity reference hash of uploaded
//! plaintext, and the lookup hash of human-supplied access codes (codes are
//! never persisted in plaintext).

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// SHA-256 hex digest (lowercase) of arbitrary bytes.
pub fn digest(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Digest of a human-supplied access code, as persisted and compared.
pub fn digest_access_code(code: &str) -> String {
    digest(code.trim().as_bytes())
}

/// Constant-time comparison of two hex digests.
pub fn digests_match(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_vector() {
        // sha256("hello government")
        assert_eq!(
            digest(b"hello government"),
            "743315350a442e4ad8fdae6f35c8388c594a4637cf87431004f2092908e09543"
        );
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(
            digest(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_access_code_trimmed() {
        assert_eq!(
            digest_access_code("  RTI-2024-SECRET  "),
            digest_access_code("RTI-2024-SECRET")
        );
    }

    #[test]
    fn test_digests_match() {
        let d = digest(b"some content");
        assert!(digests_match(&d, &d));
        assert!(!digests_match(&d, &digest(b"other content")));
    }
}
