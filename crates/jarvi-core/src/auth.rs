//! Secret handling: only the SHA-256 digest of the secret is kept in memory.

use sha2::{Digest, Sha256};

/// SHA-256 digest of the bridge secret.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretDigest([u8; 32]);

impl SecretDigest {
    /// Hash a plaintext secret.
    pub fn from_secret(secret: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(secret.as_bytes());
        Self(hasher.finalize().into())
    }

    /// Parse a hex-encoded digest (64 hex chars).
    pub fn from_hex(hex_digest: &str) -> Result<Self, String> {
        let bytes = hex::decode(hex_digest).map_err(|e| format!("invalid hex digest: {}", e))?;
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|b: Vec<u8>| format!("expected 32 bytes, got {}", b.len()))?;
        Ok(Self(arr))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Hash `candidate` and compare against this digest in constant time.
    pub fn matches(&self, candidate: &str) -> bool {
        let other = Self::from_secret(candidate);
        constant_time_eq(&self.0, &other.0)
    }
}

impl std::fmt::Debug for SecretDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretDigest(..)")
    }
}

/// Both inputs are fixed-length digests, so nothing leaks through the length.
fn constant_time_eq(a: &[u8; 32], b: &[u8; 32]) -> bool {
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_exact_secret_only() {
        let digest = SecretDigest::from_secret("Commander-Secret");
        assert!(digest.matches("Commander-Secret"));
        assert!(!digest.matches("commander-secret"));
        assert!(!digest.matches("COMMANDER-SECRET"));
        assert!(!digest.matches(""));
        assert!(!digest.matches("Commander-Secret "));
    }

    #[test]
    fn test_hex_round_trip_and_known_vector() {
        // sha256("abc")
        let known = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad";
        let digest = SecretDigest::from_hex(known).unwrap();
        assert!(digest.matches("abc"));
        assert_eq!(SecretDigest::from_secret("abc").to_hex(), known);
    }

    #[test]
    fn test_from_hex_rejects_wrong_length() {
        assert!(SecretDigest::from_hex("abcd").is_err());
        assert!(SecretDigest::from_hex("zz").is_err());
    }

    #[test]
    fn test_debug_does_not_print_digest() {
        let digest = SecretDigest::from_secret("x");
        assert_eq!(format!("{:?}", digest), "SecretDigest(..)");
    }
}
