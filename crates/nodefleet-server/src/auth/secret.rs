//! Node secret generation and hashing.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE;
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

/// Length of a node secret in bytes.
pub const SECRET_LEN: usize = 32;

/// A freshly issued node secret. Handed to the caller once, never stored.
pub struct NodeSecret {
    bytes: Zeroizing<[u8; SECRET_LEN]>,
}

impl fmt::Debug for NodeSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeSecret")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

impl NodeSecret {
    /// Generate a new random secret from the OS RNG.
    pub fn generate() -> Self {
        let mut bytes = Zeroizing::new([0u8; SECRET_LEN]);
        OsRng.fill_bytes(&mut bytes[..]);
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..]
    }

    /// Digest to persist for this secret.
    pub fn hash(&self) -> SecretHash {
        hash_secret(self.as_bytes())
    }

    /// The bearer token form of the secret: URL-safe base64 with padding.
    pub fn to_token(&self) -> String {
        URL_SAFE.encode(self.as_bytes())
    }
}

/// SHA-256 digest of a node secret.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct SecretHash([u8; 32]);

impl SecretHash {
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for SecretHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretHash(..)")
    }
}

/// Hash raw secret bytes.
pub fn hash_secret(secret: &[u8]) -> SecretHash {
    SecretHash(Sha256::digest(secret).into())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn generated_secrets_differ() {
        let a = NodeSecret::generate();
        let b = NodeSecret::generate();
        assert_eq!(a.as_bytes().len(), SECRET_LEN);
        assert_ne!(a.as_bytes(), b.as_bytes());
        assert_ne!(a.hash(), b.hash());
    }

    #[test]
    fn hash_is_deterministic_and_not_the_secret() {
        let secret = NodeSecret::generate();
        assert_eq!(secret.hash(), hash_secret(secret.as_bytes()));
        assert_ne!(&secret.hash().as_bytes()[..], secret.as_bytes());
    }

    #[test]
    fn token_decodes_to_secret() {
        let secret = NodeSecret::generate();
        let decoded = URL_SAFE.decode(secret.to_token()).unwrap();
        assert_eq!(decoded, secret.as_bytes());
    }

    #[test]
    fn debug_redacts() {
        let secret = NodeSecret::generate();
        let rendered = format!("{secret:?}");
        assert!(rendered.contains("REDACTED"));
    }
}
