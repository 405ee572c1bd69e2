use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

const TOKEN_BYTES: usize = 32;

/// A plaintext management secret. Returned exactly once in the response
/// that creates it and never persisted.
#[derive(Clone, Serialize)]
#[serde(transparent)]
pub struct SecretToken(String);

impl SecretToken {
    pub fn expose(&self) -> &str {
        &self.0
    }
}

// The plaintext must never end up in logs, so Debug redacts it.
impl std::fmt::Debug for SecretToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretToken(..)")
    }
}

/// Hex-encoded SHA-256 digest of a secret token. This is the only form
/// a secret takes once stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecretHash(String);

impl SecretHash {
    /// Verify a caller-supplied plaintext against this hash. The digest
    /// comparison is constant-time so partial matches leak nothing.
    pub fn verify(&self, provided: &str) -> bool {
        if provided.is_empty() {
            return false;
        }
        let provided_hash = hash_token(provided);
        provided_hash
            .as_bytes()
            .ct_eq(self.0.as_bytes())
            .into()
    }
}

fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Generate a fresh high-entropy token together with its stored hash.
pub fn generate_secret() -> (SecretToken, SecretHash) {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    let token = hex::encode(bytes);
    let hash = hash_token(&token);
    (SecretToken(token), SecretHash(hash))
}
