//! # hb-auth-tripcode
//!
//! SHA-256 implementation of `IdentityProvider`.
//! A tripcode secret becomes a public, unspoofable name tag without accounts.

use hb_core::traits::IdentityProvider;
use sha2::{Digest, Sha256};

/// Digest of the empty secret, i.e. what every post without a tripcode carries.
pub const EMPTY_TRIPCODE_HASH: &str =
    "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

#[derive(Debug, Default, Clone, Copy)]
pub struct Sha256Tripcodes;

impl Sha256Tripcodes {
    pub fn new() -> Self {
        Self
    }
}

impl IdentityProvider for Sha256Tripcodes {
    /// Lowercase hex SHA-256 of the secret's UTF-8 bytes (64 characters).
    fn hash_tripcode(&self, secret: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(secret.as_bytes());
        hex::encode(hasher.finalize())
    }
}
