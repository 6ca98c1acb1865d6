//! # Credentials
//!
//! Salted, stretched SHA-256 password hashes.
//!
//! - Salt: random UUID v4, simple form (32 hex chars)
//! - Hash: `HASH_ROUNDS` rounds of `sha256(salt || previous)`, seeded with the password
//! - Stored as lowercase hex next to the username in every user record
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use uuid::Uuid;

pub const HASH_ROUNDS: u32 = 10_000;

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Credentials {
    pub username: String,
    pub salt: String,
    pub password_hash: String,
}

impl Credentials {
    pub fn new(username: &str, password: &str) -> Self {
        let salt = Uuid::new_v4().simple().to_string();
        let password_hash = hash_password(&salt, password);

        Self {
            username: username.to_string(),
            salt,
            password_hash,
        }
    }

    pub fn verify(&self, password: &str) -> bool {
        let candidate = hash_password(&self.salt, password);

        candidate.as_bytes().ct_eq(self.password_hash.as_bytes()).into()
    }

    pub fn set_password(&mut self, password: &str) {
        *self = Self::new(&self.username, password);
    }
}

fn hash_password(salt: &str, password: &str) -> String {
    let mut digest = Sha256::digest(password.as_bytes());

    for _ in 0..HASH_ROUNDS {
        let mut hasher = Sha256::new();
        hasher.update(salt.as_bytes());
        hasher.update(&digest);
        digest = hasher.finalize();
    }

    hex::encode(digest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify() {
        let credentials = Credentials::new("ana", "s3cretpass");

        assert!(credentials.verify("s3cretpass"));
        assert!(!credentials.verify("s3cretpasS"));
        assert!(!credentials.verify(""));
    }

    #[test]
    fn test_verify_rejects_tampered_hash() {
        let mut credentials = Credentials::new("ana", "s3cretpass");
        credentials.password_hash.pop();

        assert!(!credentials.verify("s3cretpass"));
    }

    #[test]
    fn test_salt_differs_per_account() {
        let first = Credentials::new("ana", "s3cretpass");
        let second = Credentials::new("bia", "s3cretpass");

        assert_ne!(first.salt, second.salt);
        assert_ne!(first.password_hash, second.password_hash);
    }

    #[test]
    fn test_set_password_keeps_username() {
        let mut credentials = Credentials::new("ana", "s3cretpass");
        credentials.set_password("an0therpass");

        assert_eq!(credentials.username, "ana");
        assert!(credentials.verify("an0therpass"));
        assert!(!credentials.verify("s3cretpass"));
    }

    #[test]
    fn test_hash_is_hex_sha256() {
        let hash = hash_password("salt", "password1");

        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(hash, hash_password("salt", "password1"));
    }
}
