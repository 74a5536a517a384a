//! Salted SHA-256 password hashes stored as `salt$hex`.

use sha2::{Digest, Sha256};

/// Hash a password with a fresh random salt.
pub fn hash(password: &str) -> String {
    let salt = uuid::Uuid::new_v4().simple().to_string();
    let digest = digest(&salt, password);
    format!("{}${}", salt, digest)
}

/// Check a password against a stored `salt$hex` hash.
pub fn verify(password: &str, stored: &str) -> bool {
    let Some((salt, expected)) = stored.split_once('$') else {
        return false;
    };
    constant_time_eq(digest(salt, password).as_bytes(), expected.as_bytes())
}

fn digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
