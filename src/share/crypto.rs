//! # Token and Password Primitives
//!
//! Share passwords are stored as Argon2id hashes only. Tokens are 256-bit
//! random values encoded URL-safe without padding, so they drop into a URL
//! path segment with no extra escaping.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::RngCore;
use subtle::ConstantTimeEq;

use super::errors::{ShareError, ShareResult};

/// Hash a share password with Argon2id.
pub fn hash_password(password: &str) -> ShareResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| ShareError::HashingFailed)
}

/// Verify a share password; a malformed stored hash verifies as false.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Generate a 32-byte random token, URL-safe base64 (43 characters).
pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    base64::Engine::encode(&base64::engine::general_purpose::URL_SAFE_NO_PAD, bytes)
}

/// Constant-time string comparison for token lookups.
pub fn constant_time_str_eq(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}
