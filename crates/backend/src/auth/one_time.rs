//! One-time tokens for email verification and password reset.
//!
//! The plain token only ever leaves the server inside an emailed link; the
//! store keeps its SHA-256 digest.

use chrono::Duration;
use rand::RngCore;
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    EmailVerification,
    PasswordReset,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::EmailVerification => "email_verification",
            TokenKind::PasswordReset => "password_reset",
        }
    }

    pub fn lifetime(&self) -> Duration {
        match self {
            TokenKind::EmailVerification => Duration::hours(24),
            TokenKind::PasswordReset => Duration::hours(1),
        }
    }
}

/// Generate a fresh token, returning `(plain, digest)`.
pub fn generate() -> (String, String) {
    let mut bytes = [0u8; 64];
    rand::thread_rng().fill_bytes(&mut bytes);
    let plain = hex::encode(bytes);
    let digest = digest(&plain);
    (plain, digest)
}

pub fn digest(plain: &str) -> String {
    hex::encode(Sha256::digest(plain.as_bytes()))
}
