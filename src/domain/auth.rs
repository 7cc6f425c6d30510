use crate::error::{AppError, Result};
use argon2::{
    Argon2,
    password_hash::{PasswordHasher, SaltString},
};
use base64::Engine;
use rand::{RngCore, rngs::OsRng};
use sha2::{Digest, Sha256};

pub struct Password;

impl Password {
    /// Produces an Argon2 PHC string for storage.
    ///
    /// # Errors
    /// Returns `AppError::Internal` if hashing fails.
    #[tracing::instrument(skip(password), level = "debug")]
    pub fn hash(password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        let password_hash =
            argon2.hash_password(password.as_bytes(), &salt).map_err(|_| AppError::Internal)?.to_string();
        Ok(password_hash)
    }
}

pub struct AccessToken;

impl AccessToken {
    /// Generates a cryptographically secure random string (32 bytes -> Base64).
    #[must_use]
    pub fn generate() -> String {
        let mut bytes = [0u8; 32];
        OsRng.fill_bytes(&mut bytes);
        base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
    }

    /// SHA-256 hex digest; the only form in which tokens are stored or looked up.
    #[must_use]
    pub fn hash(token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        hex::encode(hasher.finalize())
    }
}
