use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::PasswordHash;
use argon2::password_hash::PasswordHasher;
use argon2::password_hash::PasswordVerifier;
use argon2::password_hash::SaltString;
use argon2::Argon2;

use super::errors::PasswordError;
use super::scheme::PasswordCodec;
use super::scheme::PasswordScheme;

/// Salted password hashing (Argon2id).
///
/// Every encode draws a fresh salt, so two users with the same password end up
/// with different stored values.
#[derive(Debug, Default, Clone, Copy)]
pub struct Argon2Codec;

impl Argon2Codec {
    pub fn new() -> Self {
        Self
    }
}

impl PasswordCodec for Argon2Codec {
    fn scheme(&self) -> PasswordScheme {
        PasswordScheme::Argon2
    }

    /// Hash a plaintext password into a PHC string
    /// (algorithm, parameters, salt and hash in one value).
    ///
    /// # Errors
    /// * `HashingFailed` - Password hashing operation failed
    fn encode(&self, plaintext: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);

        Argon2::default()
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| PasswordError::HashingFailed(e.to_string()))
    }

    /// # Errors
    /// * `VerificationFailed` - Stored value is not a PHC string
    fn verify(&self, plaintext: &str, stored: &str) -> Result<bool, PasswordError> {
        let parsed_hash = PasswordHash::new(stored).map_err(|e| {
            PasswordError::VerificationFailed(format!("Invalid password hash: {}", e))
        })?;

        Ok(Argon2::default()
            .verify_password(plaintext.as_bytes(), &parsed_hash)
            .is_ok())
    }
}
