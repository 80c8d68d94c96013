use crate::password::Argon2Codec;
use crate::password::PasswordCodec;
use crate::password::PasswordError;
use crate::password::PasswordScheme;

/// Credential checker for local accounts.
///
/// Wraps the configured password codec and turns a verification mismatch into
/// `InvalidCredentials`, so callers never see which part of a login was wrong.
pub struct Authenticator {
    codec: Box<dyn PasswordCodec>,
}

/// Authentication operation errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthenticationError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Password error: {0}")]
    PasswordError(#[from] PasswordError),
}

impl Authenticator {
    /// Create an authenticator around an existing codec.
    pub fn new(codec: Box<dyn PasswordCodec>) -> Self {
        Self { codec }
    }

    /// Create an authenticator for a configured scheme.
    ///
    /// # Arguments
    /// * `scheme` - Password storage scheme
    /// * `encryption_key` - Hex key, required only by `PasswordScheme::Encrypted`
    ///
    /// # Errors
    /// * `InvalidKey` - Encrypted scheme without a usable key
    pub fn for_scheme(
        scheme: PasswordScheme,
        encryption_key: Option<&str>,
    ) -> Result<Self, PasswordError> {
        Ok(Self::new(scheme.codec(encryption_key)?))
    }

    pub fn scheme(&self) -> PasswordScheme {
        self.codec.scheme()
    }

    /// Encode a password for storage.
    ///
    /// # Errors
    /// * `PasswordError` - Encoding operation failed
    pub fn encode_password(&self, password: &str) -> Result<String, PasswordError> {
        self.codec.encode(password)
    }

    /// Verify a presented password against its stored form.
    ///
    /// # Errors
    /// * `InvalidCredentials` - Password does not match
    /// * `PasswordError` - Stored form could not be interpreted
    pub fn authenticate(&self, password: &str, stored: &str) -> Result<(), AuthenticationError> {
        if self.codec.verify(password, stored)? {
            Ok(())
        } else {
            Err(AuthenticationError::InvalidCredentials)
        }
    }
}

impl Default for Authenticator {
    fn default() -> Self {
        Self::new(Box::new(Argon2Codec::new()))
    }
}
