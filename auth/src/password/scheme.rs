use std::fmt;

use serde::Deserialize;

use super::argon2::Argon2Codec;
use super::encrypted::EncryptedCodec;
use super::errors::PasswordError;
use super::md5::Md5Codec;
use super::plaintext::PlaintextCodec;

/// Turns a plaintext password into its stored form and checks a presented
/// password against a stored form.
pub trait PasswordCodec: Send + Sync {
    /// Scheme this codec implements.
    fn scheme(&self) -> PasswordScheme;

    /// Produce the stored representation of `plaintext`.
    fn encode(&self, plaintext: &str) -> Result<String, PasswordError>;

    /// Check `plaintext` against a value previously produced by `encode`.
    ///
    /// Returns `Ok(false)` on mismatch; `Err` only when `stored` cannot be
    /// interpreted by this scheme.
    fn verify(&self, plaintext: &str, stored: &str) -> Result<bool, PasswordError>;
}

/// Storage scheme for local passwords, selected by configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PasswordScheme {
    Plaintext,
    Md5,
    Encrypted,
    #[default]
    Argon2,
}

impl PasswordScheme {
    /// Build the codec for this scheme.
    ///
    /// `encryption_key` (64 hex chars) is required by `Encrypted` and ignored
    /// by the other schemes.
    ///
    /// # Errors
    /// * `InvalidKey` - `Encrypted` without a usable key
    pub fn codec(
        self,
        encryption_key: Option<&str>,
    ) -> Result<Box<dyn PasswordCodec>, PasswordError> {
        match self {
            PasswordScheme::Plaintext => Ok(Box::new(PlaintextCodec::new())),
            PasswordScheme::Md5 => Ok(Box::new(Md5Codec::new())),
            PasswordScheme::Argon2 => Ok(Box::new(Argon2Codec::new())),
            PasswordScheme::Encrypted => {
                let key = encryption_key
                    .filter(|key| !key.trim().is_empty())
                    .ok_or_else(|| {
                        PasswordError::InvalidKey(
                            "the encrypted scheme requires an encryption key".to_string(),
                        )
                    })?;
                Ok(Box::new(EncryptedCodec::new(key)?))
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PasswordScheme::Plaintext => "plaintext",
            PasswordScheme::Md5 => "md5",
            PasswordScheme::Encrypted => "encrypted",
            PasswordScheme::Argon2 => "argon2",
        }
    }
}

impl fmt::Display for PasswordScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
