use super::errors::PasswordError;
use super::scheme::PasswordCodec;
use super::scheme::PasswordScheme;

/// Stores the password as given. Verification is exact string equality.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlaintextCodec;

impl PlaintextCodec {
    pub fn new() -> Self {
        Self
    }
}

impl PasswordCodec for PlaintextCodec {
    fn scheme(&self) -> PasswordScheme {
        PasswordScheme::Plaintext
    }

    fn encode(&self, plaintext: &str) -> Result<String, PasswordError> {
        Ok(plaintext.to_string())
    }

    fn verify(&self, plaintext: &str, stored: &str) -> Result<bool, PasswordError> {
        Ok(plaintext == stored)
    }
}
