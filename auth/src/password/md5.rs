use md5::Digest;
use md5::Md5;

use super::errors::PasswordError;
use super::scheme::PasswordCodec;
use super::scheme::PasswordScheme;

/// Unsalted MD5 digest, stored as lowercase hex.
///
/// Identical passwords always produce identical digests. Kept for accounts
/// created under the digest scheme; not suitable for new deployments.
#[derive(Debug, Default, Clone, Copy)]
pub struct Md5Codec;

impl Md5Codec {
    pub fn new() -> Self {
        Self
    }

    fn digest(plaintext: &str) -> String {
        hex::encode(Md5::digest(plaintext.as_bytes()))
    }
}

impl PasswordCodec for Md5Codec {
    fn scheme(&self) -> PasswordScheme {
        PasswordScheme::Md5
    }

    fn encode(&self, plaintext: &str) -> Result<String, PasswordError> {
        Ok(Self::digest(plaintext))
    }

    fn verify(&self, plaintext: &str, stored: &str) -> Result<bool, PasswordError> {
        Ok(Self::digest(plaintext).eq_ignore_ascii_case(stored))
    }
}
