use aes_gcm::aead::Aead;
use aes_gcm::aead::KeyInit;
use aes_gcm::Aes256Gcm;
use aes_gcm::Nonce;
use rand::RngCore;

use super::errors::PasswordError;
use super::scheme::PasswordCodec;
use super::scheme::PasswordScheme;

const KEY_LEN: usize = 32;
const NONCE_LEN: usize = 12;

/// Reversible field encryption with AES-256-GCM.
///
/// Stored form is `hex(nonce || ciphertext)`. A fresh random nonce is drawn for
/// every encode, so the stored value differs even when the password repeats.
/// Anyone holding the key can recover every password.
pub struct EncryptedCodec {
    cipher: Aes256Gcm,
}

impl EncryptedCodec {
    /// Create a codec from a 32-byte key given as 64 hex characters.
    ///
    /// # Errors
    /// * `InvalidKey` - Key is not hex or not 32 bytes long
    pub fn new(key_hex: &str) -> Result<Self, PasswordError> {
        let key = hex::decode(key_hex.trim())
            .map_err(|e| PasswordError::InvalidKey(format!("not valid hex: {}", e)))?;

        if key.len() != KEY_LEN {
            return Err(PasswordError::InvalidKey(format!(
                "expected {} bytes ({} hex chars), got {} bytes",
                KEY_LEN,
                KEY_LEN * 2,
                key.len()
            )));
        }

        let cipher = Aes256Gcm::new_from_slice(&key)
            .map_err(|e| PasswordError::InvalidKey(e.to_string()))?;

        Ok(Self { cipher })
    }

    fn decrypt(&self, stored: &str) -> Result<Vec<u8>, PasswordError> {
        let bytes = hex::decode(stored).map_err(|e| {
            PasswordError::VerificationFailed(format!("stored value is not hex: {}", e))
        })?;

        if bytes.len() < NONCE_LEN {
            return Err(PasswordError::VerificationFailed(
                "stored value is shorter than a nonce".to_string(),
            ));
        }

        let (nonce, ciphertext) = bytes.split_at(NONCE_LEN);
        self.cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|e| PasswordError::VerificationFailed(format!("decryption failed: {}", e)))
    }
}

impl PasswordCodec for EncryptedCodec {
    fn scheme(&self) -> PasswordScheme {
        PasswordScheme::Encrypted
    }

    fn encode(&self, plaintext: &str) -> Result<String, PasswordError> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(Nonce::from_slice(&nonce_bytes), plaintext.as_bytes())
            .map_err(|e| PasswordError::HashingFailed(format!("encryption failed: {}", e)))?;

        let mut stored = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        stored.extend_from_slice(&nonce_bytes);
        stored.extend_from_slice(&ciphertext);

        Ok(hex::encode(stored))
    }

    /// # Errors
    /// * `VerificationFailed` - Stored value is malformed or was sealed with another key
    fn verify(&self, plaintext: &str, stored: &str) -> Result<bool, PasswordError> {
        let decrypted = self.decrypt(stored)?;
        Ok(decrypted == plaintext.as_bytes())
    }
}
