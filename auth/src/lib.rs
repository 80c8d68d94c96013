//! Password storage library
//!
//! Provides the password codecs used by the secrets site, one per storage
//! generation the site has gone through:
//! - Plaintext (identity)
//! - MD5 digest (unsalted)
//! - AES-256-GCM field encryption (reversible, keyed)
//! - Argon2id (salted hash, the default)
//!
//! The scheme is picked at deployment time through [`PasswordScheme`]; the
//! service only talks to the [`Authenticator`].
//!
//! # Examples
//!
//! ## Encoding and checking a password
//! ```
//! use auth::{Authenticator, PasswordScheme};
//!
//! let auth = Authenticator::for_scheme(PasswordScheme::Argon2, None).unwrap();
//!
//! // Register: encode password
//! let stored = auth.encode_password("password123").unwrap();
//!
//! // Login: verify
//! assert!(auth.authenticate("password123", &stored).is_ok());
//! assert!(auth.authenticate("password124", &stored).is_err());
//! ```
//!
//! ## Field encryption
//! ```
//! use auth::{EncryptedCodec, PasswordCodec};
//!
//! let key = "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f";
//! let codec = EncryptedCodec::new(key).unwrap();
//! let stored = codec.encode("hunter2").unwrap();
//! assert_ne!(stored, "hunter2");
//! assert!(codec.verify("hunter2", &stored).unwrap());
//! ```

pub mod authenticator;
pub mod password;

// Re-export commonly used items
pub use authenticator::AuthenticationError;
pub use authenticator::Authenticator;
pub use password::Argon2Codec;
pub use password::EncryptedCodec;
pub use password::Md5Codec;
pub use password::PasswordCodec;
pub use password::PasswordError;
pub use password::PasswordScheme;
pub use password::PlaintextCodec;
