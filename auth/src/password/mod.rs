pub mod argon2;
pub mod encrypted;
pub mod errors;
pub mod md5;
pub mod plaintext;
pub mod scheme;

pub use self::argon2::Argon2Codec;
pub use encrypted::EncryptedCodec;
pub use errors::PasswordError;
pub use self::md5::Md5Codec;
pub use plaintext::PlaintextCodec;
pub use scheme::PasswordCodec;
pub use scheme::PasswordScheme;
