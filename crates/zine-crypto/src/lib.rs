//! zine-crypto: primitives behind the zine decrypt gate
//!
//! Wire compatibility with the encryption side (libsodium):
//! ```text
//! key     = scrypt(passphrase, salt[32], N=2^3, r=8, p=128) -> 32 bytes
//!           (crypto_pwhash_scryptsalsa208sha256 with opslimit=10, memlimit=15674)
//! payload = crypto_secretbox(zip, nonce[24], key) = [16-byte Poly1305 tag][ciphertext]
//! gate    = TOTP(HMAC-SHA1, key = totpSecret bytes, step 30s, 6 digits)
//! ```

pub mod encoding;
pub mod envelope;
pub mod kdf;
pub mod secretbox;
pub mod suite;
pub mod totp;

pub use envelope::SealedZine;
pub use kdf::{derive_key, DerivedKey, KdfParams};
pub use secretbox::{open, seal, OpenError, Plaintext};
pub use suite::{BuiltinLoader, CryptoSuite, SuiteCache, SuiteLoader};
pub use totp::TotpParams;

/// Size of a secretbox key in bytes (256-bit)
pub const KEY_SIZE: usize = 32;

/// Size of an XSalsa20 nonce (192-bit)
pub const NONCE_SIZE: usize = 24;

/// Size of a Poly1305 authentication tag
pub const TAG_SIZE: usize = 16;

/// Size of a scrypt salt (crypto_pwhash_scryptsalsa208sha256_SALTBYTES)
pub const SALT_SIZE: usize = 32;
