//! XSalsa20-Poly1305 secretbox, wire-compatible with NaCl/libsodium
//!
//! Boxed format (binary):
//! ```text
//! [16 bytes: Poly1305 tag][N bytes: ciphertext]
//! ```
//!
//! The nonce is not part of the box; it travels separately in the metadata
//! record and must be the one used at encryption time.

use crypto_secretbox::{
    aead::{Aead, KeyInit},
    Nonce, XSalsa20Poly1305,
};
use zeroize::Zeroizing;

use crate::kdf::DerivedKey;
use crate::{NONCE_SIZE, TAG_SIZE};

/// Decrypted bytes. Zeroized on drop and never retained past one attempt.
pub struct Plaintext(Zeroizing<Vec<u8>>);

impl Plaintext {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for Plaintext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Plaintext")
            .field("len", &self.0.len())
            .finish()
    }
}

/// Authentication failed. Deliberately carries no detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("secretbox authentication failed")]
pub struct OpenError;

/// Seal `plaintext` under `key` and `nonce`.
///
/// Returns: `[16-byte tag][ciphertext]`
pub fn seal(key: &DerivedKey, nonce: &[u8; NONCE_SIZE], plaintext: &[u8]) -> anyhow::Result<Vec<u8>> {
    let cipher = XSalsa20Poly1305::new(key.as_bytes().into());
    cipher
        .encrypt(Nonce::from_slice(nonce), plaintext)
        .map_err(|e| anyhow::anyhow!("secretbox seal failed: {e}"))
}

/// Open a box produced by [`seal`] or libsodium's `crypto_secretbox_easy`.
///
/// A short box, a wrong key, and a tampered tag or body all yield the same
/// [`OpenError`].
pub fn open(key: &DerivedKey, nonce: &[u8; NONCE_SIZE], boxed: &[u8]) -> Result<Plaintext, OpenError> {
    if boxed.len() < TAG_SIZE {
        return Err(OpenError);
    }

    let cipher = XSalsa20Poly1305::new(key.as_bytes().into());
    cipher
        .decrypt(Nonce::from_slice(nonce), boxed)
        .map(|bytes| Plaintext(Zeroizing::new(bytes)))
        .map_err(|_| OpenError)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::KEY_SIZE;
    use proptest::prelude::*;

    fn key(byte: u8) -> DerivedKey {
        DerivedKey::from_bytes([byte; KEY_SIZE])
    }

    const NONCE: [u8; NONCE_SIZE] = [7u8; NONCE_SIZE];

    #[test]
    fn test_seal_open_roundtrip() {
        let plaintext = b"PK\x03\x04 not really a zip";

        let boxed = seal(&key(1), &NONCE, plaintext).unwrap();
        let opened = open(&key(1), &NONCE, &boxed).unwrap();

        assert_eq!(opened.as_bytes(), plaintext);
    }

    #[test]
    fn test_seal_open_empty() {
        let boxed = seal(&key(1), &NONCE, b"").unwrap();
        assert_eq!(boxed.len(), TAG_SIZE);

        let opened = open(&key(1), &NONCE, &boxed).unwrap();
        assert!(opened.is_empty());
    }

    #[test]
    fn test_boxed_size() {
        let boxed = seal(&key(1), &NONCE, &[0u8; 1000]).unwrap();
        // tag (16) + plaintext (1000)
        assert_eq!(boxed.len(), 16 + 1000);
    }

    #[test]
    fn test_open_wrong_key() {
        let boxed = seal(&key(1), &NONCE, b"secret data").unwrap();
        assert_eq!(open(&key(2), &NONCE, &boxed).unwrap_err(), OpenError);
    }

    #[test]
    fn test_open_wrong_nonce() {
        let boxed = seal(&key(1), &NONCE, b"secret data").unwrap();
        let other_nonce = [8u8; NONCE_SIZE];
        assert!(open(&key(1), &other_nonce, &boxed).is_err());
    }

    #[test]
    fn test_open_too_short() {
        assert!(open(&key(1), &NONCE, &[0u8; TAG_SIZE - 1]).is_err());
        assert!(open(&key(1), &NONCE, &[]).is_err());
    }

    #[test]
    fn test_tampered_tag() {
        let mut boxed = seal(&key(1), &NONCE, b"secret data").unwrap();
        boxed[0] ^= 0x01;
        assert!(open(&key(1), &NONCE, &boxed).is_err(), "tampered tag must fail");
    }

    #[test]
    fn test_tampered_ciphertext() {
        let mut boxed = seal(&key(1), &NONCE, b"secret data").unwrap();
        boxed[TAG_SIZE + 1] ^= 0xFF;
        assert!(open(&key(1), &NONCE, &boxed).is_err(), "tampered ciphertext must fail");
    }

    #[test]
    fn test_truncated_box() {
        let boxed = seal(&key(1), &NONCE, b"secret data").unwrap();
        assert!(open(&key(1), &NONCE, &boxed[..boxed.len() - 1]).is_err());
    }

    #[test]
    fn test_nonce_reuse_different_key_does_not_cross_open() {
        // Same nonce, two keys: each box only opens under its own key.
        let a = seal(&key(1), &NONCE, b"zine for alice").unwrap();
        let b = seal(&key(2), &NONCE, b"zine for bob!!").unwrap();

        assert!(open(&key(2), &NONCE, &a).is_err());
        assert!(open(&key(1), &NONCE, &b).is_err());
        assert_eq!(open(&key(1), &NONCE, &a).unwrap().as_bytes(), b"zine for alice");
    }

    #[test]
    fn test_nonce_reuse_same_key_tag_swap_fails() {
        // Same key and nonce, different plaintexts: splicing one box's tag
        // onto the other's body must not authenticate.
        let a = seal(&key(1), &NONCE, b"first plaintext!").unwrap();
        let b = seal(&key(1), &NONCE, b"other plaintext!").unwrap();
        assert_ne!(a, b);

        let mut spliced = b[..TAG_SIZE].to_vec();
        spliced.extend_from_slice(&a[TAG_SIZE..]);
        assert!(open(&key(1), &NONCE, &spliced).is_err());
    }

    #[test]
    fn test_plaintext_debug_hides_bytes() {
        let boxed = seal(&key(1), &NONCE, b"hidden").unwrap();
        let opened = open(&key(1), &NONCE, &boxed).unwrap();
        let dbg = format!("{opened:?}");
        assert!(!dbg.contains("hidden"));
        assert!(dbg.contains("len"));
    }

    proptest! {
        #[test]
        fn roundtrip_any_plaintext(data in proptest::collection::vec(any::<u8>(), 0..=2048)) {
            let boxed = seal(&key(9), &NONCE, &data).unwrap();
            let opened = open(&key(9), &NONCE, &boxed).unwrap();
            prop_assert_eq!(opened.as_bytes(), &data[..]);
        }

        #[test]
        fn any_single_bit_flip_fails(
            data in proptest::collection::vec(any::<u8>(), 1..=256),
            pos in any::<proptest::sample::Index>(),
            bit in 0u8..8,
        ) {
            let mut boxed = seal(&key(9), &NONCE, &data).unwrap();
            let i = pos.index(boxed.len());
            boxed[i] ^= 1 << bit;
            prop_assert!(open(&key(9), &NONCE, &boxed).is_err());
        }
    }
}
