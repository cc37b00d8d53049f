//! Key derivation: scrypt passphrase → secretbox key
//!
//! Parameter sets are versioned. A record that was sealed under one set and
//! opened under another fails exactly like a wrong passphrase, so the set in
//! use is pinned by a golden-key test rather than trusted to stay in sync.

use secrecy::{ExposeSecret, SecretString};
use zeroize::Zeroize;

use crate::{KEY_SIZE, SALT_SIZE};

/// A 256-bit secretbox key derived from a passphrase.
///
/// Zeroized on drop to prevent secrets lingering in memory.
#[derive(Clone)]
pub struct DerivedKey {
    bytes: [u8; KEY_SIZE],
}

impl DerivedKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl Drop for DerivedKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// scrypt cost parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    /// log2 of the CPU/memory cost N
    pub log_n: u8,
    /// Block size
    pub r: u32,
    /// Parallelization
    pub p: u32,
}

/// libsodium limits the encryption side passes for parameter set 1
pub const SODIUM_OPSLIMIT_V1: u64 = 10;
pub const SODIUM_MEMLIMIT_V1: u64 = 15674;

impl KdfParams {
    /// Parameter set 1: what `crypto_pwhash_scryptsalsa208sha256(.., 10, 15674)`
    /// resolves to.
    pub const V1: KdfParams = KdfParams {
        log_n: 3,
        r: 8,
        p: 128,
    };

    pub const CURRENT_VERSION: u32 = 1;

    /// Look up a published parameter set.
    pub fn for_version(version: u32) -> Option<Self> {
        match version {
            1 => Some(Self::V1),
            _ => None,
        }
    }

    /// Translate libsodium's `(opslimit, memlimit)` pair into scrypt
    /// `(N, r, p)` the way `crypto_pwhash_scryptsalsa208sha256` does.
    pub fn from_sodium_limits(opslimit: u64, memlimit: u64) -> Self {
        let opslimit = opslimit.max(32768);
        let r: u32 = 8;

        if opslimit < memlimit / 32 {
            let max_n = opslimit / (u64::from(r) * 4);
            Self {
                log_n: first_log_n_above(max_n / 2),
                r,
                p: 1,
            }
        } else {
            let max_n = memlimit / (u64::from(r) * 128);
            let log_n = first_log_n_above(max_n / 2);
            let max_rp = ((opslimit / 4) / (1u64 << log_n)).min(0x3fff_ffff);
            Self {
                log_n,
                r,
                p: max_rp as u32 / r,
            }
        }
    }
}

/// Smallest `log_n` in `1..63` with `2^log_n > limit` (63 if none).
fn first_log_n_above(limit: u64) -> u8 {
    let mut log_n = 1u8;
    while log_n < 63 && (1u64 << log_n) <= limit {
        log_n += 1;
    }
    log_n
}

/// Derive a 256-bit key from a passphrase and salt using scrypt.
///
/// The salt must be the one used at encryption time; it is not secret and
/// travels in the metadata record.
pub fn derive_key(
    passphrase: &SecretString,
    salt: &[u8; SALT_SIZE],
    params: &KdfParams,
) -> anyhow::Result<DerivedKey> {
    let scrypt_params = scrypt::Params::new(params.log_n, params.r, params.p, KEY_SIZE)
        .map_err(|e| anyhow::anyhow!("invalid scrypt params {params:?}: {e}"))?;

    let mut key = [0u8; KEY_SIZE];
    scrypt::scrypt(
        passphrase.expose_secret().as_bytes(),
        salt,
        &scrypt_params,
        &mut key,
    )
    .map_err(|e| anyhow::anyhow!("scrypt KDF failed: {e}"))?;

    Ok(DerivedKey::from_bytes(key))
}
