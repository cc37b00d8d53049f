//! `attempt_decrypt`: one synchronous pass through the gate
//!
//! Order matters and is fixed:
//!   1. decode every field (fail fast, before any KDF work)
//!   2. verify the one-time code
//!   3. pick the salt per [`SaltPolicy`]
//!   4. scrypt the passphrase
//!   5. open the secretbox
//!
//! Both ways step 5 can fail (tag mismatch, or a fault inside the cipher call)
//! collapse into `InvalidPassphraseOrCorruptData`.

use std::panic::{self, AssertUnwindSafe};
use std::time::{SystemTime, UNIX_EPOCH};

use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, warn};
use zine_core::config::{CryptoConfig, SaltPolicy};
use zine_core::{GateError, GateResult, MetadataRecord};
use zine_crypto::{CryptoSuite, Plaintext, SealedZine, TotpParams};

/// What the person at the prompt typed.
pub struct Credentials {
    pub passphrase: SecretString,
    pub one_time_code: SecretString,
}

impl Credentials {
    pub fn new(passphrase: impl Into<String>, one_time_code: impl Into<String>) -> Self {
        Self {
            passphrase: SecretString::from(passphrase.into()),
            one_time_code: SecretString::from(one_time_code.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GateOptions {
    pub salt_policy: SaltPolicy,
    pub totp: TotpParams,
}

impl GateOptions {
    pub fn from_config(crypto: &CryptoConfig) -> Self {
        Self {
            salt_policy: crypto.salt_policy,
            totp: TotpParams {
                step_secs: crypto.totp_step_secs,
                digits: crypto.totp_digits,
                skew: crypto.totp_skew,
            },
        }
    }
}

/// Seconds since the Unix epoch (0 if the clock is before it).
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Run the gate against one metadata record.
pub fn attempt_decrypt(
    suite: &CryptoSuite,
    record: &MetadataRecord,
    credentials: &Credentials,
    unix_time: u64,
    options: &GateOptions,
) -> GateResult<Plaintext> {
    let sealed = SealedZine::from_record(record)?;

    let stored_salt = match options.salt_policy {
        SaltPolicy::Stored => Some(sealed.salt.ok_or_else(|| {
            GateError::decode("salt", "missing; the record was written without its KDF salt")
        })?),
        SaltPolicy::LegacyRandom => None,
    };
    debug!(
        ciphertext_len = sealed.ciphertext.len(),
        kdf_version = sealed.kdf_version,
        "metadata decoded"
    );

    debug!(stage = "verifying_2fa", "checking one-time code");
    if !suite.verify_totp(
        credentials.one_time_code.expose_secret(),
        &sealed.totp_secret,
        unix_time,
        &options.totp,
    ) {
        debug!(stage = "rejected", "one-time code rejected");
        return Err(GateError::InvalidSecondFactor);
    }

    let salt = stored_salt.unwrap_or_else(|| {
        warn!("legacy-random salt policy: deriving from a fresh salt, decryption cannot succeed");
        suite.random_salt()
    });

    debug!(stage = "deriving_key", kdf = ?sealed.kdf, "deriving key");
    let key = suite
        .derive_key(&credentials.passphrase, &salt, &sealed.kdf)
        .map_err(|e| GateError::PrimitiveInit(format!("{e:#}")))?;

    let opened = panic::catch_unwind(AssertUnwindSafe(|| {
        suite.open(&key, &sealed.nonce, &sealed.ciphertext)
    }));

    match opened {
        Ok(Ok(plaintext)) => {
            debug!(stage = "succeeded", bytes = plaintext.len(), "zine decrypted");
            Ok(plaintext)
        }
        Ok(Err(_)) | Err(_) => {
            debug!(stage = "rejected", "decryption failed");
            Err(GateError::InvalidPassphraseOrCorruptData)
        }
    }
}
