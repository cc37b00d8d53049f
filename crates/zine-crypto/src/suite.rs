//! Self-tested crypto suite and its process-wide cache
//!
//! The gate never calls the primitive modules directly; it goes through a
//! [`CryptoSuite`] obtained from a [`SuiteCache`]. The first caller runs the
//! loader (known-answer self-tests), concurrent first callers wait on the
//! same initialization, and everyone shares one `Arc`.

use std::sync::{Arc, OnceLock};
use std::time::Instant;

use rand::RngCore;
use secrecy::SecretString;
use tokio::sync::OnceCell;
use tracing::{debug, info};
use zine_core::{GateError, GateResult};

use crate::kdf::{self, DerivedKey, KdfParams};
use crate::secretbox::{self, OpenError, Plaintext};
use crate::totp::{self, TotpParams};
use crate::{NONCE_SIZE, SALT_SIZE};

/// scrypt("correct-horse", [0; 32], V1)
const KDF_KNOWN_ANSWER: [u8; 32] = [
    0x12, 0x16, 0x21, 0x39, 0x73, 0x96, 0x8a, 0x22, 0x4e, 0x5b, 0xcb, 0x90, 0xae, 0xc2, 0x48, 0x49,
    0xf6, 0x1c, 0xae, 0x9c, 0xfb, 0x0a, 0x5a, 0x0a, 0xdf, 0x80, 0xb8, 0xb0, 0xb7, 0xff, 0x25, 0x4b,
];

/// Handle to the primitives the gate is allowed to use.
#[derive(Debug)]
pub struct CryptoSuite {
    name: &'static str,
}

impl CryptoSuite {
    /// Run the known-answer self-tests and return a usable suite.
    pub fn initialize() -> anyhow::Result<Self> {
        self_test()?;
        Ok(Self {
            name: "xsalsa20poly1305+scrypt+totp-sha1",
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn verify_totp(&self, code: &str, secret: &[u8], unix_time: u64, params: &TotpParams) -> bool {
        totp::verify(code, secret, unix_time, params)
    }

    pub fn derive_key(
        &self,
        passphrase: &SecretString,
        salt: &[u8; SALT_SIZE],
        params: &KdfParams,
    ) -> anyhow::Result<DerivedKey> {
        kdf::derive_key(passphrase, salt, params)
    }

    pub fn open(
        &self,
        key: &DerivedKey,
        nonce: &[u8; NONCE_SIZE],
        boxed: &[u8],
    ) -> Result<Plaintext, OpenError> {
        secretbox::open(key, nonce, boxed)
    }

    pub fn random_salt(&self) -> [u8; SALT_SIZE] {
        let mut salt = [0u8; SALT_SIZE];
        rand::thread_rng().fill_bytes(&mut salt);
        salt
    }
}

fn self_test() -> anyhow::Result<()> {
    let key = kdf::derive_key(
        &SecretString::from("correct-horse"),
        &[0u8; SALT_SIZE],
        &KdfParams::V1,
    )?;
    if key.as_bytes() != &KDF_KNOWN_ANSWER {
        anyhow::bail!("scrypt known-answer test failed");
    }

    let rfc = TotpParams {
        digits: 8,
        ..TotpParams::default()
    };
    if totp::generate(b"12345678901234567890", 59, &rfc)? != "94287082" {
        anyhow::bail!("TOTP known-answer test failed");
    }

    let nonce = [0x24u8; NONCE_SIZE];
    let mut boxed = secretbox::seal(&key, &nonce, b"self-test")?;
    match secretbox::open(&key, &nonce, &boxed) {
        Ok(p) if p.as_bytes() == b"self-test" => {}
        _ => anyhow::bail!("secretbox roundtrip self-test failed"),
    }
    boxed[0] ^= 0x01;
    if secretbox::open(&key, &nonce, &boxed).is_ok() {
        anyhow::bail!("secretbox accepted a forged tag");
    }

    debug!("crypto self-tests passed");
    Ok(())
}

/// Produces an initialized suite. Swappable so tests can inject failures.
pub trait SuiteLoader: Send + Sync {
    fn load(&self) -> anyhow::Result<CryptoSuite>;
}

/// Loads the statically linked primitives.
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinLoader;

impl SuiteLoader for BuiltinLoader {
    fn load(&self) -> anyhow::Result<CryptoSuite> {
        CryptoSuite::initialize()
    }
}

/// At-most-once initialized suite.
///
/// A failed initialization is not cached; the next caller tries again.
pub struct SuiteCache {
    loader: Box<dyn SuiteLoader>,
    cell: OnceCell<Arc<CryptoSuite>>,
}

impl SuiteCache {
    pub fn new(loader: impl SuiteLoader + 'static) -> Self {
        Self {
            loader: Box::new(loader),
            cell: OnceCell::new(),
        }
    }

    pub fn builtin() -> Self {
        Self::new(BuiltinLoader)
    }

    /// The process-wide cache used by binaries.
    pub fn global() -> &'static SuiteCache {
        static GLOBAL: OnceLock<SuiteCache> = OnceLock::new();
        GLOBAL.get_or_init(SuiteCache::builtin)
    }

    pub fn is_initialized(&self) -> bool {
        self.cell.initialized()
    }

    pub async fn get_or_init(&self) -> GateResult<Arc<CryptoSuite>> {
        self.cell
            .get_or_try_init(|| async {
                let started = Instant::now();
                let suite = self
                    .loader
                    .load()
                    .map_err(|e| GateError::PrimitiveInit(format!("{e:#}")))?;
                info!(
                    suite = suite.name(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "crypto suite initialized"
                );
                Ok::<_, GateError>(Arc::new(suite))
            })
            .await
            .map(Arc::clone)
    }
}
