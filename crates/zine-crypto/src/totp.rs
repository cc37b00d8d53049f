//! RFC 6238 time-based one-time passwords (HMAC-SHA1)
//!
//! The shared secret is the raw decoded `totpSecret` bytes, used directly as
//! the HMAC key.

use hmac::{Hmac, Mac};
use sha1::Sha1;
use subtle::ConstantTimeEq;

type HmacSha1 = Hmac<Sha1>;

/// TOTP parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TotpParams {
    /// Time step in seconds (default: 30)
    pub step_secs: u64,
    /// Code length (default: 6)
    pub digits: u32,
    /// Adjacent steps accepted on either side of the current one (default: 0)
    pub skew: u8,
}

impl Default for TotpParams {
    fn default() -> Self {
        Self {
            step_secs: 30,
            digits: 6,
            skew: 0,
        }
    }
}

impl TotpParams {
    fn validate(&self) -> anyhow::Result<()> {
        if self.step_secs == 0 {
            anyhow::bail!("TOTP step must be non-zero");
        }
        if !(1..=9).contains(&self.digits) {
            anyhow::bail!("TOTP digits must be 1..=9, got {}", self.digits);
        }
        Ok(())
    }
}

/// RFC 4226 HOTP value for one counter.
pub fn hotp(secret: &[u8], counter: u64, digits: u32) -> anyhow::Result<u32> {
    let mut mac = HmacSha1::new_from_slice(secret)
        .map_err(|e| anyhow::anyhow!("HMAC key rejected: {e}"))?;
    mac.update(&counter.to_be_bytes());
    let digest = mac.finalize().into_bytes();

    let offset = (digest[digest.len() - 1] & 0x0f) as usize;
    let binary = u32::from_be_bytes([
        digest[offset] & 0x7f,
        digest[offset + 1],
        digest[offset + 2],
        digest[offset + 3],
    ]);
    Ok(binary % 10u32.pow(digits))
}

/// The code valid at `unix_time`, zero-padded to `params.digits`.
pub fn generate(secret: &[u8], unix_time: u64, params: &TotpParams) -> anyhow::Result<String> {
    params.validate()?;
    let code = hotp(secret, unix_time / params.step_secs, params.digits)?;
    Ok(format!("{code:0width$}", width = params.digits as usize))
}

/// Check `code` against `secret` at `unix_time`.
///
/// Returns a plain boolean: a wrong code and an expired code look the same.
pub fn verify(code: &str, secret: &[u8], unix_time: u64, params: &TotpParams) -> bool {
    if params.validate().is_err() {
        return false;
    }
    let code = code.trim();
    if code.len() != params.digits as usize || !code.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }

    let current = unix_time / params.step_secs;
    let skew = u64::from(params.skew);
    let mut matched = subtle::Choice::from(0u8);

    for counter in current.saturating_sub(skew)..=current.saturating_add(skew) {
        let Ok(value) = hotp(secret, counter, params.digits) else {
            return false;
        };
        let expected = format!("{value:0width$}", width = params.digits as usize);
        matched |= expected.as_bytes().ct_eq(code.as_bytes());
    }

    matched.into()
}
