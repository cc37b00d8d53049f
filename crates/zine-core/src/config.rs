use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{GateError, GateResult};

/// Top-level configuration (loaded from config.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ZineConfig {
    pub gateway: GatewayConfig,
    pub crypto: CryptoConfig,
    pub output: OutputConfig,
    pub log: LogConfig,
}

/// Where the active configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    /// No file at this path; built-in defaults are in effect.
    Defaults(PathBuf),
}

impl ConfigSource {
    /// Report the source. Binaries call this once logging is up.
    pub fn log(&self) {
        match self {
            ConfigSource::File(path) => {
                tracing::debug!(path = %path.display(), "config loaded");
            }
            ConfigSource::Defaults(path) => {
                tracing::warn!("config file not found: {}  (using defaults)", path.display());
            }
        }
    }
}

impl ZineConfig {
    /// Load from a TOML file. A missing file yields defaults.
    pub fn load(path: &Path) -> GateResult<Self> {
        let (config, source) = Self::load_with_source(path)?;
        source.log();
        Ok(config)
    }

    /// Like [`ZineConfig::load`], but leaves reporting to the caller, which
    /// may not have a subscriber installed yet.
    pub fn load_with_source(path: &Path) -> GateResult<(Self, ConfigSource)> {
        if !path.exists() {
            return Ok((Self::default(), ConfigSource::Defaults(path.to_path_buf())));
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| GateError::Config(format!("reading {}: {e}", path.display())))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| GateError::Config(format!("parsing {}: {e}", path.display())))?;
        config
            .validate()
            .map_err(|e| GateError::Config(format!("{}: {e}", path.display())))?;
        Ok((config, ConfigSource::File(path.to_path_buf())))
    }

    /// Reject values that would make every attempt fail.
    pub fn validate(&self) -> Result<(), String> {
        if self.crypto.totp_step_secs == 0 {
            return Err("crypto.totp_step_secs must be greater than 0".into());
        }
        if !(1..=9).contains(&self.crypto.totp_digits) {
            return Err(format!(
                "crypto.totp_digits must be between 1 and 9, got {}",
                self.crypto.totp_digits
            ));
        }
        Ok(())
    }
}

/// Content-addressed gateway
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Gateway base URL (default: http://127.0.0.1:8080, a local IPFS node)
    pub endpoint: String,
    /// Path under which content ids are resolved (default: /ipfs)
    pub path_prefix: String,
    /// Refuse plaintext HTTP endpoints
    pub enforce_tls: bool,
    /// Retrieval timeout in seconds (0 = wait indefinitely)
    pub timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8080".into(),
            path_prefix: "/ipfs".into(),
            enforce_tls: false,
            timeout_secs: 60,
        }
    }
}

/// Where the decrypt gate gets the KDF salt from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SaltPolicy {
    /// Read the salt persisted in the metadata record.
    #[default]
    Stored,
    /// Draw a fresh random salt per attempt, as the first web client did.
    /// Kept for reproducing old behavior; it can never decrypt.
    LegacyRandom,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CryptoConfig {
    pub salt_policy: SaltPolicy,
    /// TOTP time step in seconds (default: 30)
    pub totp_step_secs: u64,
    /// TOTP code length (default: 6)
    pub totp_digits: u32,
    /// Number of adjacent time steps also accepted (default: 0)
    pub totp_skew: u8,
}

impl Default for CryptoConfig {
    fn default() -> Self {
        Self {
            salt_policy: SaltPolicy::Stored,
            totp_step_secs: 30,
            totp_digits: 6,
            totp_skew: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory decrypted archives are written to
    pub dir: PathBuf,
    /// Replace an existing archive with the same name
    pub overwrite: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            overwrite: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log level (default: info)
    pub level: String,
    /// Log format: "json" or "text"
    pub format: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}
