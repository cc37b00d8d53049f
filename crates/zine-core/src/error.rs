use thiserror::Error;

pub type GateResult<T> = Result<T, GateError>;

/// Every way a decrypt attempt can be rejected.
///
/// Wrong passphrase and corrupt ciphertext deliberately share one variant so
/// callers cannot build a decryption oracle out of the error type.
#[derive(Debug, Error)]
pub enum GateError {
    #[error("malformed metadata field `{field}`: {reason}")]
    Decode { field: &'static str, reason: String },

    #[error("one-time code rejected")]
    InvalidSecondFactor,

    #[error("retrieval failed: {0}")]
    Retrieval(String),

    #[error("crypto suite initialization failed: {0}")]
    PrimitiveInit(String),

    #[error("invalid passphrase or corrupt data")]
    InvalidPassphraseOrCorruptData,

    #[error("decrypted payload is not a valid archive: {0}")]
    MalformedArchive(String),

    #[error("delivery failed: {0}")]
    Delivery(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("invalid content identifier: {0}")]
    InvalidContentId(String),
}

impl GateError {
    pub fn decode(field: &'static str, reason: impl Into<String>) -> Self {
        GateError::Decode {
            field,
            reason: reason.into(),
        }
    }

    /// Transport and backend failures; a fresh attempt may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, GateError::Retrieval(_) | GateError::PrimitiveInit(_))
    }

    /// Message shown to the person at the prompt.
    pub fn user_message(&self) -> &'static str {
        match self {
            GateError::Decode { .. } => "The zine metadata is malformed",
            GateError::InvalidSecondFactor => "Invalid one-time code",
            GateError::Retrieval(_) => "Could not retrieve the zine",
            GateError::PrimitiveInit(_) => "Cryptographic backend unavailable",
            GateError::InvalidPassphraseOrCorruptData => "Incorrect passphrase",
            GateError::MalformedArchive(_) => "Decrypted payload is not a valid archive",
            GateError::Delivery(_) => "Could not save the zine",
            GateError::Config(_) => "Invalid configuration",
            GateError::InvalidContentId(_) => "Invalid content identifier",
        }
    }
}
