//! Decoded, validated view of a metadata record
//!
//! Every field is decoded and length-checked up front so a malformed record
//! is rejected before any TOTP or KDF work is spent on it.

use zeroize::Zeroizing;
use zine_core::{GateError, GateResult, MetadataRecord};

use crate::encoding::decode_field;
use crate::kdf::KdfParams;
use crate::{NONCE_SIZE, SALT_SIZE, TAG_SIZE};

pub struct SealedZine {
    pub ciphertext: Vec<u8>,
    pub nonce: [u8; NONCE_SIZE],
    pub totp_secret: Zeroizing<Vec<u8>>,
    /// Absent in records written before the salt was persisted
    pub salt: Option<[u8; SALT_SIZE]>,
    pub kdf_version: u32,
    pub kdf: KdfParams,
}

impl SealedZine {
    pub fn from_record(record: &MetadataRecord) -> GateResult<Self> {
        let ciphertext = decode_field("encryptedZine", &record.encrypted_zine)?;
        let nonce = decode_field("nonce", &record.nonce)?;
        let totp_secret = Zeroizing::new(decode_field("totpSecret", &record.totp_secret)?);
        let salt = record
            .salt
            .as_deref()
            .map(|s| decode_field("salt", s))
            .transpose()?;

        if ciphertext.len() < TAG_SIZE {
            return Err(GateError::decode(
                "encryptedZine",
                format!(
                    "ciphertext too short: {} bytes (minimum {TAG_SIZE})",
                    ciphertext.len()
                ),
            ));
        }

        let nonce: [u8; NONCE_SIZE] = nonce.as_slice().try_into().map_err(|_| {
            GateError::decode(
                "nonce",
                format!("expected {NONCE_SIZE} bytes, got {}", nonce.len()),
            )
        })?;

        if totp_secret.is_empty() {
            return Err(GateError::decode("totpSecret", "empty secret"));
        }

        let salt = salt
            .map(|bytes| {
                <[u8; SALT_SIZE]>::try_from(bytes.as_slice()).map_err(|_| {
                    GateError::decode(
                        "salt",
                        format!("expected {SALT_SIZE} bytes, got {}", bytes.len()),
                    )
                })
            })
            .transpose()?;

        let kdf_version = record.kdf_version.unwrap_or(KdfParams::CURRENT_VERSION);
        let kdf = KdfParams::for_version(kdf_version).ok_or_else(|| {
            GateError::decode("kdfVersion", format!("unknown KDF version {kdf_version}"))
        })?;

        Ok(Self {
            ciphertext,
            nonce,
            totp_secret,
            salt,
            kdf_version,
            kdf,
        })
    }
}

impl std::fmt::Debug for SealedZine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SealedZine")
            .field("ciphertext_len", &self.ciphertext.len())
            .field("totp_secret", &"[REDACTED]")
            .field("has_salt", &self.salt.is_some())
            .field("kdf_version", &self.kdf_version)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::STANDARD, Engine};

    fn record() -> MetadataRecord {
        MetadataRecord {
            encrypted_zine: STANDARD.encode([0u8; 40]),
            nonce: STANDARD.encode([1u8; NONCE_SIZE]),
            totp_secret: STANDARD.encode([2u8; 32]),
            salt: Some(STANDARD.encode([3u8; SALT_SIZE])),
            kdf_version: None,
        }
    }

    fn decode_field_of(err: GateError) -> &'static str {
        match err {
            GateError::Decode { field, .. } => field,
            other => panic!("expected Decode, got {other:?}"),
        }
    }

    #[test]
    fn test_valid_record() {
        let sealed = SealedZine::from_record(&record()).unwrap();

        assert_eq!(sealed.ciphertext.len(), 40);
        assert_eq!(sealed.nonce, [1u8; NONCE_SIZE]);
        assert_eq!(sealed.totp_secret.as_slice(), &[2u8; 32]);
        assert_eq!(sealed.salt, Some([3u8; SALT_SIZE]));
        assert_eq!(sealed.kdf_version, 1);
        assert_eq!(sealed.kdf, KdfParams::V1);
    }

    #[test]
    fn test_record_without_salt() {
        let mut r = record();
        r.salt = None;
        assert!(SealedZine::from_record(&r).unwrap().salt.is_none());
    }

    #[test]
    fn test_malformed_nonce_base64() {
        let mut r = record();
        r.nonce = "%%%not-base64".into();
        assert_eq!(decode_field_of(SealedZine::from_record(&r).unwrap_err()), "nonce");
    }

    #[test]
    fn test_wrong_nonce_length() {
        let mut r = record();
        r.nonce = STANDARD.encode([1u8; 12]);
        assert_eq!(decode_field_of(SealedZine::from_record(&r).unwrap_err()), "nonce");
    }

    #[test]
    fn test_ciphertext_shorter_than_tag() {
        let mut r = record();
        r.encrypted_zine = STANDARD.encode([0u8; TAG_SIZE - 1]);
        assert_eq!(
            decode_field_of(SealedZine::from_record(&r).unwrap_err()),
            "encryptedZine"
        );
    }

    #[test]
    fn test_empty_totp_secret() {
        let mut r = record();
        r.totp_secret = String::new();
        assert_eq!(
            decode_field_of(SealedZine::from_record(&r).unwrap_err()),
            "totpSecret"
        );
    }

    #[test]
    fn test_wrong_salt_length() {
        let mut r = record();
        r.salt = Some(STANDARD.encode([3u8; 16]));
        assert_eq!(decode_field_of(SealedZine::from_record(&r).unwrap_err()), "salt");
    }

    #[test]
    fn test_unknown_kdf_version() {
        let mut r = record();
        r.kdf_version = Some(7);
        assert_eq!(
            decode_field_of(SealedZine::from_record(&r).unwrap_err()),
            "kdfVersion"
        );
    }

    #[test]
    fn test_debug_redacts_secret() {
        let sealed = SealedZine::from_record(&record()).unwrap();
        let dbg = format!("{sealed:?}");
        assert!(dbg.contains("REDACTED"));
        assert!(dbg.contains("ciphertext_len: 40"));
    }
}
