use serde::{Deserialize, Serialize};
use serde_json::error::Category;
use std::fmt;

use crate::error::{GateError, GateResult};

/// Identifier of an object in content-addressed storage (e.g. an IPFS CID).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentId(String);

impl ContentId {
    pub fn parse(raw: &str) -> GateResult<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(GateError::InvalidContentId("empty".into()));
        }
        if !trimmed.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(GateError::InvalidContentId(format!(
                "must be alphanumeric: {trimmed:?}"
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ContentId {
    type Error = GateError;

    fn try_from(value: String) -> GateResult<Self> {
        Self::parse(&value)
    }
}

impl From<ContentId> for String {
    fn from(id: ContentId) -> Self {
        id.0
    }
}

/// Metadata record published next to an encrypted zine.
///
/// Field names match the JSON emitted by the encryption side. Values are
/// base64 and are decoded eagerly by the gate, never lazily.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataRecord {
    pub encrypted_zine: String,
    pub nonce: String,
    pub totp_secret: String,
    /// KDF salt used at encryption time. Older records omit it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salt: Option<String>,
    /// Version of the KDF parameter set (1 when absent).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kdf_version: Option<u32>,
}

const RECORD_FIELDS: [&str; 5] = ["encryptedZine", "nonce", "totpSecret", "salt", "kdfVersion"];

impl MetadataRecord {
    /// Parse a fetched response body.
    ///
    /// A body that is not JSON at all (an HTML error page, a truncated
    /// transfer) is a retrieval failure. JSON with a missing or mistyped
    /// field is a `Decode` error on that field.
    pub fn from_json(body: &[u8]) -> GateResult<Self> {
        serde_json::from_slice(body).map_err(|e| match e.classify() {
            Category::Data => {
                let message = e.to_string();
                let field = RECORD_FIELDS
                    .into_iter()
                    .find(|f| message.contains(&format!("`{f}`")))
                    .unwrap_or("record");
                GateError::decode(field, message)
            }
            Category::Io | Category::Syntax | Category::Eof => {
                GateError::Retrieval(format!("metadata is not JSON: {e}"))
            }
        })
    }
}

impl fmt::Debug for MetadataRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetadataRecord")
            .field("encrypted_zine_len", &self.encrypted_zine.len())
            .field("nonce", &self.nonce)
            .field("totp_secret", &"[REDACTED]")
            .field("salt", &self.salt)
            .field("kdf_version", &self.kdf_version)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_reference_record() {
        let body = br#"{"encryptedZine":"AAAA","nonce":"BBBB","totpSecret":"CCCC"}"#;
        let record = MetadataRecord::from_json(body).unwrap();

        assert_eq!(record.encrypted_zine, "AAAA");
        assert_eq!(record.nonce, "BBBB");
        assert_eq!(record.totp_secret, "CCCC");
        assert!(record.salt.is_none());
        assert!(record.kdf_version.is_none());
    }

    #[test]
    fn test_parse_record_with_salt() {
        let body = br#"{"encryptedZine":"AA","nonce":"BB","totpSecret":"CC","salt":"DD","kdfVersion":1}"#;
        let record = MetadataRecord::from_json(body).unwrap();

        assert_eq!(record.salt.as_deref(), Some("DD"));
        assert_eq!(record.kdf_version, Some(1));
    }

    #[test]
    fn test_missing_field_is_decode_error() {
        let body = br#"{"encryptedZine":"AA","nonce":"BB"}"#;
        let err = MetadataRecord::from_json(body).unwrap_err();
        assert!(matches!(err, GateError::Decode { field: "totpSecret", .. }), "got {err:?}");
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_wrong_field_type_is_decode_error() {
        let body = br#"{"encryptedZine":"AA","nonce":7,"totpSecret":"CC"}"#;
        let err = MetadataRecord::from_json(body).unwrap_err();
        assert!(matches!(err, GateError::Decode { .. }), "got {err:?}");
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_non_object_is_decode_error() {
        let err = MetadataRecord::from_json(b"[1, 2, 3]").unwrap_err();
        assert!(matches!(err, GateError::Decode { field: "record", .. }), "got {err:?}");
    }

    #[test]
    fn test_non_json_is_retrieval_error() {
        let err = MetadataRecord::from_json(b"<html>gateway timeout</html>").unwrap_err();
        assert!(matches!(err, GateError::Retrieval(_)));

        let err = MetadataRecord::from_json(br#"{"encryptedZine":"AA","no"#).unwrap_err();
        assert!(matches!(err, GateError::Retrieval(_)), "truncated body: {err:?}");
    }

    #[test]
    fn test_debug_redacts_totp_secret() {
        let record = MetadataRecord {
            encrypted_zine: "AA".into(),
            nonce: "BB".into(),
            totp_secret: "super-secret".into(),
            salt: None,
            kdf_version: None,
        };
        let dbg = format!("{record:?}");
        assert!(!dbg.contains("super-secret"));
        assert!(dbg.contains("REDACTED"));
    }

    #[test]
    fn test_content_id_validation() {
        assert!(ContentId::parse("QmYnQpB5bQ8jM5g2hJz8zG8X2zC6b7e9pZ8sN7g4wFq").is_ok());
        assert_eq!(ContentId::parse("  bafy123  ").unwrap().as_str(), "bafy123");
        assert!(ContentId::parse("").is_err());
        assert!(ContentId::parse("../etc/passwd").is_err());
        assert!(ContentId::parse("Qm/abc").is_err());
    }

    #[test]
    fn test_bad_content_id_is_not_retryable() {
        let err = ContentId::parse("bad/cid").unwrap_err();
        assert!(matches!(err, GateError::InvalidContentId(_)));
        assert!(!err.is_retryable());
        assert_eq!(err.user_message(), "Invalid content identifier");

        assert!(matches!(ContentId::parse("   "), Err(GateError::InvalidContentId(_))));
    }
}
