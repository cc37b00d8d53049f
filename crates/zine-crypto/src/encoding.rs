//! Base64 decoding for metadata fields
//!
//! The encryption side emits standard padded base64, while libsodium's
//! `from_base64` defaults to the URL-safe unpadded variant. Both are accepted;
//! the alphabet is picked from the characters present.

use base64::{
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine,
};
use zine_core::{GateError, GateResult};

const LENIENT: GeneralPurposeConfig =
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent);

const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT);
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT);

/// Decode one named metadata field.
pub fn decode_field(field: &'static str, value: &str) -> GateResult<Vec<u8>> {
    let value = value.trim();
    let engine = if value.contains(['-', '_']) {
        &URL_SAFE_LENIENT
    } else {
        &STANDARD_LENIENT
    };
    engine
        .decode(value)
        .map_err(|e| GateError::decode(field, format!("invalid base64: {e}")))
}
