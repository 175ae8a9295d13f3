//! Unpadded, URL-safe base64 as used throughout WebAuthn.
//!
//! Decoding is lenient about padding and about the standard `+`/`/`
//! alphabet (browsers and libraries disagree on both); encoding is always
//! canonical: URL-safe alphabet, no padding.

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use serde::Serializer;

use crate::error::{PasskeyError, Result};

const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_encode_padding(true)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Encode bytes as unpadded base64url.
pub fn encode(bytes: impl AsRef<[u8]>) -> String {
    URL_SAFE_LENIENT.encode(bytes)
}

/// Decode base64url text, padded or not.
pub fn decode(text: &str) -> Result<Vec<u8>> {
    let normalized: String = text
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect();

    URL_SAFE_LENIENT
        .decode(normalized.as_bytes())
        .map_err(|e| PasskeyError::InvalidEncoding(e.to_string()))
}

/// Decode standard-alphabet base64 (certificate chains embedded in JSON).
pub fn decode_standard(text: &str) -> Result<Vec<u8>> {
    STANDARD_LENIENT
        .decode(text.as_bytes())
        .map_err(|e| PasskeyError::InvalidEncoding(e.to_string()))
}

pub(crate) fn serialize<S: Serializer>(
    bytes: &[u8],
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&encode(bytes))
}

pub(crate) fn serialize_opt<S: Serializer>(
    bytes: &Option<Vec<u8>>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match bytes {
        Some(bytes) => serializer.serialize_some(&encode(bytes)),
        None => serializer.serialize_none(),
    }
}
