//! `0x`-prefixed lowercase hex, the notation the wallet contracts and their
//! tooling use for byte values.

use serde::Serializer;

use crate::error::{PasskeyError, Result};

pub fn encode(bytes: impl AsRef<[u8]>) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Decode hex text with or without a `0x` prefix.
pub fn decode(text: &str) -> Result<Vec<u8>> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    hex::decode(digits).map_err(|e| PasskeyError::InvalidEncoding(format!("hex: {e}")))
}

/// Decode exactly `N` bytes of hex.
pub fn decode_fixed<const N: usize>(text: &str) -> Result<[u8; N]> {
    let bytes = decode(text)?;
    bytes.as_slice().try_into().map_err(|_| {
        PasskeyError::InvalidEncoding(format!("expected {N} bytes of hex, got {}", bytes.len()))
    })
}

pub(crate) fn serialize<S: Serializer>(
    bytes: &[u8],
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_handling() {
        assert_eq!(encode([0x05u8]), "0x05");
        assert_eq!(encode(b""), "0x");
        assert_eq!(decode("0xdeadBEEF").unwrap(), vec![0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(decode("deadbeef").unwrap(), vec![0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(decode("0x").unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_decode_fixed_length() {
        let hash: [u8; 2] = decode_fixed("0xabcd").unwrap();
        assert_eq!(hash, [0xab, 0xcd]);
        assert!(decode_fixed::<32>("0xabcd").is_err());
        assert!(decode("0xzz").is_err());
    }
}
