//! Inputs for an on-chain P-256 verifier (`EllipticCurve.validateSignature`).
//!
//! Nothing is verified here. The builder extracts and formats: the message
//! hash the authenticator signed, the `(r, s)` pair and the `(x, y)` public
//! key coordinates.

use serde::{Serialize, Serializer};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::cose::CoseKey;
use crate::credential::{DecodedAuthentication, DecodedRegistration};
use crate::der::DerSignature;
use crate::error::{PasskeyError, Result};
use crate::hex_prefixed;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationInput {
    #[serde(serialize_with = "hex_prefixed::serialize")]
    pub message_hash: [u8; 32],
    #[serde(serialize_with = "serialize_pair")]
    pub signature: [Vec<u8>; 2],
    #[serde(serialize_with = "serialize_pair")]
    pub public_key_coordinates: [Vec<u8>; 2],
}

impl VerificationInput {
    /// `public_key` may be absent (an assertion does not carry the key);
    /// its coordinates are then empty.
    pub fn build(
        authenticator_data: &[u8],
        client_data_json: &[u8],
        der_signature: &[u8],
        public_key: Option<&CoseKey>,
    ) -> Result<Self> {
        let message_hash = message_hash(authenticator_data, client_data_json);
        let DerSignature { r, s } = DerSignature::decode(der_signature)?;
        let (x, y) = public_key.map(CoseKey::coordinates).unwrap_or_default();

        debug!(
            message_hash = %hex_prefixed::encode(message_hash),
            r_len = r.len(),
            s_len = s.len(),
            "Built verification input"
        );

        Ok(Self {
            message_hash,
            signature: [r, s],
            public_key_coordinates: [x.to_vec(), y.to_vec()],
        })
    }

    pub fn from_authentication(
        decoded: &DecodedAuthentication,
        public_key: Option<&CoseKey>,
    ) -> Result<Self> {
        Self::build(
            &decoded.authenticator_data_raw,
            &decoded.client_data_json,
            &decoded.signature,
            public_key,
        )
    }

    /// Uses the attestation statement's own signature; only direct
    /// attestations carry one.
    pub fn from_registration(decoded: &DecodedRegistration) -> Result<Self> {
        let sig = decoded
            .attestation_object
            .att_stmt
            .sig
            .as_deref()
            .ok_or(PasskeyError::MissingField {
                stage: "attestation statement",
                field: "sig",
            })?;

        Self::build(
            &decoded.authenticator_data_raw,
            &decoded.client_data_json,
            sig,
            decoded.authenticator_data.credential_public_key(),
        )
    }

    pub fn r(&self) -> &[u8] {
        &self.signature[0]
    }

    pub fn s(&self) -> &[u8] {
        &self.signature[1]
    }
}

/// `SHA-256(authenticatorData || SHA-256(clientDataJSON))`
pub fn message_hash(authenticator_data: &[u8], client_data_json: &[u8]) -> [u8; 32] {
    let client_data_hash = Sha256::digest(client_data_json);
    let mut hasher = Sha256::new();
    hasher.update(authenticator_data);
    hasher.update(client_data_hash);
    hasher.finalize().into()
}

fn serialize_pair<S: Serializer>(
    pair: &[Vec<u8>; 2],
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    [hex_prefixed::encode(&pair[0]), hex_prefixed::encode(&pair[1])].serialize(serializer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::KeyTypePolicy;
    use ciborium::value::Value;

    const DER_5_7: [u8; 8] = [0x30, 0x06, 0x02, 0x01, 0x05, 0x02, 0x01, 0x07];

    fn synthetic_auth_data() -> Vec<u8> {
        let mut data = vec![0u8; 32];
        data.push(0x45);
        data.extend_from_slice(&1u32.to_be_bytes());
        data
    }

    #[test]
    fn test_message_hash_composition() {
        let auth_data = synthetic_auth_data();
        let client_data = br#"{"type":"webauthn.get","challenge":"AA","origin":"x"}"#;

        let mut preimage = auth_data.clone();
        preimage.extend_from_slice(&Sha256::digest(client_data));
        let expected: [u8; 32] = Sha256::digest(&preimage).into();

        let input = VerificationInput::build(&auth_data, client_data, &DER_5_7, None).unwrap();
        assert_eq!(input.message_hash, expected);
        assert_eq!(input.r(), &[0x05]);
        assert_eq!(input.s(), &[0x07]);
    }

    #[test]
    fn test_missing_key_yields_empty_coordinates() {
        let input = VerificationInput::build(&synthetic_auth_data(), b"{}", &DER_5_7, None).unwrap();
        let json = serde_json::to_value(&input).unwrap();
        assert_eq!(json["signature"], serde_json::json!(["0x05", "0x07"]));
        assert_eq!(json["publicKeyCoordinates"], serde_json::json!(["0x", "0x"]));
        assert!(json["messageHash"].as_str().unwrap().starts_with("0x"));
    }

    #[test]
    fn test_okp_key_has_no_y() {
        let okp = Value::Map(vec![
            (Value::Integer(1.into()), Value::Integer(1.into())),
            (Value::Integer((-1).into()), Value::Integer(6.into())),
            (Value::Integer((-2).into()), Value::Bytes(vec![0x0A; 32])),
        ]);
        let key = CoseKey::from_value(&okp, KeyTypePolicy::Lenient).unwrap();

        let input =
            VerificationInput::build(&synthetic_auth_data(), b"{}", &DER_5_7, Some(&key)).unwrap();
        assert_eq!(input.public_key_coordinates, [vec![0x0A; 32], Vec::new()]);
    }

    #[test]
    fn test_bad_signature_fails() {
        let err = VerificationInput::build(&synthetic_auth_data(), b"{}", &[0x30, 0x00], None).unwrap_err();
        assert!(matches!(err, PasskeyError::MalformedSignature(_)));
    }
}
