//! Login-service boundary.
//!
//! The login service binds a human login to a passkey: it receives the
//! credential id and public key coordinates, signs
//! `keccak256(abi.encode(bytes1(LOGIN_SERVICE), login, credId, coordinates))`
//! with an EIP-191 personal signature, and returns the ABI tuple
//! `(bytes1, string, bytes, uint256[2], bytes signature)`. The wallet
//! contract recovers the signer from that blob at creation time.

use alloy_primitives::{Bytes, FixedBytes, U256};
use alloy_sol_types::SolValue;
use serde::{Deserialize, Serialize, Serializer};
use sha3::{Digest, Keccak256};

use crate::cose::CoseKey;
use crate::error::{PasskeyError, Result};
use crate::hex_prefixed;
use crate::payload::SignatureVariant;

type ClaimTuple = (FixedBytes<1>, String, Bytes, [U256; 2]);
type PayloadTuple = (FixedBytes<1>, String, Bytes, [U256; 2], Bytes);

const EIP191_PREFIX: &[u8] = b"\x19Ethereum Signed Message:\n32";

/// Body of `POST /login`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginServiceRequest {
    pub login: String,
    /// `0x`-prefixed credential id
    pub cred_id: String,
    /// `0x`-prefixed `x` and `y`
    pub pub_key_coordinates: [String; 2],
}

impl LoginServiceRequest {
    pub fn new(login: impl Into<String>, credential_id: &[u8], public_key: &CoseKey) -> Self {
        let (x, y) = public_key.coordinates();
        Self {
            login: login.into(),
            cred_id: hex_prefixed::encode(credential_id),
            pub_key_coordinates: [hex_prefixed::encode(x), hex_prefixed::encode(y)],
        }
    }

    /// The claim the service will sign for this request.
    pub fn claim(&self) -> Result<LoginServiceClaim> {
        let credential_id = hex_prefixed::decode(&self.cred_id)?;
        let [x, y] = &self.pub_key_coordinates;
        Ok(LoginServiceClaim {
            login: self.login.clone(),
            credential_id,
            coordinates: [coordinate(x)?, coordinate(y)?],
        })
    }
}

fn coordinate(text: &str) -> Result<U256> {
    let bytes = hex_prefixed::decode(text)?;
    U256::try_from_be_slice(&bytes).ok_or_else(|| {
        PasskeyError::InvalidEncoding(format!("coordinate is {} bytes, at most 32 allowed", bytes.len()))
    })
}

/// What the login service attests to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginServiceClaim {
    pub login: String,
    #[serde(rename = "credId", serialize_with = "hex_prefixed::serialize")]
    pub credential_id: Vec<u8>,
    #[serde(rename = "pubKeyCoordinates", serialize_with = "serialize_coordinates")]
    pub coordinates: [U256; 2],
}

impl LoginServiceClaim {
    fn tuple(&self) -> ClaimTuple {
        (
            FixedBytes([SignatureVariant::LoginService.tag()]),
            self.login.clone(),
            Bytes::copy_from_slice(&self.credential_id),
            self.coordinates,
        )
    }

    /// `keccak256(abi.encode(bytes1(2), login, credId, coordinates))`
    pub fn message(&self) -> [u8; 32] {
        Keccak256::digest(self.tuple().abi_encode_params()).into()
    }

    /// The EIP-191 digest the service's key actually signs.
    pub fn eth_signed_message_hash(&self) -> [u8; 32] {
        let mut hasher = Keccak256::new();
        hasher.update(EIP191_PREFIX);
        hasher.update(self.message());
        hasher.finalize().into()
    }
}

/// A decoded login-service response blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginServicePayload {
    #[serde(flatten)]
    pub claim: LoginServiceClaim,
    #[serde(serialize_with = "hex_prefixed::serialize")]
    pub signature: Vec<u8>,
}

impl LoginServicePayload {
    pub fn decode(blob: &[u8]) -> Result<Self> {
        let (tag, login, credential_id, coordinates, signature) =
            PayloadTuple::abi_decode_params(blob)
                .map_err(|e| PasskeyError::MalformedLoginServicePayload(e.to_string()))?;

        if tag[0] != SignatureVariant::LoginService.tag() {
            return Err(PasskeyError::MalformedLoginServicePayload(format!(
                "expected LOGIN_SERVICE tag, found {:#04x}",
                tag[0]
            )));
        }

        Ok(Self {
            claim: LoginServiceClaim {
                login,
                credential_id: credential_id.to_vec(),
                coordinates,
            },
            signature: signature.to_vec(),
        })
    }

    pub fn encode(&self) -> Vec<u8> {
        let (tag, login, credential_id, coordinates) = self.claim.tuple();
        let tuple: PayloadTuple = (
            tag,
            login,
            credential_id,
            coordinates,
            Bytes::copy_from_slice(&self.signature),
        );
        tuple.abi_encode_params()
    }

    pub fn claim(&self) -> &LoginServiceClaim {
        &self.claim
    }
}

fn serialize_coordinates<S: Serializer>(
    coordinates: &[U256; 2],
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    [
        hex_prefixed::encode(coordinates[0].to_be_bytes::<32>()),
        hex_prefixed::encode(coordinates[1].to_be_bytes::<32>()),
    ]
    .serialize(serializer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::KeyTypePolicy;
    use ciborium::value::Value;

    fn p256_key() -> CoseKey {
        let map = Value::Map(vec![
            (Value::Integer(1.into()), Value::Integer(2.into())),
            (Value::Integer((-1).into()), Value::Integer(1.into())),
            (Value::Integer((-2).into()), Value::Bytes(vec![0x01; 32])),
            (Value::Integer((-3).into()), Value::Bytes(vec![0x02; 32])),
        ]);
        CoseKey::from_value(&map, KeyTypePolicy::Lenient).unwrap()
    }

    fn sample_payload() -> LoginServicePayload {
        let request = LoginServiceRequest::new("alice", &[0xCA, 0xFE], &p256_key());
        LoginServicePayload {
            claim: request.claim().unwrap(),
            signature: vec![0x1B; 65],
        }
    }

    #[test]
    fn test_request_body() {
        let request = LoginServiceRequest::new("alice", &[0xCA, 0xFE], &p256_key());
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["login"], "alice");
        assert_eq!(json["credId"], "0xcafe");
        assert_eq!(json["pubKeyCoordinates"][0], format!("0x{}", "01".repeat(32)));
        assert_eq!(json["pubKeyCoordinates"][1], format!("0x{}", "02".repeat(32)));
    }

    #[test]
    fn test_claim_message_layout() {
        let claim = sample_payload().claim;
        let encoded = claim.tuple().abi_encode_params();

        assert_eq!(encoded[0], SignatureVariant::LoginService.tag());
        // Head: tag, string offset, bytes offset, then the two inline coordinates
        assert_eq!(encoded[3 * 32..4 * 32], [0x01; 32]);
        assert_eq!(encoded[4 * 32..5 * 32], [0x02; 32]);
        assert_eq!(claim.message(), <[u8; 32]>::from(Keccak256::digest(&encoded)));
    }

    #[test]
    fn test_eth_signed_message_hash() {
        let claim = sample_payload().claim;
        let mut preimage = b"\x19Ethereum Signed Message:\n32".to_vec();
        preimage.extend_from_slice(&claim.message());
        let expected: [u8; 32] = Keccak256::digest(&preimage).into();
        assert_eq!(claim.eth_signed_message_hash(), expected);
        assert_ne!(claim.eth_signed_message_hash(), claim.message());
    }

    #[test]
    fn test_decode_blob() {
        let payload = sample_payload();
        let decoded = LoginServicePayload::decode(&payload.encode()).unwrap();
        assert_eq!(decoded.claim().login, "alice");
        assert_eq!(decoded.claim().credential_id, vec![0xCA, 0xFE]);
        assert_eq!(decoded.signature.len(), 65);
        assert_eq!(decoded, payload);
    }

    #[test]
    fn test_decode_rejects_wrong_tag() {
        let (_, login, credential_id, coordinates) = sample_payload().claim.tuple();
        let blob: PayloadTuple = (
            FixedBytes([SignatureVariant::WebauthnUnpacked.tag()]),
            login,
            credential_id,
            coordinates,
            Bytes::new(),
        );
        let err = LoginServicePayload::decode(&blob.abi_encode_params()).unwrap_err();
        assert!(matches!(err, PasskeyError::MalformedLoginServicePayload(_)));
    }

    #[test]
    fn test_decode_rejects_truncated_blob() {
        let blob = sample_payload().encode();
        assert!(LoginServicePayload::decode(&blob[..64]).is_err());
    }
}
