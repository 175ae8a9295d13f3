//! Signature payloads for the smart-contract wallet's `validateUserOp`.
//!
//! The wallet dispatches on a one-byte [`SignatureVariant`] tag. WebAuthn
//! variants are the Solidity tuple
//!
//! ```text
//! (bytes1 tag, bytes1 flags, bytes authData, bytes clientDataJSON,
//!  bytes challenge, uint256 challengePrefixLen, uint256 r, uint256 s, bytes trailer)
//! ```
//!
//! encoded with `abi.encode`, i.e. as a parameter list without an outer
//! offset. The verifier is immutable once deployed: any change to this
//! layout locks existing wallets out.

use alloy_primitives::{Bytes, FixedBytes, U256};
use alloy_sol_types::SolValue;
use serde::{Serialize, Serializer};
use tracing::{debug, instrument};

use crate::base64url;
use crate::credential::{DecodedAuthentication, DecodedRegistration};
use crate::der::DerSignature;
use crate::error::{PasskeyError, Result};
use crate::hex_prefixed;

type WebAuthnTuple = (
    FixedBytes<1>,
    FixedBytes<1>,
    Bytes,
    Bytes,
    Bytes,
    U256,
    U256,
    U256,
    Bytes,
);

/// Discriminant the wallet contract switches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum SignatureVariant {
    None = 0,
    WebauthnUnpacked = 1,
    LoginService = 2,
    WebauthnUnpackedWithLoginService = 3,
}

impl SignatureVariant {
    pub const fn tag(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for SignatureVariant {
    type Error = PasskeyError;

    fn try_from(tag: u8) -> Result<Self> {
        match tag {
            0 => Ok(Self::None),
            1 => Ok(Self::WebauthnUnpacked),
            2 => Ok(Self::LoginService),
            3 => Ok(Self::WebauthnUnpackedWithLoginService),
            other => Err(PasskeyError::MalformedPayload(format!(
                "unknown signature variant tag {other:#04x}"
            ))),
        }
    }
}

/// The final signature bytes handed to the bundler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedSignature(Vec<u8>);

impl EncodedSignature {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn to_hex(&self) -> String {
        hex_prefixed::encode(&self.0)
    }
}

impl AsRef<[u8]> for EncodedSignature {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Serialize for EncodedSignature {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

/// Byte offset of the base64url-encoded challenge inside the raw client
/// data. The contract slices the JSON at this offset instead of parsing it.
pub fn challenge_prefix_len(client_data_json: &[u8], challenge: &[u8; 32]) -> Result<usize> {
    let needle = base64url::encode(challenge);
    client_data_json
        .windows(needle.len())
        .position(|window| window == needle.as_bytes())
        .ok_or(PasskeyError::ChallengeNotFound { challenge: needle })
}

/// The fields of a WebAuthn signature payload, in wire order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebAuthnSignaturePayload {
    pub variant: SignatureVariant,
    #[serde(serialize_with = "serialize_byte")]
    pub flags_mask: u8,
    #[serde(serialize_with = "hex_prefixed::serialize")]
    pub authenticator_data: Vec<u8>,
    #[serde(rename = "clientDataJSON", serialize_with = "hex_prefixed::serialize")]
    pub client_data_json: Vec<u8>,
    #[serde(serialize_with = "hex_prefixed::serialize")]
    pub challenge: Vec<u8>,
    pub challenge_prefix_len: u64,
    #[serde(serialize_with = "serialize_u256")]
    pub r: U256,
    #[serde(serialize_with = "serialize_u256")]
    pub s: U256,
    #[serde(serialize_with = "hex_prefixed::serialize")]
    pub trailer: Vec<u8>,
}

impl WebAuthnSignaturePayload {
    /// Assemble a payload from ceremony output. Fails when the challenge is
    /// not in the client data or the signature does not decode.
    pub fn from_ceremony(
        variant: SignatureVariant,
        flags_mask: u8,
        authenticator_data: &[u8],
        client_data_json: &[u8],
        der_signature: &[u8],
        user_op_hash: &[u8; 32],
        trailer: &[u8],
    ) -> Result<Self> {
        let prefix_len = challenge_prefix_len(client_data_json, user_op_hash)?;
        let DerSignature { r, s } = DerSignature::decode(der_signature)?;

        Ok(Self {
            variant,
            flags_mask,
            authenticator_data: authenticator_data.to_vec(),
            client_data_json: client_data_json.to_vec(),
            challenge: user_op_hash.to_vec(),
            challenge_prefix_len: prefix_len as u64,
            r: to_u256(&r, "r")?,
            s: to_u256(&s, "s")?,
            trailer: trailer.to_vec(),
        })
    }

    pub fn encode(&self) -> EncodedSignature {
        let tuple: WebAuthnTuple = (
            FixedBytes([self.variant.tag()]),
            FixedBytes([self.flags_mask]),
            Bytes::copy_from_slice(&self.authenticator_data),
            Bytes::copy_from_slice(&self.client_data_json),
            Bytes::copy_from_slice(&self.challenge),
            U256::from(self.challenge_prefix_len),
            self.r,
            self.s,
            Bytes::copy_from_slice(&self.trailer),
        );
        EncodedSignature(tuple.abi_encode_params())
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let (tag, flags, auth_data, client_data, challenge, prefix_len, r, s, trailer) =
            WebAuthnTuple::abi_decode_params(bytes)
                .map_err(|e| PasskeyError::MalformedPayload(e.to_string()))?;

        let variant = SignatureVariant::try_from(tag[0])?;
        if !matches!(
            variant,
            SignatureVariant::WebauthnUnpacked | SignatureVariant::WebauthnUnpackedWithLoginService
        ) {
            return Err(PasskeyError::MalformedPayload(format!(
                "{variant:?} is not a WebAuthn payload"
            )));
        }

        let challenge_prefix_len = u64::try_from(prefix_len).map_err(|_| {
            PasskeyError::MalformedPayload("challengePrefixLen does not fit in 64 bits".into())
        })?;

        Ok(Self {
            variant,
            flags_mask: flags[0],
            authenticator_data: auth_data.to_vec(),
            client_data_json: client_data.to_vec(),
            challenge: challenge.to_vec(),
            challenge_prefix_len,
            r,
            s,
            trailer: trailer.to_vec(),
        })
    }
}

fn to_u256(value: &[u8], name: &str) -> Result<U256> {
    U256::try_from_be_slice(value).ok_or_else(|| {
        PasskeyError::MalformedSignature(format!("{name} is {} bytes, at most 32 allowed", value.len()))
    })
}

fn serialize_byte<S: Serializer>(byte: &u8, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&format!("{byte:#04x}"))
}

fn serialize_u256<S: Serializer>(value: &U256, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&format!("{value:#x}"))
}

/// Authentication path: the trailer is the credential id the wallet was
/// created with.
#[instrument(skip_all)]
pub fn encode_authentication_signature(
    decoded: &DecodedAuthentication,
    user_op_hash: &[u8; 32],
    credential_id: &[u8],
) -> Result<EncodedSignature> {
    let payload = WebAuthnSignaturePayload::from_ceremony(
        SignatureVariant::WebauthnUnpacked,
        decoded.authenticator_data.flags_mask,
        &decoded.authenticator_data_raw,
        &decoded.client_data_json,
        &decoded.signature,
        user_op_hash,
        credential_id,
    )?;

    let encoded = payload.encode();
    debug!(
        challenge_prefix_len = payload.challenge_prefix_len,
        len = encoded.as_bytes().len(),
        "Encoded authentication signature"
    );
    Ok(encoded)
}

/// Outcome of [`encode_registration_signature`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationSignature {
    /// The attestation was signed directly; the WebAuthn fields travel
    /// alongside the login-service blob.
    WebauthnWithLoginService(EncodedSignature),
    /// No attestation signature; the login-service blob is the signature.
    LoginServiceOnly(EncodedSignature),
}

impl RegistrationSignature {
    pub fn variant(&self) -> SignatureVariant {
        match self {
            Self::WebauthnWithLoginService(_) => SignatureVariant::WebauthnUnpackedWithLoginService,
            Self::LoginServiceOnly(_) => SignatureVariant::LoginService,
        }
    }

    pub fn encoded(&self) -> &EncodedSignature {
        match self {
            Self::WebauthnWithLoginService(encoded) | Self::LoginServiceOnly(encoded) => encoded,
        }
    }

    pub fn into_encoded(self) -> EncodedSignature {
        match self {
            Self::WebauthnWithLoginService(encoded) | Self::LoginServiceOnly(encoded) => encoded,
        }
    }
}

/// Registration path (wallet creation).
#[instrument(skip_all)]
pub fn encode_registration_signature(
    decoded: &DecodedRegistration,
    user_op_hash: &[u8; 32],
    login_service_blob: &[u8],
) -> Result<RegistrationSignature> {
    let Some(sig) = decoded.attestation_object.att_stmt.sig.as_deref() else {
        debug!("No attestation signature, passing the login service blob through");
        return Ok(RegistrationSignature::LoginServiceOnly(EncodedSignature(
            login_service_blob.to_vec(),
        )));
    };

    let payload = WebAuthnSignaturePayload::from_ceremony(
        SignatureVariant::WebauthnUnpackedWithLoginService,
        decoded.authenticator_data.flags_mask,
        &decoded.authenticator_data_raw,
        &decoded.client_data_json,
        sig,
        user_op_hash,
        login_service_blob,
    )?;

    debug!(
        challenge_prefix_len = payload.challenge_prefix_len,
        "Encoded registration signature"
    );
    Ok(RegistrationSignature::WebauthnWithLoginService(payload.encode()))
}
