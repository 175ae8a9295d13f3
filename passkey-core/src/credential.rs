//! Credential responses as serialized by the browser (`PublicKeyCredential.toJSON()`).

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::attestation::AttestationObject;
use crate::authenticator_data::AuthenticatorData;
use crate::base64url;
use crate::client_data::ClientData;
use crate::config::KeyTypePolicy;
use crate::error::{PasskeyError, Result};

const STAGE: &str = "credential";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatorAssertionResponseJson {
    #[serde(rename = "clientDataJSON", default)]
    pub client_data_json: Option<String>,
    #[serde(default)]
    pub authenticator_data: Option<String>,
    #[serde(default)]
    pub signature: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_handle: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationResponseJson {
    pub id: String,
    pub raw_id: String,
    pub response: AuthenticatorAssertionResponseJson,
    #[serde(rename = "type", default = "public_key_type")]
    pub credential_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authenticator_attachment: Option<String>,
    #[serde(default)]
    pub client_extension_results: serde_json::Value,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatorAttestationResponseJson {
    #[serde(rename = "clientDataJSON", default)]
    pub client_data_json: Option<String>,
    #[serde(default)]
    pub attestation_object: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authenticator_data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transports: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key_algorithm: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationResponseJson {
    pub id: String,
    pub raw_id: String,
    pub response: AuthenticatorAttestationResponseJson,
    #[serde(rename = "type", default = "public_key_type")]
    pub credential_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authenticator_attachment: Option<String>,
    #[serde(default)]
    pub client_extension_results: serde_json::Value,
}

fn public_key_type() -> String {
    "public-key".to_string()
}

/// A decoded assertion. Raw byte fields are kept next to their decoded form
/// because the signature covers the exact bytes the browser produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedAuthentication {
    pub id: String,
    #[serde(serialize_with = "base64url::serialize")]
    pub raw_id: Vec<u8>,
    #[serde(rename = "clientDataJSON")]
    pub client_data: ClientData,
    #[serde(skip)]
    pub client_data_json: Vec<u8>,
    pub authenticator_data: AuthenticatorData,
    #[serde(skip)]
    pub authenticator_data_raw: Vec<u8>,
    #[serde(serialize_with = "base64url::serialize")]
    pub signature: Vec<u8>,
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "base64url::serialize_opt")]
    pub user_handle: Option<Vec<u8>>,
}

/// A decoded attestation (registration) response.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedRegistration {
    pub id: String,
    #[serde(serialize_with = "base64url::serialize")]
    pub raw_id: Vec<u8>,
    #[serde(rename = "clientDataJSON")]
    pub client_data: ClientData,
    #[serde(skip)]
    pub client_data_json: Vec<u8>,
    pub attestation_object: AttestationObject,
    /// Parsed from `attestationObject.authData`
    pub authenticator_data: AuthenticatorData,
    /// The bytes covered by the attestation signature
    #[serde(skip)]
    pub authenticator_data_raw: Vec<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transports: Option<Vec<String>>,
}

fn required<'a>(field: &'a Option<String>, name: &'static str) -> Result<&'a str> {
    field
        .as_deref()
        .ok_or(PasskeyError::MissingField { stage: STAGE, field: name })
}

#[instrument(skip_all, fields(id = %credential.id))]
pub fn decode_authentication_credential(
    credential: &AuthenticationResponseJson,
    policy: KeyTypePolicy,
) -> Result<DecodedAuthentication> {
    let response = &credential.response;
    let client_data_b64 = required(&response.client_data_json, "clientDataJSON")?;
    let authenticator_data_b64 = required(&response.authenticator_data, "authenticatorData")?;
    let signature_b64 = required(&response.signature, "signature")?;

    let client_data_json = base64url::decode(client_data_b64)
        .map_err(|e| PasskeyError::MalformedClientData(e.to_string()))?;
    let client_data = ClientData::from_json_bytes(&client_data_json)?;

    let authenticator_data_raw = base64url::decode(authenticator_data_b64)?;
    let authenticator_data = AuthenticatorData::parse(&authenticator_data_raw, policy)?;

    let signature = base64url::decode(signature_b64)?;
    let user_handle = response
        .user_handle
        .as_deref()
        .map(base64url::decode)
        .transpose()?;

    debug!(
        ceremony = %client_data.ceremony_type,
        origin = %client_data.origin,
        counter = authenticator_data.counter,
        "Decoded authentication credential"
    );

    Ok(DecodedAuthentication {
        id: credential.id.clone(),
        raw_id: base64url::decode(&credential.raw_id)?,
        client_data,
        client_data_json,
        authenticator_data,
        authenticator_data_raw,
        signature,
        user_handle,
    })
}

#[instrument(skip_all, fields(id = %credential.id))]
pub fn decode_registration_credential(
    credential: &RegistrationResponseJson,
    policy: KeyTypePolicy,
) -> Result<DecodedRegistration> {
    let response = &credential.response;
    let client_data_b64 = required(&response.client_data_json, "clientDataJSON")?;
    let attestation_b64 = required(&response.attestation_object, "attestationObject")?;

    let client_data_json = base64url::decode(client_data_b64)
        .map_err(|e| PasskeyError::MalformedClientData(e.to_string()))?;
    let client_data = ClientData::from_json_bytes(&client_data_json)?;

    let attestation_object = AttestationObject::from_cbor(&base64url::decode(attestation_b64)?)?;
    let authenticator_data = AuthenticatorData::parse(&attestation_object.auth_data, policy)?;

    // Browsers that expose getAuthenticatorData() send the same bytes again
    let authenticator_data_raw = match response.authenticator_data.as_deref() {
        Some(encoded) => base64url::decode(encoded)?,
        None => attestation_object.auth_data.clone(),
    };

    debug!(
        fmt = attestation_object.format.as_str(),
        ceremony = %client_data.ceremony_type,
        "Decoded registration credential"
    );

    Ok(DecodedRegistration {
        id: credential.id.clone(),
        raw_id: base64url::decode(&credential.raw_id)?,
        client_data,
        client_data_json,
        attestation_object,
        authenticator_data,
        authenticator_data_raw,
        transports: response.transports.clone(),
    })
}
