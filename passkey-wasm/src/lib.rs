//! WebAssembly bindings for passkey ceremony decoding.
//!
//! The front end hands over the credential JSON it got from
//! `navigator.credentials` and receives either a decoded report or the
//! `userOp.signature` hex, without a server round trip.
//!
//! Every function returns a JSON string. Failures are reported as
//! `{"error": "..."}` and never panic across the Wasm boundary.

use passkey_core::{
    decode_authentication_credential, decode_registration_credential,
    encode_authentication_signature, encode_registration_signature, hex_prefixed,
    AuthenticationResponseJson, KeyTypePolicy, PipelineConfig, RegistrationResponseJson,
    SignatureVariant, VerificationInput,
};
use serde::Serialize;
use wasm_bindgen::prelude::*;

/// Initialize panic hook for better error messages in browser console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

#[derive(Serialize)]
struct ErrorResult {
    error: String,
}

/// Result of the encode functions.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodeResult {
    pub variant: SignatureVariant,
    /// `0x`-prefixed `userOp.signature`
    pub signature: String,
}

type WasmResult<T> = Result<T, String>;

fn policy(strict_keys: bool) -> KeyTypePolicy {
    if strict_keys {
        KeyTypePolicy::Strict
    } else {
        PipelineConfig::default().key_type_policy
    }
}

fn to_json<T: Serialize>(result: WasmResult<T>) -> String {
    let error = match result {
        Ok(value) => match serde_json::to_string(&value) {
            Ok(json) => return json,
            Err(e) => format!("Serialization error: {e}"),
        },
        Err(e) => e,
    };
    serde_json::to_string(&ErrorResult { error })
        .unwrap_or_else(|_| r#"{"error":"Unknown error"}"#.to_string())
}

fn parse_authentication(json: &str, strict_keys: bool) -> WasmResult<passkey_core::DecodedAuthentication> {
    let credential: AuthenticationResponseJson =
        serde_json::from_str(json).map_err(|e| format!("Failed to parse credential: {e}"))?;
    decode_authentication_credential(&credential, policy(strict_keys)).map_err(|e| e.to_string())
}

fn parse_registration(json: &str, strict_keys: bool) -> WasmResult<passkey_core::DecodedRegistration> {
    let credential: RegistrationResponseJson =
        serde_json::from_str(json).map_err(|e| format!("Failed to parse credential: {e}"))?;
    decode_registration_credential(&credential, policy(strict_keys)).map_err(|e| e.to_string())
}

fn parse_user_op_hash(user_op_hash: &str) -> WasmResult<[u8; 32]> {
    hex_prefixed::decode_fixed::<32>(user_op_hash).map_err(|e| format!("Invalid userOpHash: {e}"))
}

/// Decode an authentication (assertion) response.
#[wasm_bindgen]
pub fn decode_authentication_wasm(credential_json: &str, strict_keys: bool) -> String {
    to_json(parse_authentication(credential_json, strict_keys))
}

/// Decode a registration (attestation) response.
#[wasm_bindgen]
pub fn decode_registration_wasm(credential_json: &str, strict_keys: bool) -> String {
    to_json(parse_registration(credential_json, strict_keys))
}

/// Build the on-chain verifier input.
///
/// `credential_json` may be an assertion or a registration response. For an
/// assertion, `registration_json` supplies the public key; pass an empty
/// string when it is not at hand.
#[wasm_bindgen]
pub fn verification_input_wasm(
    credential_json: &str,
    registration_json: &str,
    strict_keys: bool,
) -> String {
    to_json(verification_input_internal(credential_json, registration_json, strict_keys))
}

fn is_registration(credential_json: &str) -> WasmResult<bool> {
    let value: serde_json::Value = serde_json::from_str(credential_json)
        .map_err(|e| format!("Failed to parse credential: {e}"))?;
    Ok(value.pointer("/response/attestationObject").is_some())
}

fn verification_input_internal(
    credential_json: &str,
    registration_json: &str,
    strict_keys: bool,
) -> WasmResult<VerificationInput> {
    if is_registration(credential_json)? {
        let registration = parse_registration(credential_json, strict_keys)?;
        return VerificationInput::from_registration(&registration).map_err(|e| e.to_string());
    }

    let public_key = if registration_json.trim().is_empty() {
        None
    } else {
        parse_registration(registration_json, strict_keys)?
            .authenticator_data
            .credential_public_key()
            .cloned()
    };

    let authentication = parse_authentication(credential_json, strict_keys)?;
    VerificationInput::from_authentication(&authentication, public_key.as_ref())
        .map_err(|e| e.to_string())
}

/// Encode an assertion as a `WEBAUTHN_UNPACKED` user operation signature.
#[wasm_bindgen]
pub fn encode_authentication_wasm(
    credential_json: &str,
    user_op_hash: &str,
    credential_id: &str,
    strict_keys: bool,
) -> String {
    to_json(encode_authentication_internal(
        credential_json,
        user_op_hash,
        credential_id,
        strict_keys,
    ))
}

fn encode_authentication_internal(
    credential_json: &str,
    user_op_hash: &str,
    credential_id: &str,
    strict_keys: bool,
) -> WasmResult<EncodeResult> {
    let user_op_hash = parse_user_op_hash(user_op_hash)?;
    let credential_id =
        hex_prefixed::decode(credential_id).map_err(|e| format!("Invalid credentialId: {e}"))?;
    let decoded = parse_authentication(credential_json, strict_keys)?;

    let signature = encode_authentication_signature(&decoded, &user_op_hash, &credential_id)
        .map_err(|e| e.to_string())?;
    Ok(EncodeResult {
        variant: SignatureVariant::WebauthnUnpacked,
        signature: signature.to_hex(),
    })
}

/// Encode a registration for wallet creation.
#[wasm_bindgen]
pub fn encode_registration_wasm(
    credential_json: &str,
    user_op_hash: &str,
    login_service_blob: &str,
    strict_keys: bool,
) -> String {
    to_json(encode_registration_internal(
        credential_json,
        user_op_hash,
        login_service_blob,
        strict_keys,
    ))
}

fn encode_registration_internal(
    credential_json: &str,
    user_op_hash: &str,
    login_service_blob: &str,
    strict_keys: bool,
) -> WasmResult<EncodeResult> {
    let user_op_hash = parse_user_op_hash(user_op_hash)?;
    let blob = hex_prefixed::decode(login_service_blob)
        .map_err(|e| format!("Invalid login service blob: {e}"))?;
    let decoded = parse_registration(credential_json, strict_keys)?;

    let signature =
        encode_registration_signature(&decoded, &user_op_hash, &blob).map_err(|e| e.to_string())?;
    Ok(EncodeResult {
        variant: signature.variant(),
        signature: signature.encoded().to_hex(),
    })
}

/// Get the library version.
#[wasm_bindgen]
pub fn get_version() -> String {
    passkey_core::VERSION.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ciborium::value::Value;
    use passkey_core::base64url;

    const USER_OP_HASH: [u8; 32] = [0x42; 32];
    const DER_5_7: [u8; 8] = [0x30, 0x06, 0x02, 0x01, 0x05, 0x02, 0x01, 0x07];

    fn user_op_hash_hex() -> String {
        hex_prefixed::encode(USER_OP_HASH)
    }

    fn client_data(kind: &str) -> String {
        base64url::encode(format!(
            r#"{{"type":"{kind}","challenge":"{}","origin":"https://wallet.example"}}"#,
            base64url::encode(USER_OP_HASH)
        ))
    }

    fn assertion_json() -> String {
        let mut auth_data = vec![0u8; 32];
        auth_data.push(0x05);
        auth_data.extend_from_slice(&1u32.to_be_bytes());

        serde_json::json!({
            "id": "AQID",
            "rawId": "AQID",
            "type": "public-key",
            "response": {
                "clientDataJSON": client_data("webauthn.get"),
                "authenticatorData": base64url::encode(auth_data),
                "signature": base64url::encode(DER_5_7),
            },
            "clientExtensionResults": {}
        })
        .to_string()
    }

    fn registration_json() -> String {
        registration_json_with_key(Value::Map(vec![
            (Value::Integer(1.into()), Value::Integer(2.into())),
            (Value::Integer((-1).into()), Value::Integer(1.into())),
            (Value::Integer((-2).into()), Value::Bytes(vec![0x0A; 32])),
            (Value::Integer((-3).into()), Value::Bytes(vec![0x0B; 32])),
        ]))
    }

    // kty 4 (Symmetric) is not a signing key this pipeline knows
    fn symmetric_key_registration_json() -> String {
        registration_json_with_key(Value::Map(vec![
            (Value::Integer(1.into()), Value::Integer(4.into())),
            (Value::Integer((-1).into()), Value::Bytes(vec![1])),
        ]))
    }

    fn registration_json_with_key(key: Value) -> String {
        let mut auth_data = vec![0u8; 32];
        auth_data.push(0x45);
        auth_data.extend_from_slice(&[0u8; 4 + 16]);
        auth_data.extend_from_slice(&3u16.to_be_bytes());
        auth_data.extend_from_slice(&[1, 2, 3]);
        ciborium::into_writer(&key, &mut auth_data).unwrap();

        let object = Value::Map(vec![
            (Value::Text("fmt".into()), Value::Text("none".into())),
            (Value::Text("attStmt".into()), Value::Map(vec![])),
            (Value::Text("authData".into()), Value::Bytes(auth_data)),
        ]);
        let mut attestation = Vec::new();
        ciborium::into_writer(&object, &mut attestation).unwrap();

        serde_json::json!({
            "id": "AQID",
            "rawId": "AQID",
            "type": "public-key",
            "response": {
                "clientDataJSON": client_data("webauthn.create"),
                "attestationObject": base64url::encode(attestation),
            },
            "clientExtensionResults": {}
        })
        .to_string()
    }

    fn parse(json: &str) -> serde_json::Value {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_get_version() {
        let version = get_version();
        assert!(!version.is_empty());
        assert!(version.contains('.'));
    }

    #[test]
    fn test_decode_authentication() {
        let result = parse(&decode_authentication_wasm(&assertion_json(), false));
        assert!(result.get("error").is_none(), "unexpected error: {result}");
        assert_eq!(result["authenticatorData"]["counter"], 1);
    }

    #[test]
    fn test_decode_invalid_json_reports_error() {
        let result = parse(&decode_authentication_wasm("not json", false));
        assert!(result["error"].as_str().unwrap().contains("Failed to parse credential"));
    }

    #[test]
    fn test_decode_registration() {
        let result = parse(&decode_registration_wasm(&registration_json(), true));
        assert!(result.get("error").is_none(), "unexpected error: {result}");
        assert_eq!(result["attestationObject"]["fmt"], "none");
    }

    #[test]
    fn test_verification_input_with_public_key() {
        let result = parse(&verification_input_wasm(&assertion_json(), &registration_json(), false));
        assert_eq!(result["signature"][0], "0x05");
        assert_eq!(result["publicKeyCoordinates"][0], format!("0x{}", "0a".repeat(32)));
    }

    #[test]
    fn test_verification_input_without_public_key() {
        let result = parse(&verification_input_wasm(&assertion_json(), "", false));
        assert_eq!(result["publicKeyCoordinates"][0], "0x");
    }

    #[test]
    fn test_encode_authentication() {
        let result = parse(&encode_authentication_wasm(
            &assertion_json(),
            &user_op_hash_hex(),
            "0x010203",
            true,
        ));
        assert_eq!(result["variant"], "WEBAUTHN_UNPACKED");
        assert!(result["signature"].as_str().unwrap().starts_with("0x01"));
    }

    #[test]
    fn test_encode_authentication_bad_hash() {
        let result = parse(&encode_authentication_wasm(&assertion_json(), "0x1234", "0x01", false));
        assert!(result["error"].as_str().unwrap().contains("Invalid userOpHash"));
    }

    #[test]
    fn test_encode_registration_passes_blob_through() {
        let result = parse(&encode_registration_wasm(
            &registration_json(),
            &user_op_hash_hex(),
            "0xcafe",
            false,
        ));
        assert_eq!(result["variant"], "LOGIN_SERVICE");
        assert_eq!(result["signature"], "0xcafe");
    }

    #[test]
    fn test_strict_keys_applies_to_encode_and_verification_input() {
        let credential = symmetric_key_registration_json();

        let lenient = parse(&encode_registration_wasm(&credential, &user_op_hash_hex(), "0xcafe", false));
        assert_eq!(lenient["signature"], "0xcafe");

        let strict = parse(&encode_registration_wasm(&credential, &user_op_hash_hex(), "0xcafe", true));
        assert!(strict["error"].as_str().unwrap().contains("Unsupported COSE key type: 4"));

        let strict = parse(&verification_input_wasm(&assertion_json(), &credential, true));
        assert!(strict["error"].as_str().unwrap().contains("Unsupported COSE key type: 4"));

        let lenient = parse(&verification_input_wasm(&assertion_json(), &credential, false));
        assert_eq!(lenient["publicKeyCoordinates"][0], "0x");
    }

    #[test]
    fn test_verification_input_detects_ceremony_by_field_not_text() {
        let mut assertion = parse(&assertion_json());
        assertion["clientExtensionResults"] = serde_json::json!({
            "note": "\"attestationObject\" is only present on registration"
        });
        let assertion = assertion.to_string();
        assert!(assertion.contains("\"attestationObject\""));

        let result = parse(&verification_input_wasm(&assertion, &registration_json(), false));
        assert!(result.get("error").is_none(), "unexpected error: {result}");
        assert_eq!(result["signature"][0], "0x05");

        // a real registration takes the attestation path, which needs `attStmt.sig`
        let result = parse(&verification_input_wasm(&registration_json(), "", false));
        assert!(result["error"].as_str().unwrap().contains("Missing field `sig`"));
    }

    #[test]
    fn test_verification_input_invalid_json_reports_error() {
        let result = parse(&verification_input_wasm("{", "", false));
        assert!(result["error"].as_str().unwrap().contains("Failed to parse credential"));
    }
}
