//! End-to-end tests: browser credential JSON in, wallet signature bytes out.

use alloy_primitives::U256;
use ciborium::value::Value;
use sha2::{Digest, Sha256};

use passkey_core::base64url;
use passkey_core::{
    challenge_prefix_len, decode_authentication_credential, decode_registration_credential,
    encode_authentication_signature, encode_registration_signature, AuthenticationResponseJson,
    KeyTypePolicy, LoginServicePayload, LoginServiceRequest, MemoryStorage, PasskeyError,
    RegistrationResponseJson, SignatureVariant, VerificationInput, WalletSession,
    WebAuthnSignaturePayload,
};

const USER_OP_HASH: [u8; 32] = [0x5A; 32];
const DER_5_7: [u8; 8] = [0x30, 0x06, 0x02, 0x01, 0x05, 0x02, 0x01, 0x07];
const CREDENTIAL_ID: [u8; 4] = [0xDE, 0xAD, 0xBE, 0xEF];

fn auth_data_prefix(flags: u8, counter: u32) -> Vec<u8> {
    let mut data = vec![0u8; 32];
    data.push(flags);
    data.extend_from_slice(&counter.to_be_bytes());
    data
}

fn client_data_json(kind: &str) -> Vec<u8> {
    format!(
        r#"{{"type":"{kind}","challenge":"{}","origin":"http://localhost:5173","crossOrigin":false}}"#,
        base64url::encode(USER_OP_HASH)
    )
    .into_bytes()
}

fn p256_cose_key() -> Value {
    Value::Map(vec![
        (Value::Integer(1.into()), Value::Integer(2.into())),
        (Value::Integer(3.into()), Value::Integer((-7).into())),
        (Value::Integer((-1).into()), Value::Integer(1.into())),
        (Value::Integer((-2).into()), Value::Bytes(vec![0x11; 32])),
        (Value::Integer((-3).into()), Value::Bytes(vec![0x22; 32])),
    ])
}

fn attested_auth_data() -> Vec<u8> {
    let mut data = auth_data_prefix(0x45, 0);
    data.extend_from_slice(&[0u8; 16]);
    data.extend_from_slice(&(CREDENTIAL_ID.len() as u16).to_be_bytes());
    data.extend_from_slice(&CREDENTIAL_ID);
    ciborium::into_writer(&p256_cose_key(), &mut data).unwrap();
    data
}

fn attestation_object(sig: Option<&[u8]>) -> Vec<u8> {
    let mut statement = vec![(Value::Text("alg".into()), Value::Integer((-7).into()))];
    if let Some(sig) = sig {
        statement.push((Value::Text("sig".into()), Value::Bytes(sig.to_vec())));
    }
    let format = if sig.is_some() { "packed" } else { "none" };
    let object = Value::Map(vec![
        (Value::Text("fmt".into()), Value::Text(format.into())),
        (Value::Text("attStmt".into()), Value::Map(statement)),
        (Value::Text("authData".into()), Value::Bytes(attested_auth_data())),
    ]);

    let mut bytes = Vec::new();
    ciborium::into_writer(&object, &mut bytes).unwrap();
    bytes
}

fn authentication_credential(auth_data: &[u8]) -> AuthenticationResponseJson {
    serde_json::from_value(serde_json::json!({
        "id": base64url::encode(CREDENTIAL_ID),
        "rawId": base64url::encode(CREDENTIAL_ID),
        "type": "public-key",
        "response": {
            "clientDataJSON": base64url::encode(client_data_json("webauthn.get")),
            "authenticatorData": base64url::encode(auth_data),
            "signature": base64url::encode(DER_5_7),
        },
        "clientExtensionResults": {}
    }))
    .unwrap()
}

fn registration_credential(sig: Option<&[u8]>) -> RegistrationResponseJson {
    serde_json::from_value(serde_json::json!({
        "id": base64url::encode(CREDENTIAL_ID),
        "rawId": base64url::encode(CREDENTIAL_ID),
        "type": "public-key",
        "response": {
            "clientDataJSON": base64url::encode(client_data_json("webauthn.create")),
            "attestationObject": base64url::encode(attestation_object(sig)),
            "transports": ["internal", "hybrid"],
        },
        "clientExtensionResults": {}
    }))
    .unwrap()
}

fn login_service_blob(public_key: &passkey_core::CoseKey) -> Vec<u8> {
    let request = LoginServiceRequest::new("alice@example.com", &CREDENTIAL_ID, public_key);
    LoginServicePayload {
        claim: request.claim().unwrap(),
        signature: vec![0x1C; 65],
    }
    .encode()
}

#[test]
fn test_synthetic_ceremony_builds_verifier_input_and_payload() {
    let auth_data = auth_data_prefix(0x45, 1);
    assert_eq!(auth_data.len(), 37);
    let client_data = client_data_json("webauthn.get");

    let input = VerificationInput::build(&auth_data, &client_data, &DER_5_7, None).unwrap();
    let mut preimage = auth_data.clone();
    preimage.extend_from_slice(&Sha256::digest(&client_data));
    assert_eq!(input.message_hash, <[u8; 32]>::from(Sha256::digest(&preimage)));
    assert_eq!(input.r(), [0x05]);
    assert_eq!(input.s(), [0x07]);

    let payload = WebAuthnSignaturePayload::from_ceremony(
        SignatureVariant::WebauthnUnpacked,
        auth_data[32],
        &auth_data,
        &client_data,
        &DER_5_7,
        &USER_OP_HASH,
        &CREDENTIAL_ID,
    )
    .unwrap();
    let encoded = payload.encode();
    let bytes = encoded.as_bytes();

    assert_eq!(bytes[0], SignatureVariant::WebauthnUnpacked.tag(), "variant tag leads");
    assert_eq!(bytes[32], 0x45, "flags mask is the second head word");
    assert_eq!(payload.r, U256::from(5));
    assert_eq!(payload.s, U256::from(7));
}

#[test]
fn test_authentication_credential_to_signature() {
    let credential = authentication_credential(&auth_data_prefix(0x05, 7));
    let decoded = decode_authentication_credential(&credential, KeyTypePolicy::Lenient).unwrap();
    assert_eq!(decoded.authenticator_data.counter, 7);
    assert!(decoded.authenticator_data.credential_public_key().is_none());

    let encoded = encode_authentication_signature(&decoded, &USER_OP_HASH, &CREDENTIAL_ID).unwrap();
    let payload = WebAuthnSignaturePayload::decode(encoded.as_bytes()).unwrap();

    assert_eq!(payload.variant, SignatureVariant::WebauthnUnpacked);
    assert_eq!(payload.flags_mask, 0x05);
    assert_eq!(payload.challenge, USER_OP_HASH.to_vec());
    assert_eq!(payload.trailer, CREDENTIAL_ID.to_vec());
    assert_eq!(
        payload.challenge_prefix_len,
        challenge_prefix_len(&decoded.client_data_json, &USER_OP_HASH).unwrap() as u64
    );
    assert_eq!(
        &payload.client_data_json[payload.challenge_prefix_len as usize..][..43],
        base64url::encode(USER_OP_HASH).as_bytes(),
        "prefix length points at the challenge"
    );
}

#[test]
fn test_encoding_is_deterministic() {
    let credential = authentication_credential(&auth_data_prefix(0x05, 1));
    let first = decode_authentication_credential(&credential, KeyTypePolicy::Lenient).unwrap();
    let second = decode_authentication_credential(&credential, KeyTypePolicy::Lenient).unwrap();

    assert_eq!(
        encode_authentication_signature(&first, &USER_OP_HASH, &CREDENTIAL_ID).unwrap(),
        encode_authentication_signature(&second, &USER_OP_HASH, &CREDENTIAL_ID).unwrap()
    );
}

#[test]
fn test_wrong_user_op_hash_is_rejected() {
    let credential = authentication_credential(&auth_data_prefix(0x05, 1));
    let decoded = decode_authentication_credential(&credential, KeyTypePolicy::Lenient).unwrap();

    let err = encode_authentication_signature(&decoded, &[0x00; 32], &CREDENTIAL_ID).unwrap_err();
    assert!(matches!(err, PasskeyError::ChallengeNotFound { .. }));
}

#[test]
fn test_registration_with_attestation_signature() {
    let credential = registration_credential(Some(&DER_5_7));
    let decoded = decode_registration_credential(&credential, KeyTypePolicy::Strict).unwrap();
    let public_key = decoded.authenticator_data.credential_public_key().unwrap();
    assert_eq!(public_key.coordinates(), (&[0x11; 32][..], &[0x22; 32][..]));

    let input = VerificationInput::from_registration(&decoded).unwrap();
    assert_eq!(input.public_key_coordinates, [vec![0x11; 32], vec![0x22; 32]]);

    let blob = login_service_blob(public_key);
    let signature = encode_registration_signature(&decoded, &USER_OP_HASH, &blob).unwrap();
    assert_eq!(signature.variant(), SignatureVariant::WebauthnUnpackedWithLoginService);

    let payload = WebAuthnSignaturePayload::decode(signature.encoded().as_bytes()).unwrap();
    assert_eq!(payload.trailer, blob, "login service blob rides as the trailer");
    assert_eq!(payload.authenticator_data, decoded.authenticator_data_raw);

    let login = LoginServicePayload::decode(&payload.trailer).unwrap();
    assert_eq!(login.claim().login, "alice@example.com");
    assert_eq!(login.claim().coordinates, [U256::from_be_bytes([0x11; 32]), U256::from_be_bytes([0x22; 32])]);
}

#[test]
fn test_registration_without_attestation_signature() {
    let credential = registration_credential(None);
    let decoded = decode_registration_credential(&credential, KeyTypePolicy::Lenient).unwrap();
    let public_key = decoded.authenticator_data.credential_public_key().unwrap().clone();
    let blob = login_service_blob(&public_key);

    let signature = encode_registration_signature(&decoded, &USER_OP_HASH, &blob).unwrap();
    assert_eq!(signature.variant(), SignatureVariant::LoginService);
    assert_eq!(signature.into_encoded().into_bytes(), blob, "blob passes through untouched");

    assert!(matches!(
        VerificationInput::from_registration(&decoded),
        Err(PasskeyError::MissingField { field: "sig", .. })
    ));
}

#[test]
fn test_registration_updates_session() {
    let credential = registration_credential(None);
    let decoded = decode_registration_credential(&credential, KeyTypePolicy::Lenient).unwrap();

    let storage = MemoryStorage::new();
    WalletSession::default()
        .with_wallet_address("0x00000000000000000000000000000000000000aa")
        .with_registration(&decoded)
        .persist(&storage)
        .unwrap();

    let restored = WalletSession::load(&storage).unwrap();
    assert_eq!(restored.passkey_id.as_deref(), Some("0xdeadbeef"));
    assert_eq!(
        restored.passkey_coordinates,
        Some([base64url::encode([0x11; 32]), base64url::encode([0x22; 32])])
    );
    assert!(restored.wallet_address.is_none());
}

#[test]
fn test_strict_policy_rejects_unknown_key_type() {
    let mut data = auth_data_prefix(0x45, 0);
    data.extend_from_slice(&[0u8; 16]);
    data.extend_from_slice(&1u16.to_be_bytes());
    data.push(0x01);
    let key = Value::Map(vec![(Value::Integer(1.into()), Value::Integer(99.into()))]);
    ciborium::into_writer(&key, &mut data).unwrap();

    let object = Value::Map(vec![
        (Value::Text("fmt".into()), Value::Text("none".into())),
        (Value::Text("attStmt".into()), Value::Map(vec![])),
        (Value::Text("authData".into()), Value::Bytes(data)),
    ]);
    let mut bytes = Vec::new();
    ciborium::into_writer(&object, &mut bytes).unwrap();

    let mut json = serde_json::to_value(registration_credential(None)).unwrap();
    json["response"]["attestationObject"] = base64url::encode(&bytes).into();
    let credential: RegistrationResponseJson = serde_json::from_value(json).unwrap();

    assert!(decode_registration_credential(&credential, KeyTypePolicy::Lenient).is_ok());
    assert!(matches!(
        decode_registration_credential(&credential, KeyTypePolicy::Strict),
        Err(PasskeyError::UnsupportedKeyType(99))
    ));
}
