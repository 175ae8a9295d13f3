//! Synthetic ceremony responses shared by the CLI tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use ciborium::value::Value;
use passkey_core::{base64url, CoseKey, KeyTypePolicy, LoginServicePayload, LoginServiceRequest};

pub const USER_OP_HASH_HEX: &str =
    "0x5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a";
pub const USER_OP_HASH: [u8; 32] = [0x5A; 32];
pub const CREDENTIAL_ID: [u8; 4] = [0xDE, 0xAD, 0xBE, 0xEF];
pub const CREDENTIAL_ID_HEX: &str = "0xdeadbeef";
pub const DER_5_7: [u8; 8] = [0x30, 0x06, 0x02, 0x01, 0x05, 0x02, 0x01, 0x07];

/// Get a Command for the passkey binary, with colours off.
pub fn passkey() -> Command {
    let mut cmd: Command = cargo_bin_cmd!("passkey").into();
    cmd.env("NO_COLOR", "1").env_remove("RUST_LOG");
    cmd
}

fn client_data_json(kind: &str) -> String {
    format!(
        r#"{{"type":"{kind}","challenge":"{}","origin":"http://localhost:5173","crossOrigin":false}}"#,
        base64url::encode(USER_OP_HASH)
    )
}

fn auth_data_prefix(flags: u8, counter: u32) -> Vec<u8> {
    let mut data = vec![0u8; 32];
    data.push(flags);
    data.extend_from_slice(&counter.to_be_bytes());
    data
}

fn p256_key() -> Value {
    Value::Map(vec![
        (Value::Integer(1.into()), Value::Integer(2.into())),
        (Value::Integer(3.into()), Value::Integer((-7).into())),
        (Value::Integer((-1).into()), Value::Integer(1.into())),
        (Value::Integer((-2).into()), Value::Bytes(vec![0x11; 32])),
        (Value::Integer((-3).into()), Value::Bytes(vec![0x22; 32])),
    ])
}

fn attestation_object(sig: bool) -> Vec<u8> {
    let mut auth_data = auth_data_prefix(0x45, 0);
    auth_data.extend_from_slice(&[0u8; 16]);
    auth_data.extend_from_slice(&(CREDENTIAL_ID.len() as u16).to_be_bytes());
    auth_data.extend_from_slice(&CREDENTIAL_ID);
    ciborium::into_writer(&p256_key(), &mut auth_data).unwrap();

    let mut statement = vec![(Value::Text("alg".into()), Value::Integer((-7).into()))];
    if sig {
        statement.push((Value::Text("sig".into()), Value::Bytes(DER_5_7.to_vec())));
    }
    let object = Value::Map(vec![
        (Value::Text("fmt".into()), Value::Text(if sig { "packed" } else { "none" }.into())),
        (Value::Text("attStmt".into()), Value::Map(statement)),
        (Value::Text("authData".into()), Value::Bytes(auth_data)),
    ]);

    let mut bytes = Vec::new();
    ciborium::into_writer(&object, &mut bytes).unwrap();
    bytes
}

pub fn authentication_json() -> serde_json::Value {
    serde_json::json!({
        "id": base64url::encode(CREDENTIAL_ID),
        "rawId": base64url::encode(CREDENTIAL_ID),
        "type": "public-key",
        "response": {
            "clientDataJSON": base64url::encode(client_data_json("webauthn.get")),
            "authenticatorData": base64url::encode(auth_data_prefix(0x05, 7)),
            "signature": base64url::encode(DER_5_7),
            "userHandle": "dXNlcg",
        },
        "clientExtensionResults": {}
    })
}

pub fn registration_json(sig: bool) -> serde_json::Value {
    serde_json::json!({
        "id": base64url::encode(CREDENTIAL_ID),
        "rawId": base64url::encode(CREDENTIAL_ID),
        "type": "public-key",
        "response": {
            "clientDataJSON": base64url::encode(client_data_json("webauthn.create")),
            "attestationObject": base64url::encode(attestation_object(sig)),
            "transports": ["internal"],
        },
        "clientExtensionResults": {}
    })
}

pub fn write_json(dir: &Path, name: &str, json: &serde_json::Value) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, serde_json::to_vec_pretty(json).unwrap()).unwrap();
    path
}

/// A login service blob for the fixture passkey, as hex.
pub fn login_service_blob_hex() -> String {
    let key = CoseKey::from_value(&p256_key(), KeyTypePolicy::Lenient).unwrap();
    let request = LoginServiceRequest::new("alice@example.com", &CREDENTIAL_ID, &key);
    let blob = LoginServicePayload {
        claim: request.claim().unwrap(),
        signature: vec![0x1C; 65],
    };
    format!("0x{}", hex::encode(blob.encode()))
}
