//! Common utility functions shared across CLI commands.

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use passkey_core::{
    decode_authentication_credential, decode_registration_credential, hex_prefixed,
    AuthenticationResponseJson, AuthenticatorFlags, DecodedAuthentication, DecodedRegistration,
    KeyTypePolicy, RegistrationResponseJson,
};
use serde::Serialize;
use tracing::{debug, info};

/// Which ceremony a credential response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ceremony {
    Authentication,
    Registration,
}

impl Ceremony {
    /// Registration responses are the ones carrying an attestation object.
    pub fn detect(json: &serde_json::Value) -> Self {
        if json.pointer("/response/attestationObject").is_some() {
            Self::Registration
        } else {
            Self::Authentication
        }
    }
}

/// Read a credential response file as JSON.
pub fn read_credential_json(path: &Path) -> Result<serde_json::Value> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read file: {}", path.display()))?;
    info!(path = %path.display(), bytes = bytes.len(), "Read credential response");

    serde_json::from_slice(&bytes)
        .with_context(|| format!("Failed to parse credential JSON: {}", path.display()))
}

pub fn decode_authentication(
    json: serde_json::Value,
    policy: KeyTypePolicy,
) -> Result<DecodedAuthentication> {
    let credential: AuthenticationResponseJson =
        serde_json::from_value(json).context("Not an authentication response")?;
    let decoded = decode_authentication_credential(&credential, policy)
        .context("Failed to decode authentication response")?;
    debug!(id = %decoded.id, "Decoded authentication response");
    Ok(decoded)
}

pub fn decode_registration(
    json: serde_json::Value,
    policy: KeyTypePolicy,
) -> Result<DecodedRegistration> {
    let credential: RegistrationResponseJson =
        serde_json::from_value(json).context("Not a registration response")?;
    let decoded = decode_registration_credential(&credential, policy)
        .context("Failed to decode registration response")?;
    debug!(id = %decoded.id, "Decoded registration response");
    Ok(decoded)
}

/// Parse a `0x`-prefixed 32-byte user operation hash.
pub fn parse_user_op_hash(text: &str) -> Result<[u8; 32]> {
    hex_prefixed::decode_fixed::<32>(text).context("Invalid --user-op-hash")
}

pub fn parse_hex(text: &str, what: &str) -> Result<Vec<u8>> {
    hex_prefixed::decode(text.trim()).with_context(|| format!("Invalid {what}"))
}

/// Pretty-print any report as JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize report")?;
    println!("{json}");
    Ok(())
}

pub fn print_header(title: &str) {
    println!();
    println!("{}", title.cyan().bold());
}

pub fn print_field(label: &str, value: impl std::fmt::Display) {
    println!("   {} {}", format!("{label}:").dimmed(), value);
}

/// Names of the set flags, e.g. `UP UV AT`.
pub fn format_flags(flags: &AuthenticatorFlags, mask: u8) -> String {
    let names: Vec<&str> = [
        (flags.user_present, "UP"),
        (flags.user_verified, "UV"),
        (flags.backup_eligible, "BE"),
        (flags.backup_status, "BS"),
        (flags.attested_data_present, "AT"),
        (flags.extension_data_present, "ED"),
    ]
    .into_iter()
    .filter_map(|(set, name)| set.then_some(name))
    .collect();

    format!("{mask:#04x} [{}]", names.join(" "))
}
