//! Decode command implementation.

use std::path::PathBuf;

use anyhow::Result;
use colored::Colorize;
use passkey_core::{
    base64url, hex_prefixed, AttestationStatement, AuthenticatorData, ClientData, CoseKey,
    DecodedAuthentication, DecodedRegistration,
};
use tracing::info;

use crate::utils::{self, print_field, print_header, Ceremony};
use crate::{Options, OutputFormat};

/// Execute the decode command.
pub fn execute(file: PathBuf, force_registration: bool, options: Options) -> Result<()> {
    let json = utils::read_credential_json(&file)?;

    let ceremony = if force_registration {
        Ceremony::Registration
    } else {
        Ceremony::detect(&json)
    };
    info!(?ceremony, "Decoding credential response");

    match ceremony {
        Ceremony::Authentication => {
            let decoded = utils::decode_authentication(json, options.key_type_policy)?;
            match options.format {
                OutputFormat::Json => utils::print_json(&decoded),
                OutputFormat::Text => {
                    print_authentication(&decoded, options.quiet);
                    Ok(())
                }
            }
        }
        Ceremony::Registration => {
            let decoded = utils::decode_registration(json, options.key_type_policy)?;
            match options.format {
                OutputFormat::Json => utils::print_json(&decoded),
                OutputFormat::Text => {
                    print_registration(&decoded, options.quiet);
                    Ok(())
                }
            }
        }
    }
}

fn print_authentication(decoded: &DecodedAuthentication, quiet: bool) {
    if quiet {
        println!("{}", hex_prefixed::encode(&decoded.raw_id));
        return;
    }

    print_header("Authentication response");
    print_field("Credential id", hex_prefixed::encode(&decoded.raw_id));
    if let Some(user_handle) = &decoded.user_handle {
        print_field("User handle", base64url::encode(user_handle));
    }
    print_client_data(&decoded.client_data);
    print_authenticator_data(&decoded.authenticator_data);

    print_header("Signature");
    print_field("DER", hex_prefixed::encode(&decoded.signature));
}

fn print_registration(decoded: &DecodedRegistration, quiet: bool) {
    if quiet {
        println!("{}", hex_prefixed::encode(&decoded.raw_id));
        return;
    }

    print_header("Registration response");
    print_field("Credential id", hex_prefixed::encode(&decoded.raw_id));
    if let Some(transports) = &decoded.transports {
        print_field("Transports", transports.join(", "));
    }
    print_client_data(&decoded.client_data);
    print_authenticator_data(&decoded.authenticator_data);
    print_statement(
        decoded.attestation_object.format.as_str(),
        &decoded.attestation_object.att_stmt,
    );
}

fn print_client_data(client_data: &ClientData) {
    print_header("Client data");
    print_field("Type", &client_data.ceremony_type);
    print_field("Challenge", &client_data.challenge);
    print_field("Origin", &client_data.origin);
    if let Some(cross_origin) = client_data.cross_origin {
        print_field("Cross origin", cross_origin);
    }
    if let Some(token_binding) = &client_data.token_binding {
        print_field("Token binding", &token_binding.status);
    }
}

fn print_authenticator_data(auth_data: &AuthenticatorData) {
    print_header("Authenticator data");
    print_field("RP ID hash", hex_prefixed::encode(auth_data.rp_id_hash));
    print_field("Flags", utils::format_flags(&auth_data.flags, auth_data.flags_mask));
    print_field("Counter", auth_data.counter);

    if let Some(attested) = &auth_data.attested_credential {
        print_field("AAGUID", hex_prefixed::encode(attested.aaguid));
        print_field("Credential id", hex_prefixed::encode(&attested.credential_id));
        print_public_key(&attested.parsed_credential_public_key);
    }
}

fn print_public_key(key: &CoseKey) {
    print_header("Credential public key");
    print_field("Key type", key.key_type_name().unwrap_or("unknown"));
    match key.algorithm() {
        Some(alg) => print_field(
            "Algorithm",
            format!("{} ({alg})", key.algorithm_name().unwrap_or("unknown")),
        ),
        None => print_field("Algorithm", "none".dimmed()),
    }

    match key {
        CoseKey::Unknown { kty } => {
            print_field("Fields", format!("not decoded (kty {kty})").yellow());
        }
        CoseKey::Rsa { modulus, exponent, .. } => {
            print_field("Modulus", format!("{} bits", modulus.len() * 8));
            print_field("Exponent", exponent);
        }
        _ => {
            let (x, y) = key.coordinates();
            print_field("x", hex_prefixed::encode(x));
            if !y.is_empty() {
                print_field("y", hex_prefixed::encode(y));
            }
        }
    }
}

fn print_statement(format: &str, statement: &AttestationStatement) {
    print_header("Attestation statement");
    print_field("Format", format);
    if let Some(alg) = statement.alg {
        print_field("Algorithm", format!("{} ({alg})", statement.alg_name().unwrap_or("unknown")));
    }
    if let Some(sig) = &statement.sig {
        print_field("Signature", hex_prefixed::encode(sig));
    }
    if let Some(ver) = &statement.ver {
        print_field("Version", ver);
    }
    for (index, cert) in statement.x5c.iter().flatten().enumerate() {
        print_field(&format!("x5c[{index}]"), &cert.subject);
        print_field("  Issuer", &cert.issuer);
        print_field("  Valid", format!("{} to {}", cert.not_before, cert.not_after));
    }
    if let Some(response) = &statement.response {
        print_field("SafetyNet certificates", response.header.x5c.len());
    }
    if statement.cert_info.is_some() || statement.pub_area.is_some() {
        print_field("TPM", "certInfo/pubArea present (not decoded)".dimmed());
    }
    if !statement.has_direct_signature() {
        print_field(
            "Note",
            "no attestation signature; wallet creation relies on the login service".yellow(),
        );
    }
}
