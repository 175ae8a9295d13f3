//! Encode commands: user operation signatures for the wallet contract.

use std::path::PathBuf;

use anyhow::{Context, Result};
use colored::Colorize;
use passkey_core::{
    encode_authentication_signature, encode_registration_signature, EncodedSignature,
    SignatureVariant,
};
use serde::Serialize;
use tracing::info;

use crate::utils::{self, print_field, print_header};
use crate::{Options, OutputFormat};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EncodeReport<'a> {
    variant: SignatureVariant,
    length: usize,
    signature: &'a EncodedSignature,
}

/// Execute the encode command (authentication path).
pub fn execute(file: PathBuf, user_op_hash: &str, credential_id: &str, options: Options) -> Result<()> {
    let user_op_hash = utils::parse_user_op_hash(user_op_hash)?;
    let credential_id = utils::parse_hex(credential_id, "--credential-id")?;

    let json = utils::read_credential_json(&file)?;
    let decoded = utils::decode_authentication(json, options.key_type_policy)?;

    let signature = encode_authentication_signature(&decoded, &user_op_hash, &credential_id)
        .context("Failed to encode signature")?;
    info!(len = signature.as_bytes().len(), "Encoded authentication signature");

    report(SignatureVariant::WebauthnUnpacked, &signature, options)
}

/// Execute the encode-registration command (wallet creation path).
pub fn execute_registration(
    file: PathBuf,
    user_op_hash: &str,
    login_service_blob: &str,
    options: Options,
) -> Result<()> {
    let user_op_hash = utils::parse_user_op_hash(user_op_hash)?;
    let blob = utils::parse_hex(login_service_blob, "--login-service-blob")?;

    let json = utils::read_credential_json(&file)?;
    let decoded = utils::decode_registration(json, options.key_type_policy)?;

    let signature = encode_registration_signature(&decoded, &user_op_hash, &blob)
        .context("Failed to encode signature")?;
    info!(variant = ?signature.variant(), "Encoded registration signature");

    report(signature.variant(), signature.encoded(), options)
}

fn report(variant: SignatureVariant, signature: &EncodedSignature, options: Options) -> Result<()> {
    match options.format {
        OutputFormat::Json => utils::print_json(&EncodeReport {
            variant,
            length: signature.as_bytes().len(),
            signature,
        }),
        OutputFormat::Text if options.quiet => {
            println!("{}", signature.to_hex());
            Ok(())
        }
        OutputFormat::Text => {
            print_header("User operation signature");
            print_field("Variant", format!("{variant:?} ({})", variant.tag()).green());
            print_field("Length", format!("{} bytes", signature.as_bytes().len()));
            println!();
            println!("{}", signature.to_hex());
            Ok(())
        }
    }
}
