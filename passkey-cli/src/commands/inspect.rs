//! Inspect command implementation.

use anyhow::{Context, Result};
use colored::Colorize;
use passkey_core::{
    hex_prefixed, AuthenticatorData, LoginServicePayload, SignatureVariant,
    WebAuthnSignaturePayload,
};
use serde::Serialize;
use tracing::{debug, warn};

use crate::utils::{self, print_field, print_header};
use crate::{Options, OutputFormat};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginServiceReport<'a> {
    #[serde(flatten)]
    payload: &'a LoginServicePayload,
    message: String,
    eth_signed_message_hash: String,
}

impl<'a> LoginServiceReport<'a> {
    fn new(payload: &'a LoginServicePayload) -> Self {
        Self {
            payload,
            message: hex_prefixed::encode(payload.claim().message()),
            eth_signed_message_hash: hex_prefixed::encode(payload.claim().eth_signed_message_hash()),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PayloadReport<'a> {
    #[serde(flatten)]
    payload: &'a WebAuthnSignaturePayload,
    #[serde(skip_serializing_if = "Option::is_none")]
    login_service: Option<LoginServiceReport<'a>>,
}

/// Execute the inspect command.
pub fn execute(payload_hex: &str, login_service: bool, options: Options) -> Result<()> {
    let bytes = utils::parse_hex(payload_hex, "payload hex")?;
    debug!(len = bytes.len(), login_service, "Inspecting payload");

    if login_service {
        let payload =
            LoginServicePayload::decode(&bytes).context("Failed to decode login service blob")?;
        let report = LoginServiceReport::new(&payload);
        return match options.format {
            OutputFormat::Json => utils::print_json(&report),
            OutputFormat::Text => {
                print_login_service(&report, options.quiet);
                Ok(())
            }
        };
    }

    let payload =
        WebAuthnSignaturePayload::decode(&bytes).context("Failed to decode signature payload")?;

    // The trailer of a wallet-creation payload is itself a login service blob
    let embedded = if payload.variant == SignatureVariant::WebauthnUnpackedWithLoginService {
        match LoginServicePayload::decode(&payload.trailer) {
            Ok(blob) => Some(blob),
            Err(e) => {
                warn!(error = %e, "Trailer is not a login service blob");
                None
            }
        }
    } else {
        None
    };

    let report = PayloadReport {
        payload: &payload,
        login_service: embedded.as_ref().map(LoginServiceReport::new),
    };

    match options.format {
        OutputFormat::Json => utils::print_json(&report),
        OutputFormat::Text => {
            print_payload(&report, options);
            Ok(())
        }
    }
}

fn print_payload(report: &PayloadReport<'_>, options: Options) {
    let payload = report.payload;
    if options.quiet {
        println!("{:?}", payload.variant);
        return;
    }

    print_header("Signature payload");
    print_field("Variant", format!("{:?} ({})", payload.variant, payload.variant.tag()).green());
    print_field("Flags", format!("{:#04x}", payload.flags_mask));
    print_field("Challenge", hex_prefixed::encode(&payload.challenge));
    print_field("Challenge prefix", payload.challenge_prefix_len);
    print_field("r", format!("{:#x}", payload.r));
    print_field("s", format!("{:#x}", payload.s));

    print_field("Authenticator data", hex_prefixed::encode(&payload.authenticator_data));
    match AuthenticatorData::parse(&payload.authenticator_data, options.key_type_policy) {
        Ok(auth_data) => {
            print_field("  Counter", auth_data.counter);
        }
        Err(e) => print_field("  Parse", e.to_string().yellow()),
    }
    print_field(
        "Client data",
        String::from_utf8_lossy(&payload.client_data_json),
    );

    match &report.login_service {
        Some(login) => print_login_service(login, false),
        None => print_field("Trailer", hex_prefixed::encode(&payload.trailer)),
    }
}

fn print_login_service(report: &LoginServiceReport<'_>, quiet: bool) {
    let claim = report.payload.claim();
    if quiet {
        println!("{}", report.eth_signed_message_hash);
        return;
    }

    print_header("Login service blob");
    print_field("Login", &claim.login);
    print_field("Credential id", hex_prefixed::encode(&claim.credential_id));
    print_field("x", format!("{:#x}", claim.coordinates[0]));
    print_field("y", format!("{:#x}", claim.coordinates[1]));
    print_field("Message", &report.message);
    print_field("Signed hash", &report.eth_signed_message_hash);
    print_field("Signature", hex_prefixed::encode(&report.payload.signature));
}
