//! Verify-input command implementation.
//!
//! Prints exactly what the on-chain P-256 verifier is called with. Nothing
//! is verified here.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use colored::Colorize;
use passkey_core::{hex_prefixed, CoseKey, KeyTypePolicy, VerificationInput};
use tracing::{debug, warn};

use crate::utils::{self, print_field, print_header, Ceremony};
use crate::{Options, OutputFormat};

/// Execute the verify-input command.
pub fn execute(file: PathBuf, public_key_file: Option<PathBuf>, options: Options) -> Result<()> {
    let json = utils::read_credential_json(&file)?;

    let input = match Ceremony::detect(&json) {
        Ceremony::Registration => {
            if public_key_file.is_some() {
                warn!("Registration responses carry their own public key, ignoring --public-key");
            }
            let decoded = utils::decode_registration(json, options.key_type_policy)?;
            VerificationInput::from_registration(&decoded)
                .context("Failed to build verification input")?
        }
        Ceremony::Authentication => {
            let public_key = public_key_file
                .as_deref()
                .map(|path| load_public_key(path, options.key_type_policy))
                .transpose()?;
            let decoded = utils::decode_authentication(json, options.key_type_policy)?;
            VerificationInput::from_authentication(&decoded, public_key.as_ref())
                .context("Failed to build verification input")?
        }
    };

    match options.format {
        OutputFormat::Json => utils::print_json(&input)?,
        OutputFormat::Text if options.quiet => {
            println!("{}", hex_prefixed::encode(input.message_hash));
        }
        OutputFormat::Text => print_input(&input),
    }
    Ok(())
}

/// Public key of the passkey, taken from its registration response.
fn load_public_key(path: &Path, policy: KeyTypePolicy) -> Result<CoseKey> {
    let json = utils::read_credential_json(path)?;
    let registration = utils::decode_registration(json, policy)?;
    let key = registration
        .authenticator_data
        .credential_public_key()
        .cloned()
        .with_context(|| format!("No attested public key in {}", path.display()))?;
    debug!(key_type = key.key_type_name().unwrap_or("unknown"), "Loaded public key");
    Ok(key)
}

fn print_input(input: &VerificationInput) {
    print_header("Verifier input");
    print_field("Message hash", hex_prefixed::encode(input.message_hash));
    print_field("r", hex_prefixed::encode(input.r()));
    print_field("s", hex_prefixed::encode(input.s()));

    let [x, y] = &input.public_key_coordinates;
    if x.is_empty() && y.is_empty() {
        print_field("Public key", "not available (pass --public-key)".yellow());
    } else {
        print_field("x", hex_prefixed::encode(x));
        print_field("y", hex_prefixed::encode(y));
    }
}
