//! Passkey CLI - debugger for WebAuthn ceremony responses and wallet signatures.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use passkey_core::{KeyTypePolicy, PipelineConfig};
use tracing_subscriber::{fmt, EnvFilter};

mod commands;
mod exit_codes;
mod utils;

use exit_codes::ExitCode;

const EXIT_CODES_HELP: &str = "\
Exit codes:
  0   Success
  1   General error
  64  Usage error (invalid arguments)
  65  Malformed credential response, payload or hex input
  66  Input file not found or unreadable";

#[derive(Parser)]
#[command(name = "passkey")]
#[command(author, version, about = "Passkey ceremony decoder and wallet signature encoder", long_about = None)]
#[command(after_help = EXIT_CODES_HELP)]
struct Cli {
    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Only print the essential value (hex payload, hash)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Reject unknown COSE key types instead of leaving them undecoded
    #[arg(long, global = true)]
    strict_keys: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Settings every command receives.
#[derive(Debug, Clone, Copy)]
pub struct Options {
    pub format: OutputFormat,
    pub quiet: bool,
    pub key_type_policy: KeyTypePolicy,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a credential response and print its structures
    Decode {
        /// Credential response JSON (as returned by navigator.credentials)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Decode as a registration response (otherwise detected from the attestation object)
        #[arg(long)]
        registration: bool,
    },

    /// Build the on-chain verifier input: message hash, (r, s) and (x, y)
    VerifyInput {
        /// Credential response JSON
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Registration response holding the passkey's public key
        #[arg(long, value_name = "REGISTRATION_FILE")]
        public_key: Option<PathBuf>,
    },

    /// Encode an authentication response as a user operation signature
    Encode {
        /// Authentication response JSON
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// User operation hash the passkey signed (0x-prefixed, 32 bytes)
        #[arg(long, value_name = "HEX")]
        user_op_hash: String,

        /// Credential id the wallet was created with (hex)
        #[arg(long, value_name = "HEX")]
        credential_id: String,
    },

    /// Encode a registration response for wallet creation
    EncodeRegistration {
        /// Registration response JSON
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// User operation hash the passkey signed (0x-prefixed, 32 bytes)
        #[arg(long, value_name = "HEX")]
        user_op_hash: String,

        /// Signed blob returned by the login service (hex)
        #[arg(long, value_name = "HEX")]
        login_service_blob: String,
    },

    /// Decode an encoded signature payload or a login service blob
    Inspect {
        /// Payload bytes (hex)
        #[arg(value_name = "HEX")]
        payload: String,

        /// Decode as a login service blob
        #[arg(long)]
        login_service: bool,
    },
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("passkey_core=debug,passkey=debug,info"),
        _ => EnvFilter::new("passkey_core=trace,passkey=trace,debug"),
    };

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose > 0)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let config = PipelineConfig::from_env();
    let options = Options {
        format: cli.format,
        quiet: cli.quiet,
        key_type_policy: if cli.strict_keys {
            KeyTypePolicy::Strict
        } else {
            config.key_type_policy
        },
    };

    match cli.command {
        Commands::Decode { file, registration } => {
            commands::decode::execute(file, registration, options)
        }
        Commands::VerifyInput { file, public_key } => {
            commands::verify_input::execute(file, public_key, options)
        }
        Commands::Encode {
            file,
            user_op_hash,
            credential_id,
        } => commands::encode::execute(file, &user_op_hash, &credential_id, options),
        Commands::EncodeRegistration {
            file,
            user_op_hash,
            login_service_blob,
        } => commands::encode::execute_registration(
            file,
            &user_op_hash,
            &login_service_blob,
            options,
        ),
        Commands::Inspect {
            payload,
            login_service,
        } => commands::inspect::execute(&payload, login_service, options),
    }
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // --help and --version also come through here
            let code = if err.use_stderr() {
                exit_codes::USAGE_ERROR
            } else {
                exit_codes::SUCCESS
            };
            if let Err(e) = err.print() {
                eprintln!("{} {e}", "Error:".red().bold());
            }
            std::process::exit(code);
        }
    };

    init_tracing(cli.verbose);

    if let Err(err) = run(cli) {
        let exit = ExitCode::from_anyhow(&err);
        if let Some(message) = exit.message {
            eprintln!("{} {}", "Error:".red().bold(), message);
        }
        std::process::exit(exit.code);
    }
}
