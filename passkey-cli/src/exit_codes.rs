//! Exit codes following sysexits.h conventions.
//!
//! Scripts driving the debugger can tell a bad ceremony response apart from
//! a missing file or a mistyped flag.

use std::io;

use passkey_core::PasskeyError;

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// General error (catch-all).
pub const GENERAL_ERROR: i32 = 1;

/// Command line usage error (invalid arguments).
/// Maps to EX_USAGE from sysexits.h.
pub const USAGE_ERROR: i32 = 64;

/// Malformed ceremony response, payload or hex argument.
/// Maps to EX_DATAERR from sysexits.h.
pub const DATA_ERROR: i32 = 65;

/// Cannot open input file.
/// Maps to EX_NOINPUT from sysexits.h.
pub const INPUT_ERROR: i32 = 66;

/// Represents an exit code with optional error context.
pub struct ExitCode {
    pub code: i32,
    pub message: Option<String>,
}

impl ExitCode {
    pub fn from_anyhow(err: &anyhow::Error) -> Self {
        let message = format!("{err:#}");

        // Classify by the first typed error in the chain
        let code = err
            .chain()
            .find_map(|cause| {
                if let Some(e) = cause.downcast_ref::<PasskeyError>() {
                    Some(if e.is_malformed_input() {
                        DATA_ERROR
                    } else {
                        GENERAL_ERROR
                    })
                } else if cause.is::<serde_json::Error>() {
                    Some(DATA_ERROR)
                } else if cause.is::<io::Error>() {
                    Some(INPUT_ERROR)
                } else {
                    None
                }
            })
            .unwrap_or(GENERAL_ERROR);

        Self {
            code,
            message: Some(message),
        }
    }
}
