//! Command handlers for the `botforge` binary.

pub(crate) mod module;
pub(crate) mod run;

use botforge::ForgeError;

/// One-line error for the terminal, prefixed with the error code when the
/// failure came from the library.
pub(crate) fn format_cli_error(err: &anyhow::Error) -> String {
    match err.downcast_ref::<ForgeError>() {
        Some(forge) => match forge.details() {
            Some(details) => format!("[{}] {}\n{}", forge.code(), forge, details),
            None => format!("[{}] {}", forge.code(), forge),
        },
        None => format!("Error: {:#}", err),
    }
}
