//! CLI error type.

use std::path::PathBuf;

use coupon_migrator_core::import::ImportError;
use thiserror::Error;

/// Errors that can end a CLI command.
#[derive(Debug, Error)]
pub enum CliError {
    /// No credentials file has been written yet.
    #[error("No credentials found at {0}. Run `cm-cli setup` first.")]
    MissingCredentials(PathBuf),

    /// The credentials file exists but lacks a store hash or token.
    #[error("Credentials at {0} are incomplete. Run `cm-cli setup` again.")]
    IncompleteCredentials(PathBuf),

    /// No home directory to place the credentials file in.
    #[error("Cannot locate the home directory; set CM_CREDENTIALS_FILE")]
    NoHome,

    /// The server answered with an error.
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// The server could not be reached.
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// File read or write failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Credentials file could not be parsed.
    #[error("Invalid credentials file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Coupon file could not be imported.
    #[error(transparent)]
    Import(#[from] ImportError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The user declined to continue.
    #[error("Aborted")]
    Aborted,
}
