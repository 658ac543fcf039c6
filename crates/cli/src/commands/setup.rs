//! Credential setup.
//!
//! # Usage
//!
//! ```bash
//! cm-cli setup --store-hash abc123 --access-token xxxxxxxx --channel-id 1
//! ```

use std::path::Path;

use secrecy::SecretString;

use coupon_migrator_core::types::ChannelId;

use crate::api::ApiClient;
use crate::credentials::StoreCredentials;
use crate::error::CliError;

/// Save credentials, optionally checking them against the server first.
///
/// # Errors
///
/// Returns an error if the check fails or the file cannot be written.
pub async fn run(
    path: &Path,
    server_url: &str,
    store_hash: String,
    access_token: String,
    channel_id: Option<i64>,
    verify: bool,
) -> Result<(), CliError> {
    if store_hash.trim().is_empty() || access_token.trim().is_empty() {
        return Err(CliError::IncompleteCredentials(path.to_path_buf()));
    }
    let credentials = StoreCredentials {
        store_hash: store_hash.trim().to_owned(),
        access_token: SecretString::from(access_token.trim().to_owned()),
        channel_id: channel_id.map(ChannelId::new),
    };

    if verify {
        let message = ApiClient::new(server_url, credentials.clone())?
            .test_connection()
            .await?;
        tracing::info!("{message}");
    }

    credentials.save(path)?;
    tracing::info!("Credentials saved to {}", path.display());
    Ok(())
}
