//! Connection check.

use crate::api::ApiClient;
use crate::error::CliError;

/// Check the stored credentials against the store.
///
/// # Errors
///
/// Returns the server's message if the check fails.
pub async fn run(client: &ApiClient) -> Result<(), CliError> {
    let message = client.test_connection().await?;
    tracing::info!("{message}");
    Ok(())
}
