//! Persisted store credentials.
//!
//! Stored as YAML, by default at `$HOME/.coupon-migrator.yaml`:
//!
//! ```yaml
//! store_hash: abc123
//! access_token: xxxxxxxx
//! channel_id: 1
//! ```

use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use coupon_migrator_core::types::ChannelId;

use crate::error::CliError;

const FILE_NAME: &str = ".coupon-migrator.yaml";

#[derive(Serialize, Deserialize)]
struct CredentialsFile {
    #[serde(default)]
    store_hash: String,
    #[serde(default)]
    access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    channel_id: Option<ChannelId>,
}

/// Credentials for the store being migrated.
#[derive(Debug, Clone)]
pub struct StoreCredentials {
    pub store_hash: String,
    pub access_token: SecretString,
    pub channel_id: Option<ChannelId>,
}

impl StoreCredentials {
    /// Read credentials from `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, unreadable, or incomplete.
    pub fn load(path: &Path) -> Result<Self, CliError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CliError::MissingCredentials(path.to_path_buf()));
            }
            Err(e) => return Err(e.into()),
        };
        let file: CredentialsFile = serde_yaml::from_str(&content)?;

        if file.store_hash.trim().is_empty() || file.access_token.trim().is_empty() {
            return Err(CliError::IncompleteCredentials(path.to_path_buf()));
        }

        Ok(Self {
            store_hash: file.store_hash.trim().to_owned(),
            access_token: SecretString::from(file.access_token.trim().to_owned()),
            channel_id: file.channel_id,
        })
    }

    /// Write credentials to `path`, readable only by the owner on Unix.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), CliError> {
        let file = CredentialsFile {
            store_hash: self.store_hash.clone(),
            access_token: self.access_token.expose_secret().to_owned(),
            channel_id: self.channel_id,
        };
        std::fs::write(path, serde_yaml::to_string(&file)?)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
        }

        Ok(())
    }
}

/// `$HOME/.coupon-migrator.yaml`.
///
/// # Errors
///
/// Returns an error if `HOME` is not set.
pub fn default_path() -> Result<PathBuf, CliError> {
    std::env::var_os("HOME")
        .map(|home| PathBuf::from(home).join(FILE_NAME))
        .ok_or(CliError::NoHome)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn temp_file(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("cm-cli-{}-{name}.yaml", std::process::id()))
    }

    #[test]
    fn test_save_then_load() {
        let path = temp_file("roundtrip");
        let creds = StoreCredentials {
            store_hash: "abc123".to_owned(),
            access_token: SecretString::from("token".to_owned()),
            channel_id: Some(ChannelId::new(2)),
        };
        creds.save(&path).unwrap();

        let loaded = StoreCredentials::load(&path).unwrap();
        assert_eq!(loaded.store_hash, "abc123");
        assert_eq!(loaded.access_token.expose_secret(), "token");
        assert_eq!(loaded.channel_id, Some(ChannelId::new(2)));
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_missing_file() {
        let path = temp_file("missing");
        assert!(matches!(
            StoreCredentials::load(&path),
            Err(CliError::MissingCredentials(p)) if p == path
        ));
    }

    #[test]
    fn test_incomplete_file() {
        let path = temp_file("incomplete");
        std::fs::write(&path, "store_hash: abc123\n").unwrap();
        assert!(matches!(
            StoreCredentials::load(&path),
            Err(CliError::IncompleteCredentials(_))
        ));
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_debug_hides_token() {
        let creds = StoreCredentials {
            store_hash: "abc123".to_owned(),
            access_token: SecretString::from("super_secret_token".to_owned()),
            channel_id: None,
        };
        assert!(!format!("{creds:?}").contains("super_secret_token"));
    }
}
