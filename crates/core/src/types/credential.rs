//! Store credentials.
//!
//! Every request to the server carries the store's credentials; nothing is
//! stored server-side.

use serde::{Deserialize, Deserializer, Serialize};

use super::id::{ChannelId, IdRepr};

/// Credentials for one BigCommerce store.
///
/// Implements `Debug` manually to redact the access token.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    /// Store hash from the API path (`/stores/{store_hash}`).
    #[serde(default, deserialize_with = "deserialize_nullable_string")]
    pub store_hash: String,
    /// API account access token (`X-Auth-Token`).
    #[serde(default, deserialize_with = "deserialize_nullable_string")]
    pub access_token: String,
    /// Channel new promotions are scoped to. Defaults to channel 1.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_channel_id"
    )]
    pub channel_id: Option<ChannelId>,
}

impl Credentials {
    /// Create credentials for the default channel.
    #[must_use]
    pub fn new(store_hash: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            store_hash: store_hash.into(),
            access_token: access_token.into(),
            channel_id: None,
        }
    }

    /// Set the channel.
    #[must_use]
    pub const fn with_channel(mut self, channel_id: ChannelId) -> Self {
        self.channel_id = Some(channel_id);
        self
    }

    /// Both the store hash and the access token are present.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.store_hash.trim().is_empty() && !self.access_token.trim().is_empty()
    }

    /// The configured channel, or the default storefront channel.
    #[must_use]
    pub fn channel(&self) -> ChannelId {
        self.channel_id.unwrap_or_default()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("store_hash", &self.store_hash)
            .field("access_token", &"[REDACTED]")
            .field("channel_id", &self.channel_id)
            .finish()
    }
}

/// `null` reads as an empty string, which [`Credentials::is_complete`] rejects.
fn deserialize_nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// `null`, `""` and a missing field all mean "use the default channel".
fn deserialize_channel_id<'de, D>(deserializer: D) -> Result<Option<ChannelId>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<IdRepr>::deserialize(deserializer)? {
        None => Ok(None),
        Some(IdRepr::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(repr) => repr
            .into_i64()
            .map(|id| Some(ChannelId::new(id)))
            .map_err(serde::de::Error::custom),
    }
}
