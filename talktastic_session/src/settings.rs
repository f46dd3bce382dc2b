//! Persisted override of the agent endpoint.

use talktastic_core::{KeyValueStore, StorageError};
use thiserror::Error;
use tracing::{info, warn};
use url::Url;

use crate::keys::WEBHOOK_URL_KEY;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Please enter a valid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Unsupported URL scheme: {0}")]
    UnsupportedScheme(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub struct EndpointSettings<S> {
    store: S,
}

impl<S: KeyValueStore> EndpointSettings<S> {
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// The saved override, if one is set and readable.
    #[must_use]
    pub fn webhook_url(&self) -> Option<String> {
        match self.store.get(WEBHOOK_URL_KEY) {
            Ok(url) => url.filter(|url| !url.trim().is_empty()),
            Err(e) => {
                warn!("Could not read webhook override: {e}");
                None
            }
        }
    }

    pub fn set_webhook_url(&self, raw: &str) -> Result<Url, SettingsError> {
        let url = Url::parse(raw.trim())?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(SettingsError::UnsupportedScheme(url.scheme().to_string()));
        }

        self.store.set(WEBHOOK_URL_KEY, url.as_str())?;
        info!("Webhook URL updated to {url}");
        Ok(url)
    }

    pub fn clear_webhook_url(&self) -> Result<(), SettingsError> {
        self.store.remove(WEBHOOK_URL_KEY)?;
        Ok(())
    }

    /// The override if set, otherwise `fallback`.
    #[must_use]
    pub fn resolve_endpoint(&self, fallback: &str) -> String {
        self.webhook_url().unwrap_or_else(|| fallback.to_string())
    }
}
