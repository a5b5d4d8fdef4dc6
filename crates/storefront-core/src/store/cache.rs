use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::local::LocalStore;

/// Key holding the catalog [`storefront_domain::CacheEnvelope`].
pub const CATALOG_CACHE_KEY: &str = "gamesData";

/// JSON values on top of a [`LocalStore`]. Expiry is the caller's business.
#[derive(Debug, Clone)]
pub struct CacheStore {
    store: LocalStore,
}

impl CacheStore {
    pub fn new(store: LocalStore) -> Self {
        Self { store }
    }

    /// # Errors
    /// Returns an error if the value cannot be serialised or written.
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let encoded = serde_json::to_string(value)
            .with_context(|| format!("failed to serialise cache entry {key}"))?;
        self.store.set_raw(key, &encoded)
    }

    /// The stored value, or `None` when the key is unset, unreadable or not
    /// valid JSON for `T`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.store.get_raw(key) {
            Ok(raw) => raw?,
            Err(err) => {
                tracing::debug!(%err, key, "cache read failed");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::debug!(%err, key, "ignoring unparsable cache entry");
                None
            }
        }
    }

    /// # Errors
    /// Returns an error if the entry exists and cannot be removed.
    pub fn remove(&self, key: &str) -> Result<()> {
        self.store.remove(key)
    }

    pub fn store(&self) -> &LocalStore {
        &self.store
    }
}
