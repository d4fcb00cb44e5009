//! API key selection.
//!
//! The store answers "is a usable key selected?" and lets the front end
//! select one. Providers read the key at call time, so selecting a new key
//! takes effect on the next request without rebuilding any client.

use crate::error::{OmniGenError, Result};
use std::sync::{Arc, RwLock};

/// Environment variables consulted by [`CredentialStore::from_env`], in order.
pub const API_KEY_ENV_VARS: [&str; 2] = ["GOOGLE_API_KEY", "API_KEY"];

/// A Gemini API key. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wraps a key, rejecting blank input.
    pub fn new(key: impl Into<String>) -> Result<Self> {
        let key = key.into().trim().to_string();
        if key.is_empty() {
            return Err(OmniGenError::MissingApiKey);
        }
        Ok(Self(key))
    }

    /// Returns the secret for use in a request header.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiKey([REDACTED])")
    }
}

/// Shared, swappable holder of the selected API key.
#[derive(Debug, Clone, Default)]
pub struct CredentialStore {
    inner: Arc<RwLock<Option<ApiKey>>>,
}

impl CredentialStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding `key`.
    pub fn with_key(key: impl Into<String>) -> Result<Self> {
        let store = Self::new();
        store.select_key(key)?;
        Ok(store)
    }

    /// Creates a store seeded from `GOOGLE_API_KEY`, then `API_KEY`.
    /// The store is empty if neither is set.
    pub fn from_env() -> Self {
        let store = Self::new();
        let values = API_KEY_ENV_VARS.iter().map(|var| std::env::var(var).ok());
        if let Some(key) = first_usable(values) {
            store.set(Some(key));
        }
        store
    }

    /// Returns true if a usable key is currently selected.
    pub fn has_selected_key(&self) -> bool {
        self.current().is_ok()
    }

    /// Selects `key`, replacing any previous selection.
    pub fn select_key(&self, key: impl Into<String>) -> Result<()> {
        let key = ApiKey::new(key)?;
        self.set(Some(key));
        tracing::debug!("API key selected");
        Ok(())
    }

    /// Forgets the selected key.
    pub fn clear(&self) {
        self.set(None);
    }

    /// Returns the selected key or a configuration error.
    pub fn current(&self) -> Result<ApiKey> {
        let guard = self
            .inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        guard.as_ref().cloned().ok_or(OmniGenError::MissingApiKey)
    }

    fn set(&self, key: Option<ApiKey>) {
        let mut guard = self
            .inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = key;
    }
}

/// First non-blank value, in order. A set-but-empty variable does not shadow
/// the ones after it.
fn first_usable(values: impl IntoIterator<Item = Option<String>>) -> Option<ApiKey> {
    values
        .into_iter()
        .flatten()
        .find_map(|value| ApiKey::new(value).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_empty_store_has_no_key() {
        let store = CredentialStore::new();
        assert!(!store.has_selected_key());
        let err = store.current().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_select_and_clear() {
        let store = CredentialStore::new();
        store.select_key("AIzaTestKey").unwrap();
        assert!(store.has_selected_key());
        assert_eq!(store.current().unwrap().expose(), "AIzaTestKey");

        store.clear();
        assert!(!store.has_selected_key());
    }

    #[test]
    fn test_blank_key_rejected() {
        let store = CredentialStore::new();
        assert!(store.select_key("   ").is_err());
        assert!(!store.has_selected_key());
    }

    #[test]
    fn test_blank_env_value_falls_through() {
        let key = first_usable([Some(String::new()), Some("AIzaFromApiKey".into())]).unwrap();
        assert_eq!(key.expose(), "AIzaFromApiKey");

        let key = first_usable([None, Some(" AIzaSecond ".into())]).unwrap();
        assert_eq!(key.expose(), "AIzaSecond");

        assert!(first_usable([Some("  ".into()), None]).is_none());
    }

    #[test]
    fn test_clones_share_selection() {
        let store = CredentialStore::new();
        let shared = store.clone();
        store.select_key("AIzaShared").unwrap();
        assert_eq!(shared.current().unwrap().expose(), "AIzaShared");
    }

    #[test]
    fn test_debug_redacts() {
        let key = ApiKey::new("AIzaVerySecret").unwrap();
        let printed = format!("{key:?}");
        assert!(!printed.contains("AIzaVerySecret"));
    }
}
