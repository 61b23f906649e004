//! Secure storage for the Azure DevOps personal access token.
//!
//! The token is kept in the operating system's native credential manager:
//!
//! - **macOS**: Keychain Services
//! - **Windows**: Credential Manager
//! - **Linux**: Secret Service (GNOME Keyring / KWallet)
//!
//! `AZURE_DEVOPS_TOKEN` always wins over the stored value; see [`resolve_token`].
//!
//! # Example
//!
//! ```ignore
//! use azdo_storage::{CredentialStore, KeychainStore, TOKEN_KEY};
//!
//! let store = KeychainStore::new();
//! store.store(TOKEN_KEY, "pat-xxx")?;
//! assert_eq!(store.get(TOKEN_KEY)?, Some("pat-xxx".to_string()));
//! store.delete(TOKEN_KEY)?;
//! ```

use azdo_core::config::Config;
use azdo_core::{Error, Result};
use keyring::Entry;
use tracing::{debug, warn};

/// Service name used in OS keychain.
const SERVICE_NAME: &str = "azdo-pipelines";

/// Keychain entry holding the personal access token.
pub const TOKEN_KEY: &str = "azure-devops/token";

/// Credential storage trait.
///
/// Implementations can use OS keychain, in-memory storage (for testing),
/// or other backends.
pub trait CredentialStore: Send + Sync {
    /// Store a credential securely.
    fn store(&self, key: &str, value: &str) -> Result<()>;

    /// Retrieve a stored credential.
    ///
    /// Returns `Ok(None)` if the credential doesn't exist.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Delete a stored credential.
    ///
    /// Returns `Ok(())` even if the credential didn't exist.
    fn delete(&self, key: &str) -> Result<()>;

    /// Check if a credential exists.
    fn exists(&self, key: &str) -> bool {
        matches!(self.get(key), Ok(Some(_)))
    }
}

/// Fill `config.azure.token` from the store when the environment did not set it.
///
/// A keychain failure is logged and treated as "no token"; validation then
/// reports the missing key.
pub fn resolve_token(config: &mut Config, store: &dyn CredentialStore) {
    let has_token = config
        .azure
        .token
        .as_deref()
        .is_some_and(|t| !t.trim().is_empty());
    if has_token {
        debug!("Using access token from environment");
        return;
    }

    match store.get(TOKEN_KEY) {
        Ok(Some(token)) => {
            debug!("Using access token from keychain");
            config.azure.token = Some(token);
        }
        Ok(None) => debug!("No access token in keychain"),
        Err(e) => warn!(error = %e, "Failed to read access token from keychain"),
    }
}

// =============================================================================
// KeychainStore - OS Keychain implementation
// =============================================================================

/// Credential store using the OS keychain.
#[derive(Debug)]
pub struct KeychainStore {
    service_name: String,
}

impl KeychainStore {
    /// Create a new keychain store with the default service name.
    pub fn new() -> Self {
        Self {
            service_name: SERVICE_NAME.to_string(),
        }
    }

    /// Create a keychain store with a custom service name.
    pub fn with_service_name(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
        }
    }

    fn make_entry(&self, key: &str) -> Result<Entry> {
        Entry::new(&self.service_name, key).map_err(|e| {
            Error::Storage(format!(
                "Failed to create keychain entry for '{}': {}",
                key, e
            ))
        })
    }
}

impl Default for KeychainStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialStore for KeychainStore {
    fn store(&self, key: &str, value: &str) -> Result<()> {
        debug!(key = key, "Storing credential in keychain");

        self.make_entry(key)?
            .set_password(value)
            .map_err(|e| Error::Storage(format!("Failed to store credential '{}': {}", key, e)))
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        debug!(key = key, "Retrieving credential from keychain");

        match self.make_entry(key)?.get_password() {
            Ok(password) => Ok(Some(password)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(Error::Storage(format!(
                "Failed to retrieve credential '{}': {}",
                key, e
            ))),
        }
    }

    fn delete(&self, key: &str) -> Result<()> {
        debug!(key = key, "Deleting credential from keychain");

        match self.make_entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(Error::Storage(format!(
                "Failed to delete credential '{}': {}",
                key, e
            ))),
        }
    }
}

// =============================================================================
// MemoryStore - In-memory implementation for testing
// =============================================================================

/// In-memory credential store for tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    credentials: std::sync::RwLock<std::collections::HashMap<String, String>>,
}

impl MemoryStore {
    /// Create a new in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding just the access token.
    pub fn with_token(token: impl Into<String>) -> Self {
        let store = Self::new();
        if let Ok(mut creds) = store.credentials.write() {
            creds.insert(TOKEN_KEY.to_string(), token.into());
        }
        store
    }
}

impl CredentialStore for MemoryStore {
    fn store(&self, key: &str, value: &str) -> Result<()> {
        let mut creds = self
            .credentials
            .write()
            .map_err(|e| Error::Storage(format!("Lock poisoned: {}", e)))?;
        creds.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        let creds = self
            .credentials
            .read()
            .map_err(|e| Error::Storage(format!("Lock poisoned: {}", e)))?;
        Ok(creds.get(key).cloned())
    }

    fn delete(&self, key: &str) -> Result<()> {
        let mut creds = self
            .credentials
            .write()
            .map_err(|e| Error::Storage(format!("Lock poisoned: {}", e)))?;
        creds.remove(key);
        Ok(())
    }
}
