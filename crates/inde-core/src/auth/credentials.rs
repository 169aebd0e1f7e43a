//! Keychain-held secrets: the remembered login password and the key that
//! seals the cookie jar.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Context, Result};
use keyring::Entry;
use tracing::debug;

use super::cookies::SealKey;

const SERVICE_NAME: &str = "inde-cli";

/// Keychain account holding the cookie jar sealing key. Never a valid email.
const JAR_KEY_ACCOUNT: &str = "cookie-jar-key";

/// Secret storage keyed by account name.
pub trait Keychain: Send + Sync {
    /// `Ok(None)` when nothing is stored under `account`.
    fn get(&self, account: &str) -> Result<Option<Vec<u8>>>;
    fn set(&self, account: &str, secret: &[u8]) -> Result<()>;
    /// Deleting a missing entry succeeds.
    fn delete(&self, account: &str) -> Result<()>;
}

/// The platform keychain (macOS Keychain, Secret Service, Windows
/// Credential Manager) through `keyring`.
#[derive(Debug, Clone)]
pub struct OsKeychain {
    service: String,
}

impl OsKeychain {
    pub fn new() -> Self {
        Self {
            service: SERVICE_NAME.to_string(),
        }
    }

    fn entry(&self, account: &str) -> Result<Entry> {
        Entry::new(&self.service, account).context("Failed to create keyring entry")
    }
}

impl Default for OsKeychain {
    fn default() -> Self {
        Self::new()
    }
}

impl Keychain for OsKeychain {
    fn get(&self, account: &str) -> Result<Option<Vec<u8>>> {
        match self.entry(account)?.get_secret() {
            Ok(secret) => Ok(Some(secret)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e).context("Failed to read from keychain"),
        }
    }

    fn set(&self, account: &str, secret: &[u8]) -> Result<()> {
        self.entry(account)?
            .set_secret(secret)
            .context("Failed to write to keychain")
    }

    fn delete(&self, account: &str) -> Result<()> {
        match self.entry(account)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e).context("Failed to delete from keychain"),
        }
    }
}

/// In-process keychain for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryKeychain {
    secrets: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryKeychain {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Keychain for MemoryKeychain {
    fn get(&self, account: &str) -> Result<Option<Vec<u8>>> {
        let secrets = self.secrets.lock().map_err(|_| anyhow!("keychain lock poisoned"))?;
        Ok(secrets.get(account).cloned())
    }

    fn set(&self, account: &str, secret: &[u8]) -> Result<()> {
        let mut secrets = self.secrets.lock().map_err(|_| anyhow!("keychain lock poisoned"))?;
        secrets.insert(account.to_string(), secret.to_vec());
        Ok(())
    }

    fn delete(&self, account: &str) -> Result<()> {
        let mut secrets = self.secrets.lock().map_err(|_| anyhow!("keychain lock poisoned"))?;
        secrets.remove(account);
        Ok(())
    }
}

/// What the client keeps in the keychain.
#[derive(Clone)]
pub struct CredentialStore {
    keychain: Arc<dyn Keychain>,
}

impl CredentialStore {
    pub fn new(keychain: Arc<dyn Keychain>) -> Self {
        Self { keychain }
    }

    /// Backed by the platform keychain.
    pub fn os() -> Self {
        Self::new(Arc::new(OsKeychain::new()))
    }

    /// Keep the password for `email` so the next login can skip the prompt.
    pub fn remember_password(&self, email: &str, password: &str) -> Result<()> {
        self.keychain.set(email, password.as_bytes())
    }

    /// The remembered password for `email`. An unreadable keychain counts as
    /// nothing remembered.
    pub fn remembered_password(&self, email: &str) -> Option<String> {
        match self.keychain.get(email) {
            Ok(secret) => secret.and_then(|bytes| String::from_utf8(bytes).ok()),
            Err(e) => {
                debug!(error = %e, "No remembered password");
                None
            }
        }
    }

    pub fn forget_password(&self, email: &str) -> Result<()> {
        self.keychain.delete(email)
    }

    /// Key for the on-disk cookie jar, created on first use.
    pub fn jar_key(&self) -> Result<SealKey> {
        if let Some(bytes) = self.keychain.get(JAR_KEY_ACCOUNT)? {
            return SealKey::from_bytes(&bytes);
        }
        debug!("Generating new cookie jar key");
        let key = SealKey::generate();
        self.keychain
            .set(JAR_KEY_ACCOUNT, key.as_bytes())
            .context("Failed to store cookie jar key")?;
        Ok(key)
    }
}
