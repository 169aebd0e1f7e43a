//! Cookie storage for session tokens.
//!
//! Cookies carry their own expiry; an expired cookie reads as absent, the
//! same way a browser would drop it.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Length of the ChaCha20-Poly1305 nonce prefixed to the sealed jar.
const NONCE_LEN: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

/// Attributes applied when a cookie is written.
#[derive(Debug, Clone)]
pub struct CookieOptions {
    pub expires_in: Duration,
    pub secure: bool,
    pub same_site: SameSite,
    pub path: String,
}

impl CookieOptions {
    /// Site-wide, `SameSite=Strict` cookie living for `days`.
    pub fn days(days: i64, secure: bool) -> Self {
        Self {
            expires_in: Duration::days(days),
            secure,
            same_site: SameSite::Strict,
            path: "/".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cookie {
    pub value: String,
    pub expires_at: DateTime<Utc>,
    pub secure: bool,
    pub same_site: SameSite,
    pub path: String,
}

impl Cookie {
    pub fn new(value: &str, options: &CookieOptions) -> Self {
        Self {
            value: value.to_string(),
            expires_at: Utc::now() + options.expires_in,
            secure: options.secure,
            same_site: options.same_site,
            path: options.path.clone(),
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

/// Cookie storage as seen by the HTTP client and session helpers.
pub trait CookieStore: Send + Sync {
    /// Current value, `None` when unset or expired.
    fn get(&self, name: &str) -> Option<String>;
    fn set(&self, name: &str, value: &str, options: &CookieOptions) -> Result<()>;
    fn remove(&self, name: &str) -> Result<()>;
}

fn live_value(jar: &HashMap<String, Cookie>, name: &str) -> Option<String> {
    jar.get(name).filter(|c| !c.is_expired()).map(|c| c.value.clone())
}

/// Cookies held only for the life of the process.
#[derive(Debug, Default)]
pub struct MemoryCookieStore {
    jar: Mutex<HashMap<String, Cookie>>,
}

impl MemoryCookieStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Full cookie record including attributes, expired or not.
    pub fn cookie(&self, name: &str) -> Option<Cookie> {
        self.jar.lock().ok()?.get(name).cloned()
    }
}

impl CookieStore for MemoryCookieStore {
    fn get(&self, name: &str) -> Option<String> {
        let jar = self.jar.lock().ok()?;
        live_value(&jar, name)
    }

    fn set(&self, name: &str, value: &str, options: &CookieOptions) -> Result<()> {
        let mut jar = self.jar.lock().map_err(|_| anyhow!("cookie jar lock poisoned"))?;
        jar.insert(name.to_string(), Cookie::new(value, options));
        Ok(())
    }

    fn remove(&self, name: &str) -> Result<()> {
        let mut jar = self.jar.lock().map_err(|_| anyhow!("cookie jar lock poisoned"))?;
        jar.remove(name);
        Ok(())
    }
}

/// 256-bit key used to seal the on-disk cookie jar.
#[derive(Clone)]
pub struct SealKey([u8; 32]);

impl SealKey {
    pub fn generate() -> Self {
        Self(rand::random())
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let key: [u8; 32] = bytes
            .try_into()
            .map_err(|_| anyhow!("Seal key must be 32 bytes, got {}", bytes.len()))?;
        Ok(Self(key))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    fn cipher(&self) -> ChaCha20Poly1305 {
        ChaCha20Poly1305::new(Key::from_slice(&self.0))
    }

    fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let nonce_bytes: [u8; NONCE_LEN] = rand::random();
        let ciphertext = self
            .cipher()
            .encrypt(Nonce::from_slice(&nonce_bytes), plaintext)
            .map_err(|_| anyhow!("Failed to seal cookie jar"))?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce_bytes);
        sealed.extend_from_slice(&ciphertext);
        Ok(sealed)
    }

    fn open(&self, sealed: &[u8]) -> Result<Vec<u8>> {
        if sealed.len() < NONCE_LEN {
            return Err(anyhow!("Sealed cookie jar is truncated"));
        }
        let (nonce, ciphertext) = sealed.split_at(NONCE_LEN);
        self.cipher()
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| anyhow!("Failed to open cookie jar"))
    }
}

impl std::fmt::Debug for SealKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SealKey(..)")
    }
}

/// Cookie jar persisted to one encrypted file.
///
/// A jar that cannot be opened (wrong key, corruption) is discarded and the
/// user starts signed out.
pub struct FileCookieStore {
    path: PathBuf,
    key: SealKey,
    jar: Mutex<HashMap<String, Cookie>>,
}

impl FileCookieStore {
    pub fn open(path: PathBuf, key: SealKey) -> Result<Self> {
        let jar = if path.exists() {
            let sealed = std::fs::read(&path).context("Failed to read cookie jar")?;
            match key
                .open(&sealed)
                .and_then(|plain| serde_json::from_slice::<HashMap<String, Cookie>>(&plain).map_err(Into::into))
            {
                Ok(mut jar) => {
                    jar.retain(|_, c| !c.is_expired());
                    jar
                }
                Err(e) => {
                    warn!(error = %e, "Discarding unreadable cookie jar");
                    HashMap::new()
                }
            }
        } else {
            HashMap::new()
        };

        debug!(path = %path.display(), cookies = jar.len(), "Cookie jar opened");
        Ok(Self {
            path,
            key,
            jar: Mutex::new(jar),
        })
    }

    fn persist(&self, jar: &HashMap<String, Cookie>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let plain = serde_json::to_vec(jar)?;
        let sealed = self.key.seal(&plain)?;
        std::fs::write(&self.path, sealed).context("Failed to write cookie jar")?;
        Ok(())
    }
}

impl CookieStore for FileCookieStore {
    fn get(&self, name: &str) -> Option<String> {
        let jar = self.jar.lock().ok()?;
        live_value(&jar, name)
    }

    fn set(&self, name: &str, value: &str, options: &CookieOptions) -> Result<()> {
        let mut jar = self.jar.lock().map_err(|_| anyhow!("cookie jar lock poisoned"))?;
        jar.insert(name.to_string(), Cookie::new(value, options));
        self.persist(&jar)
    }

    fn remove(&self, name: &str) -> Result<()> {
        let mut jar = self.jar.lock().map_err(|_| anyhow!("cookie jar lock poisoned"))?;
        if jar.remove(name).is_some() {
            self.persist(&jar)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expired_cookie_reads_as_absent() {
        let store = MemoryCookieStore::new();
        store.set("a", "1", &CookieOptions::days(1, false)).expect("set");
        assert_eq!(store.get("a").as_deref(), Some("1"));

        let mut gone = CookieOptions::days(1, false);
        gone.expires_in = Duration::seconds(-1);
        store.set("b", "2", &gone).expect("set");
        assert_eq!(store.get("b"), None);
        assert!(store.cookie("b").is_some());
    }

    #[test]
    fn test_cookie_options_defaults() {
        let store = MemoryCookieStore::new();
        store.set("a", "1", &CookieOptions::days(7, true)).expect("set");
        let cookie = store.cookie("a").expect("stored");
        assert!(cookie.secure);
        assert_eq!(cookie.same_site, SameSite::Strict);
        assert_eq!(cookie.path, "/");
        let hours = (cookie.expires_at - Utc::now()).num_hours();
        assert!((167..=168).contains(&hours));
    }

    #[test]
    fn test_file_store_roundtrip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("cookies.bin");
        let key = SealKey::generate();

        let store = FileCookieStore::open(path.clone(), key.clone()).expect("open");
        store.set("accessToken", "tok", &CookieOptions::days(1, false)).expect("set");

        // Token is not readable in plain text on disk
        let raw = std::fs::read(&path).expect("read");
        assert!(!String::from_utf8_lossy(&raw).contains("tok"));

        let reopened = FileCookieStore::open(path.clone(), key).expect("reopen");
        assert_eq!(reopened.get("accessToken").as_deref(), Some("tok"));

        reopened.remove("accessToken").expect("remove");
        assert_eq!(reopened.get("accessToken"), None);
    }

    #[test]
    fn test_file_store_wrong_key_starts_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("cookies.bin");

        let store = FileCookieStore::open(path.clone(), SealKey::generate()).expect("open");
        store.set("accessToken", "tok", &CookieOptions::days(1, false)).expect("set");

        let other = FileCookieStore::open(path, SealKey::generate()).expect("reopen");
        assert_eq!(other.get("accessToken"), None);
    }

    #[test]
    fn test_seal_key_length_checked() {
        assert!(SealKey::from_bytes(&[0u8; 16]).is_err());
        let key = SealKey::from_bytes(&[7u8; 32]).expect("32 bytes");
        assert_eq!(key.as_bytes().len(), 32);
    }
}
