//! Authentication module for sessions, cookies and credentials.
//!
//! This module provides:
//! - `CookieStore`: cookie storage with per-cookie expiry (memory or sealed file)
//! - `Session`: the access/refresh/user cookie set
//! - `Navigator`: where the client sends the user when a session dies
//! - `CredentialStore`: remembered password and jar key over a `Keychain`
//!   (the OS keychain via keyring, or memory)
//!
//! Access tokens and the cached user expire after one day, refresh tokens
//! after seven.

pub mod cookies;
pub mod credentials;
pub mod navigator;
pub mod session;

pub use cookies::{CookieOptions, CookieStore, FileCookieStore, MemoryCookieStore, SameSite, SealKey};
pub use credentials::{CredentialStore, Keychain, MemoryKeychain, OsKeychain};
pub use navigator::{HistoryNavigator, Navigator, LOGIN_PATH, OAUTH_FAILED_REDIRECT, UNAUTHORIZED_REDIRECT};
pub use session::{Session, ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE, SESSION_COOKIES, USER_INFO_COOKIE};
