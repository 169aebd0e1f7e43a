//! Client core for the inde content platform.
//!
//! - `api`: HTTP client wrapper with bearer-token and 401 handling, plus
//!   typed account, board and system code calls
//! - `auth`: session cookies, keychain credentials, login redirects
//! - `cache`: 24-hour system code cache over pluggable storage
//! - `config`: API base URL resolution and persisted preferences
//! - `models`: API data types

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod models;

pub use api::{ApiClient, ApiError};
pub use auth::{Navigator, Session};
pub use cache::{CodeSource, CodeStorage, ReferenceCache};
pub use config::{resolve_base_url, ApiEnvironment, Config, Mode};
pub use models::ReferenceCodeItem;
