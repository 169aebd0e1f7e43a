//! REST API client module for the inde backend.
//!
//! `ApiClient` wraps reqwest with the session-aware request/response hooks
//! and exposes typed calls for accounts, boards and system codes.
//!
//! Authentication is a JWT bearer token kept in the `accessToken` cookie.

pub mod auth;
pub mod board;
pub mod client;
pub mod error;
pub mod syscode;

#[cfg(test)]
pub(crate) mod test_server;

pub use client::{is_public_path, ApiClient};
pub use error::ApiError;
pub use syscode::SYSCODE_BY_PARENT_PATH;
