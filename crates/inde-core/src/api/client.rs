//! HTTP client wrapper for the inde REST API.
//!
//! Every request passes through two hooks:
//! - outbound: a bearer token from the session cookies is attached unless
//!   the path is a public board read
//! - inbound: a 401 tears the session down and sends the navigator to the
//!   login page
//!
//! Other error statuses are returned to the caller untouched. Nothing is
//! retried and tokens are never refreshed silently.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{header, Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use super::ApiError;
use crate::auth::{Navigator, Session, UNAUTHORIZED_REDIRECT};
use crate::config::{resolve_base_url, ApiEnvironment};
use crate::models::SocialProvider;

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds. Callers set no deadlines of their own.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Board paths readable without a token.
const PUBLIC_PATH_PREFIXES: [&str; 2] = ["/api/notices", "/api/faqs"];

/// True when `path` contains `/api/notices` or `/api/faqs` followed by `/`
/// or the end of the path.
pub fn is_public_path(path: &str) -> bool {
    let path = path.split(|c: char| c == '?' || c == '#').next().unwrap_or(path);
    PUBLIC_PATH_PREFIXES.iter().any(|prefix| {
        path.match_indices(prefix).any(|(start, _)| {
            let rest = &path[start + prefix.len()..];
            rest.is_empty() || rest.starts_with('/')
        })
    })
}

/// API client for the inde backend.
/// Clone is cheap - reqwest::Client and the session share their state.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    env: ApiEnvironment,
    session: Session,
    navigator: Arc<dyn Navigator>,
}

impl ApiClient {
    pub fn new(env: ApiEnvironment, session: Session, navigator: Arc<dyn Navigator>) -> Result<Self> {
        Self::with_builder(Client::builder(), env, session, navigator)
    }

    /// Like `new`, starting from a caller-configured reqwest builder.
    pub fn with_builder(
        builder: reqwest::ClientBuilder,
        env: ApiEnvironment,
        session: Session,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, header::HeaderValue::from_static("application/json"));

        let client = builder
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .default_headers(headers)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            env,
            session,
            navigator,
        })
    }

    /// Base URL, recomputed from the environment on every call.
    pub fn base_url(&self) -> String {
        resolve_base_url(&self.env)
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn navigator(&self) -> &Arc<dyn Navigator> {
        &self.navigator
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url().trim_end_matches('/'), path)
    }

    /// URL that starts a social login with `provider`.
    ///
    /// Google needs `state=signup` to route new accounts into registration.
    pub fn social_login_url(&self, provider: SocialProvider, for_signup: bool) -> String {
        let base = self.url(&format!("/auth/{}/redirect/", provider.slug()));
        if for_signup && provider == SocialProvider::Google {
            format!("{}?state=signup", base)
        } else {
            base
        }
    }

    // ===== Interceptors =====

    /// Outbound hook: attach the session token unless `path` is public.
    ///
    /// The token is sent as-is; an expired one is left for the server to
    /// reject.
    pub fn authorize(&self, path: &str, builder: RequestBuilder) -> RequestBuilder {
        if is_public_path(path) {
            return builder;
        }
        self.with_bearer(builder)
    }

    /// Attach the session token regardless of path. Board writes share their
    /// path with public reads and need this explicitly.
    pub(crate) fn with_bearer(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.session.access_token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Inbound hook, run on every response status.
    ///
    /// A 401 clears every session cookie and, unless the user is already on
    /// the login page, navigates there with `error=UNAUTHORIZED`. Any other
    /// status is left alone.
    pub fn intercept_status(&self, status: StatusCode) {
        if status == StatusCode::UNAUTHORIZED {
            self.expire_session();
        }
    }

    fn expire_session(&self) {
        warn!("API rejected session, signing out");
        if let Err(e) = self.session.clear() {
            warn!(error = %e, "Failed to clear session cookies");
        }
        if !self.navigator.is_on_login() {
            self.navigator.navigate(UNAUTHORIZED_REDIRECT);
        }
    }

    // ===== Request plumbing =====

    /// Request builder for `path` with the outbound hook applied.
    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.authorize(path, self.bare_request(method, path))
    }

    fn bare_request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, self.url(path))
            .header(header::ACCEPT, "application/json")
    }

    /// Send and run the inbound hook.
    async fn execute(&self, builder: RequestBuilder, path: &str) -> Result<Response> {
        let response = builder
            .send()
            .await
            .map_err(ApiError::NetworkError)
            .with_context(|| format!("Request to {} failed", path))?;

        let status = response.status();
        debug!(path, status = %status, "API response received");
        self.intercept_status(status);
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(ApiError::from_status(status, &body).into())
    }

    async fn parse<T: DeserializeOwned>(response: Response, path: &str) -> Result<T> {
        let text = response
            .text()
            .await
            .with_context(|| format!("Failed to read response body from {}", path))?;
        serde_json::from_str(&text)
            .map_err(|e| ApiError::InvalidResponse(format!("{}: {}", path, e)))
            .with_context(|| format!("Failed to parse JSON response from {}", path))
    }

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.execute(self.request(Method::GET, path), path).await?;
        Self::parse(response, path).await
    }

    pub(crate) async fn get_json<T, Q>(&self, path: &str, query: &Q) -> Result<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized + Sync,
    {
        let builder = self.request(Method::GET, path).query(query);
        let response = self.execute(builder, path).await?;
        Self::parse(response, path).await
    }

    pub(crate) async fn send_json<T, B>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized + Sync,
    {
        let response = self.send(method, path, body, false).await?;
        Self::parse(response, path).await
    }

    /// Send with an optional JSON body.
    ///
    /// `force_auth` attaches the token even on public paths. Only notice
    /// writes use it; reads of `/api/notices` and `/api/faqs` never carry a
    /// token.
    pub(crate) async fn send<B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        force_auth: bool,
    ) -> Result<Response>
    where
        B: Serialize + ?Sized + Sync,
    {
        let mut builder = if force_auth {
            self.with_bearer(self.bare_request(method, path))
        } else {
            self.request(method, path)
        };
        if let Some(body) = body {
            builder = builder.json(body);
        }
        self.execute(builder, path).await
    }
}
