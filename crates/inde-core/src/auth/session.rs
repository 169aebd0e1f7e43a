use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, warn};

use super::cookies::{CookieOptions, CookieStore};
use crate::models::UserInfo;

pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";
pub const USER_INFO_COOKIE: &str = "userInfo";

/// Every cookie that together makes up a signed-in session.
pub const SESSION_COOKIES: [&str; 3] = [ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE, USER_INFO_COOKIE];

/// Access token and cached user live one day.
const ACCESS_TOKEN_DAYS: i64 = 1;

/// Refresh token lives a week.
const REFRESH_TOKEN_DAYS: i64 = 7;

/// Session state kept in cookies.
///
/// There is no client-side token validation or refresh: a session is
/// "authenticated" exactly while an access token cookie exists, and it ends
/// on logout or the first 401 from the API.
#[derive(Clone)]
pub struct Session {
    cookies: Arc<dyn CookieStore>,
    secure: bool,
}

impl Session {
    /// `secure` marks cookies HTTPS-only and is set in production.
    pub fn new(cookies: Arc<dyn CookieStore>, secure: bool) -> Self {
        Self { cookies, secure }
    }

    fn options(&self, days: i64) -> CookieOptions {
        CookieOptions::days(days, self.secure)
    }

    /// Persist tokens after a login or OAuth callback.
    pub fn save_tokens(&self, access_token: &str, refresh_token: &str, user: Option<&UserInfo>) -> Result<()> {
        self.cookies
            .set(ACCESS_TOKEN_COOKIE, access_token, &self.options(ACCESS_TOKEN_DAYS))?;
        self.cookies
            .set(REFRESH_TOKEN_COOKIE, refresh_token, &self.options(REFRESH_TOKEN_DAYS))?;
        if let Some(user) = user {
            self.save_user(user)?;
        }
        debug!("Session tokens saved");
        Ok(())
    }

    /// Replace the cached user, e.g. after a profile update.
    pub fn save_user(&self, user: &UserInfo) -> Result<()> {
        let json = serde_json::to_string(user)?;
        self.cookies.set(USER_INFO_COOKIE, &json, &self.options(ACCESS_TOKEN_DAYS))
    }

    pub fn access_token(&self) -> Option<String> {
        self.cookies.get(ACCESS_TOKEN_COOKIE).filter(|t| !t.is_empty())
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.cookies.get(REFRESH_TOKEN_COOKIE).filter(|t| !t.is_empty())
    }

    /// Cached user. An unparsable cookie reads as no user.
    pub fn user_info(&self) -> Option<UserInfo> {
        let raw = self.cookies.get(USER_INFO_COOKIE)?;
        serde_json::from_str(&raw).ok()
    }

    pub fn is_authenticated(&self) -> bool {
        self.access_token().is_some()
    }

    /// Remove every session cookie. All three are attempted even if one
    /// removal fails; the first failure is returned.
    pub fn clear(&self) -> Result<()> {
        let mut first_error = None;
        for name in SESSION_COOKIES {
            if let Err(e) = self.cookies.remove(name) {
                warn!(cookie = name, error = %e, "Failed to remove session cookie");
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::cookies::MemoryCookieStore;

    fn user() -> UserInfo {
        serde_json::from_str(r#"{"id": 3, "email": "lee@example.com", "profile_completed": true}"#)
            .expect("user parses")
    }

    fn session() -> (Session, Arc<MemoryCookieStore>) {
        let store = Arc::new(MemoryCookieStore::new());
        (Session::new(store.clone(), true), store)
    }

    #[test]
    fn test_save_tokens_sets_expirations() {
        let (session, store) = session();
        session.save_tokens("acc", "ref", Some(&user())).expect("save");

        assert!(session.is_authenticated());
        assert_eq!(session.access_token().as_deref(), Some("acc"));
        assert_eq!(session.refresh_token().as_deref(), Some("ref"));
        assert_eq!(session.user_info().map(|u| u.id), Some(3));

        let access = store.cookie(ACCESS_TOKEN_COOKIE).expect("access cookie");
        let refresh = store.cookie(REFRESH_TOKEN_COOKIE).expect("refresh cookie");
        assert!(access.secure);
        assert!(refresh.expires_at > access.expires_at);
        assert_eq!((refresh.expires_at - access.expires_at).num_days(), 6);
    }

    #[test]
    fn test_clear_removes_all_cookies() {
        let (session, store) = session();
        session.save_tokens("acc", "ref", Some(&user())).expect("save");
        session.clear().expect("clear");

        assert!(!session.is_authenticated());
        for name in SESSION_COOKIES {
            assert!(store.get(name).is_none(), "{} should be gone", name);
        }
    }

    #[test]
    fn test_corrupt_user_cookie_reads_as_none() {
        let (session, store) = session();
        store
            .set(USER_INFO_COOKIE, "{broken", &CookieOptions::days(1, false))
            .expect("set");
        assert!(session.user_info().is_none());
    }

    #[test]
    fn test_empty_token_is_not_authenticated() {
        let (session, _store) = session();
        session.save_tokens("", "ref", None).expect("save");
        assert!(!session.is_authenticated());
    }
}
