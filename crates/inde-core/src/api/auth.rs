//! Account endpoints: email login/registration, social login callback,
//! profile completion and logout.

use anyhow::{Context, Result};
use reqwest::Method;
use tracing::{info, warn};

use super::ApiClient;
use crate::auth::{LOGIN_PATH, OAUTH_FAILED_REDIRECT};
use crate::models::{
    LoginRequest, LoginResponse, PostLoginRoute, ProfileCompleteRequest, ProfileCompleteResponse,
    RegisterRequest, RegisterResponse, UserInfo,
};

const LOGIN_ENDPOINT: &str = "/auth/login/";
const REGISTER_ENDPOINT: &str = "/auth/register/";
const LOGOUT_ENDPOINT: &str = "/auth/logout/";
const ME_ENDPOINT: &str = "/me/";
const PROFILE_COMPLETE_ENDPOINT: &str = "/profile/complete/";

impl ApiClient {
    /// Email/password login. Tokens are written to the session cookies when
    /// the server returns both.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse> {
        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response: LoginResponse = self
            .send_json(Method::POST, LOGIN_ENDPOINT, Some(&request))
            .await
            .context("Login failed")?;

        if !response.access_token.is_empty() && !response.refresh_token.is_empty() {
            self.session()
                .save_tokens(&response.access_token, &response.refresh_token, Some(&response.user))?;
            info!(user_id = response.user.id, "Logged in");
        }
        Ok(response)
    }

    /// Create an account. The server mails a verification link; no session
    /// is started.
    pub async fn register(&self, email: &str, password: &str, password2: &str) -> Result<RegisterResponse> {
        let request = RegisterRequest {
            email: email.to_string(),
            password: password.to_string(),
            password2: password2.to_string(),
        };
        self.send_json(Method::POST, REGISTER_ENDPOINT, Some(&request))
            .await
            .context("Registration failed")
    }

    /// The user behind the current access token.
    pub async fn me(&self) -> Result<UserInfo> {
        self.get(ME_ENDPOINT).await
    }

    /// Submit the signup profile form. The cached user cookie is replaced
    /// with what the server returns.
    pub async fn complete_profile(&self, request: &ProfileCompleteRequest) -> Result<ProfileCompleteResponse> {
        let response: ProfileCompleteResponse = self
            .send_json(Method::PUT, PROFILE_COMPLETE_ENDPOINT, Some(request))
            .await
            .context("Profile update failed")?;

        if let Some(ref user) = response.user {
            self.session().save_user(user)?;
        }
        Ok(response)
    }

    /// Edit an existing profile. Same endpoint as completion.
    pub async fn update_profile(&self, request: &ProfileCompleteRequest) -> Result<ProfileCompleteResponse> {
        self.complete_profile(request).await
    }

    /// Finish a social login: store the issued tokens, load the user and
    /// decide where to go next.
    ///
    /// On failure the navigator is sent to the login page with
    /// `error=OAUTH_FAILED`.
    pub async fn oauth_callback(&self, access_token: &str, refresh_token: &str) -> Result<PostLoginRoute> {
        self.session().save_tokens(access_token, refresh_token, None)?;

        let user = match self.me().await {
            Ok(user) => user,
            Err(e) => {
                warn!(error = %e, "Social login callback failed");
                self.navigator().navigate(OAUTH_FAILED_REDIRECT);
                return Err(e.context("Social login failed"));
            }
        };

        self.session().save_user(&user)?;
        let route = user.landing_route();
        self.navigator().navigate(route.path());
        Ok(route)
    }

    /// Sign out. Local cookies are removed even when the server call fails.
    pub async fn logout(&self) -> Result<()> {
        if let Err(e) = self.send::<()>(Method::POST, LOGOUT_ENDPOINT, None, false).await {
            warn!(error = %e, "Logout request failed");
        }
        self.session().clear()?;
        self.navigator().navigate(LOGIN_PATH);
        info!("Logged out");
        Ok(())
    }
}
