//! Account models for login, registration and profile completion.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[serde(rename_all = "UPPERCASE")]
pub enum RegionType {
    Domestic,
    Foreign,
}

/// How the account was originally created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[serde(rename_all = "UPPERCASE")]
pub enum JoinedVia {
    Local,
    Kakao,
    Naver,
    Google,
}

/// The signed-in user as the API reports it. Also stored in the
/// `userInfo` cookie.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct UserInfo {
    pub id: i64,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_month: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_day: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region_type: Option<RegionType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region_domestic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region_foreign: Option<String>,
    #[serde(default)]
    pub profile_completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub joined_via: Option<JoinedVia>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub is_staff: bool,
}

impl UserInfo {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().filter(|n| !n.is_empty()).unwrap_or(&self.email)
    }

    /// Where to send the user after a successful sign-in.
    pub fn landing_route(&self) -> PostLoginRoute {
        if self.profile_completed {
            PostLoginRoute::Home
        } else {
            PostLoginRoute::CompleteProfile
        }
    }
}

/// Destination after login or an OAuth callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostLoginRoute {
    Home,
    CompleteProfile,
}

impl PostLoginRoute {
    pub fn path(&self) -> &'static str {
        match self {
            PostLoginRoute::Home => "/",
            PostLoginRoute::CompleteProfile => "/signup/complete",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocialProvider {
    Kakao,
    Naver,
    Google,
}

impl SocialProvider {
    pub fn slug(&self) -> &'static str {
        match self {
            SocialProvider::Kakao => "kakao",
            SocialProvider::Naver => "naver",
            SocialProvider::Google => "google",
        }
    }
}

impl std::str::FromStr for SocialProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "kakao" => Ok(SocialProvider::Kakao),
            "naver" => Ok(SocialProvider::Naver),
            "google" => Ok(SocialProvider::Google),
            other => Err(format!("Unknown social provider: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
    pub user: UserInfo,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub password2: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterResponse {
    #[serde(default)]
    pub message: String,
    pub user: UserInfo,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileCompleteRequest {
    pub email: String,
    pub phone: String,
    pub name: String,
    pub position: String,
    pub birth_year: i32,
    pub birth_month: u32,
    pub birth_day: u32,
    pub region_type: RegionType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region_domestic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region_foreign: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProfileCompleteResponse {
    #[serde(default)]
    pub message: String,
    pub user: Option<UserInfo>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_login_response() {
        let json = r#"{
            "access_token": "acc",
            "refresh_token": "ref",
            "user": {
                "id": 7,
                "email": "kim@example.com",
                "name": "김철수",
                "region_type": "DOMESTIC",
                "profile_completed": false,
                "joined_via": "KAKAO"
            }
        }"#;
        let resp: LoginResponse = serde_json::from_str(json).expect("login response parses");
        assert_eq!(resp.access_token, "acc");
        assert_eq!(resp.user.region_type, Some(RegionType::Domestic));
        assert_eq!(resp.user.joined_via, Some(JoinedVia::Kakao));
        assert_eq!(resp.user.landing_route(), PostLoginRoute::CompleteProfile);
        assert_eq!(resp.user.display_name(), "김철수");
    }

    #[test]
    fn test_user_info_minimal() {
        let user: UserInfo = serde_json::from_str(r#"{"id": 1, "email": "a@b.kr", "profile_completed": true}"#)
            .expect("minimal user parses");
        assert_eq!(user.landing_route().path(), "/");
        assert_eq!(user.display_name(), "a@b.kr");
        assert!(!user.is_staff);

        // Optional fields stay out of the serialized cookie value
        let json = serde_json::to_string(&user).expect("serializes");
        assert!(!json.contains("phone"));
    }

    #[test]
    fn test_social_provider_parse() {
        assert_eq!("Google".parse::<SocialProvider>(), Ok(SocialProvider::Google));
        assert!("facebook".parse::<SocialProvider>().is_err());
    }
}
