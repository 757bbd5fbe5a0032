// src/models/auth.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use secrecy::SecretString;
use uuid::Uuid;

use crate::models::profile::{Gender, UserProfile};

#[derive(Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    #[serde(serialize_with = "crate::models::user::serialize_secret_string",
            deserialize_with = "crate::models::user::deserialize_secret_string")]
    pub password: SecretString,
}

#[derive(Deserialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

#[derive(Serialize)]
pub struct RefreshResponse {
    pub access: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct LogoutRequest {
    pub refresh: Option<String>,
}

/// Profile data the mini-program obtains from `wx.getUserProfile`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WechatUserInfo {
    pub nick_name: Option<String>,
    pub avatar_url: Option<String>,
    pub gender: Option<i32>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WechatLoginRequest {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default, rename = "userInfo")]
    pub user_info: Option<WechatUserInfo>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WechatUserResponse {
    pub id: Uuid,
    pub open_id: String,
    pub nick_name: String,
    pub avatar_url: String,
    pub gender: i32,
    pub country: String,
    pub province: String,
    pub city: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WechatUserResponse {
    pub fn new(username: &str, openid: &str, profile: &UserProfile) -> Self {
        let nick_name = profile
            .nickname
            .clone()
            .filter(|nick| !nick.is_empty())
            .unwrap_or_else(|| username.to_string());

        Self {
            id: profile.user_id,
            open_id: openid.to_string(),
            nick_name,
            avatar_url: profile.avatar_url.clone().unwrap_or_default(),
            gender: Gender::wechat_code(&profile.gender),
            country: profile.country.clone().unwrap_or_default(),
            province: profile.province.clone().unwrap_or_default(),
            city: profile.city.clone().unwrap_or_default(),
            created_at: profile.created_at,
            updated_at: profile.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WechatLoginResponse {
    pub token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
    pub user_info: WechatUserResponse,
}
