use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::jwt::JwtSettings;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    Access,
    Refresh,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,  // Subject (user id)
    pub username: String,
    pub token_type: TokenType,
    pub jti: String,  // Token id, the revocation key
    pub iat: usize,
    pub exp: usize,   // Expiration time (as UTC timestamp)
}

impl Claims {
    /// Parse the user ID from the claims subject field.
    /// Returns None if the UUID is invalid.
    pub fn user_id(&self) -> Option<Uuid> {
        Uuid::parse_str(&self.sub).ok()
    }

    /// Seconds until `exp`, zero once expired.
    pub fn remaining_lifetime_secs(&self) -> u64 {
        let now = Utc::now().timestamp().max(0) as usize;
        self.exp.saturating_sub(now) as u64
    }
}

#[derive(Debug, Serialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

pub fn generate_token(
    user_id: Uuid,
    username: &str,
    token_type: TokenType,
    jwt_settings: &JwtSettings,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let lifetime = match token_type {
        TokenType::Access => jwt_settings.access_token_lifetime(),
        TokenType::Refresh => jwt_settings.refresh_token_lifetime(),
    };
    let expires_at = now + lifetime;

    let claims = Claims {
        sub: user_id.to_string(),
        username: username.to_string(),
        token_type,
        jti: Uuid::new_v4().to_string(),
        iat: now.timestamp() as usize,
        exp: expires_at.timestamp() as usize,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(jwt_settings.secret.expose_secret().as_bytes()),
    )
}

pub fn generate_token_pair(
    user_id: Uuid,
    username: &str,
    jwt_settings: &JwtSettings,
) -> Result<TokenPair, jsonwebtoken::errors::Error> {
    Ok(TokenPair {
        access: generate_token(user_id, username, TokenType::Access, jwt_settings)?,
        refresh: generate_token(user_id, username, TokenType::Refresh, jwt_settings)?,
    })
}

pub fn decode_token(
    token: &str,
    jwt_settings: &JwtSettings,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_settings.secret.expose_secret().as_bytes()),
        &Validation::new(Algorithm::HS256),
    )?;

    Ok(token_data.claims)
}
