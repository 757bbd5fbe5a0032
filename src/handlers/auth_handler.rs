// src/handlers/auth_handler.rs
use actix_web::{web, HttpResponse};
use secrecy::ExposeSecret;
use sqlx::PgPool;

use crate::auth::jwt::{decode_token, generate_token, generate_token_pair, Claims, TokenType};
use crate::config::jwt::JwtSettings;
use crate::db::users::{find_user_by_id, find_user_by_username, touch_last_login};
use crate::error::AppError;
use crate::models::auth::{LoginRequest, LogoutRequest, RefreshRequest, RefreshResponse};
use crate::models::user::MessageResponse;
use crate::services::redis_service::RedisService;
use crate::utils::parse_user::parse_user_id;
use crate::utils::password::verify_password;

const INVALID_CREDENTIALS: &str = "No active account found with the given credentials";

#[tracing::instrument(
    name = "Login user attempt",
    skip(login_form, pool, jwt_settings),
    fields(
        username = %login_form.username
    )
)]
pub async fn login_user(
    login_form: web::Json<LoginRequest>,
    pool: web::Data<PgPool>,
    jwt_settings: web::Data<JwtSettings>
) -> Result<HttpResponse, AppError> {
    let Some(user) = find_user_by_username(&pool, &login_form.username).await? else {
        tracing::info!("User not found");
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    };

    if !user.is_active || !user.has_usable_password() {
        tracing::info!("Account {} cannot sign in with a password", user.id);
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    }

    let password_hash = user.password_hash.as_deref().unwrap_or_default();
    if !verify_password(login_form.password.expose_secret(), password_hash) {
        tracing::info!("Invalid password");
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    }

    let tokens = generate_token_pair(user.id, &user.username, &jwt_settings).map_err(|e| {
        AppError::Internal(format!("Error generating JWT token: {:?}", e))
    })?;

    touch_last_login(&pool, user.id).await?;

    tracing::info!("User {} logged in", user.id);
    Ok(HttpResponse::Ok().json(tokens))
}

#[tracing::instrument(name = "Refresh access token", skip(refresh_form, pool, jwt_settings, redis))]
pub async fn refresh_token(
    refresh_form: web::Json<RefreshRequest>,
    pool: web::Data<PgPool>,
    jwt_settings: web::Data<JwtSettings>,
    redis: web::Data<RedisService>,
) -> Result<HttpResponse, AppError> {
    let claims = decode_token(&refresh_form.refresh, &jwt_settings).map_err(|e| {
        tracing::info!("Rejected refresh token: {:?}", e);
        AppError::Unauthorized("Token is invalid or expired".to_string())
    })?;

    if claims.token_type != TokenType::Refresh {
        return Err(AppError::Unauthorized("Token has wrong type".to_string()));
    }
    if redis.is_token_revoked(&claims.jti).await {
        return Err(AppError::Unauthorized("Token is blacklisted".to_string()));
    }

    let user_id = parse_user_id(&claims)?;
    let user = find_user_by_id(&pool, user_id)
        .await?
        .filter(|user| user.is_active)
        .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;

    let access = generate_token(user.id, &user.username, TokenType::Access, &jwt_settings)
        .map_err(|e| AppError::Internal(format!("Error generating JWT token: {:?}", e)))?;

    Ok(HttpResponse::Ok().json(RefreshResponse { access }))
}

#[tracing::instrument(
    name = "Logout user",
    skip(logout_form, claims, jwt_settings, redis),
    fields(username = %claims.username)
)]
pub async fn logout_user(
    logout_form: Option<web::Json<LogoutRequest>>,
    claims: web::ReqData<Claims>,
    jwt_settings: web::Data<JwtSettings>,
    redis: web::Data<RedisService>,
) -> Result<HttpResponse, AppError> {
    let mut revoke = vec![claims.into_inner()];

    if let Some(refresh) = logout_form.and_then(|form| form.into_inner().refresh) {
        match decode_token(&refresh, &jwt_settings) {
            Ok(refresh_claims) if refresh_claims.token_type == TokenType::Refresh => {
                revoke.push(refresh_claims)
            }
            _ => return Err(AppError::BadRequest("Invalid refresh token".to_string())),
        }
    }

    for token in &revoke {
        // Revocation is best effort: a Redis outage must not block logout
        if let Err(e) = redis.revoke_token(token).await {
            tracing::warn!("Failed to revoke token {}: {}", token.jti, e);
        }
    }

    Ok(HttpResponse::Ok().json(MessageResponse::new("Successfully logged out")))
}
