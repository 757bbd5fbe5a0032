use actix_web::{web, HttpResponse};
use chrono::{Duration, Utc};
use secrecy::ExposeSecret;
use sqlx::PgPool;
use validator::Validate;

use crate::config::settings::PasswordResetSettings;
use crate::db::password_resets::{consume_reset_token, insert_reset_token};
use crate::db::users::{find_active_user_by_email, find_user_by_id, update_password};
use crate::error::AppError;
use crate::middleware::auth::Claims;
use crate::models::user::{
    ChangePasswordRequest, MessageResponse, PasswordResetConfirm, PasswordResetRequest,
};
use crate::services::password_reset::{deliver_reset_token, generate_reset_token, hash_reset_token};
use crate::utils::parse_user::parse_user_id;
use crate::utils::password::{hash_password, verify_password};

fn hash(password: &str) -> Result<String, AppError> {
    hash_password(password).map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
}

#[tracing::instrument(
    name = "Change password",
    skip(password_form, pool, claims),
    fields(username = %claims.username)
)]
pub async fn change_password(
    password_form: web::Json<ChangePasswordRequest>,
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
) -> Result<HttpResponse, AppError> {
    let user_id = parse_user_id(&claims)?;
    let user = find_user_by_id(&pool, user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;

    // WeChat-only accounts have no old password to match
    let current_hash = user.password_hash.as_deref().unwrap_or_default();
    if !verify_password(password_form.old_password.expose_secret(), current_hash) {
        return Err(AppError::field("old_password", "Wrong password."));
    }

    password_form.validate()?;

    let new_hash = hash(password_form.new_password.expose_secret())?;
    update_password(pool.get_ref(), user_id, &new_hash).await?;

    tracing::info!("Password changed for user {}", user_id);
    Ok(HttpResponse::Ok().json(MessageResponse::new("Password updated successfully")))
}

#[tracing::instrument(name = "Request password reset", skip(reset_form, pool, reset_settings))]
pub async fn request_password_reset(
    reset_form: web::Json<PasswordResetRequest>,
    pool: web::Data<PgPool>,
    reset_settings: web::Data<PasswordResetSettings>,
) -> Result<HttpResponse, AppError> {
    let email = reset_form.email.trim();
    if email.is_empty() {
        return Err(AppError::field("email", "This field is required."));
    }

    let user = find_active_user_by_email(&pool, email)
        .await?
        .ok_or_else(|| AppError::NotFound("No user found with this email".to_string()))?;

    let token = generate_reset_token();
    let expires_at = Utc::now() + Duration::minutes(reset_settings.token_ttl_minutes);
    insert_reset_token(&pool, user.id, &token.hash, expires_at).await?;

    deliver_reset_token(&user.email, &token.token);

    Ok(HttpResponse::Ok().json(MessageResponse::new(
        "Password reset instructions have been sent to your email",
    )))
}

#[tracing::instrument(name = "Reset password", skip(reset_form, pool))]
pub async fn reset_password(
    reset_form: web::Json<PasswordResetConfirm>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    reset_form.validate()?;

    let mut tx = pool.begin().await?;

    let user_id = consume_reset_token(&mut *tx, &hash_reset_token(reset_form.token.trim()))
        .await?
        .ok_or_else(|| AppError::BadRequest("Invalid or expired reset token".to_string()))?;

    let new_hash = hash(reset_form.new_password.expose_secret())?;
    update_password(&mut *tx, user_id, &new_hash).await?;

    tx.commit().await?;

    tracing::info!("Password reset completed for user {}", user_id);
    Ok(HttpResponse::Ok().json(MessageResponse::new("Password has been reset")))
}
