// src/routes/auth.rs
use actix_web::{post, web, HttpResponse};
use sqlx::PgPool;

use crate::config::jwt::JwtSettings;
use crate::config::settings::PasswordResetSettings;
use crate::error::AppError;
use crate::handlers::auth_handler::{login_user, logout_user, refresh_token};
use crate::handlers::password_handler;
use crate::handlers::wechat_handler::wechat_login;
use crate::middleware::auth::Claims;
use crate::models::auth::{LoginRequest, LogoutRequest, RefreshRequest, WechatLoginRequest};
use crate::models::user::{PasswordResetConfirm, PasswordResetRequest};
use crate::services::redis_service::RedisService;
use crate::services::wechat_client::WechatClient;

#[post("/auth/login/")]
async fn login(
    login_form: web::Json<LoginRequest>,
    pool: web::Data<PgPool>,
    jwt_settings: web::Data<JwtSettings>
) -> Result<HttpResponse, AppError> {
    login_user(login_form, pool, jwt_settings).await
}

#[post("/auth/refresh/")]
async fn refresh(
    refresh_form: web::Json<RefreshRequest>,
    pool: web::Data<PgPool>,
    jwt_settings: web::Data<JwtSettings>,
    redis: web::Data<RedisService>,
) -> Result<HttpResponse, AppError> {
    refresh_token(refresh_form, pool, jwt_settings, redis).await
}

#[post("/auth/wechat-login/")]
async fn wechat(
    login_form: web::Json<WechatLoginRequest>,
    pool: web::Data<PgPool>,
    jwt_settings: web::Data<JwtSettings>,
    wechat_client: web::Data<WechatClient>,
) -> Result<HttpResponse, AppError> {
    wechat_login(login_form, pool, jwt_settings, wechat_client).await
}

#[post("/users/request_password_reset/")]
async fn request_password_reset(
    reset_form: web::Json<PasswordResetRequest>,
    pool: web::Data<PgPool>,
    reset_settings: web::Data<PasswordResetSettings>,
) -> Result<HttpResponse, AppError> {
    password_handler::request_password_reset(reset_form, pool, reset_settings).await
}

#[post("/users/reset_password/")]
async fn reset_password(
    reset_form: web::Json<PasswordResetConfirm>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    password_handler::reset_password(reset_form, pool).await
}

// Mounted under an authenticated `/users/logout` scope
#[post("/")]
async fn logout(
    logout_form: Option<web::Json<LogoutRequest>>,
    claims: web::ReqData<Claims>,
    jwt_settings: web::Data<JwtSettings>,
    redis: web::Data<RedisService>,
) -> Result<HttpResponse, AppError> {
    logout_user(logout_form, claims, jwt_settings, redis).await
}
