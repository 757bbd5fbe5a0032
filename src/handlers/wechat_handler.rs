use actix_web::{web, HttpResponse};
use sqlx::PgPool;

use crate::auth::jwt::generate_token_pair;
use crate::config::jwt::JwtSettings;
use crate::db::profiles::apply_wechat_user_info;
use crate::db::users::{find_or_create_wechat_user, touch_last_login};
use crate::error::AppError;
use crate::models::auth::{WechatLoginRequest, WechatLoginResponse, WechatUserResponse};
use crate::services::wechat_client::WechatClient;

/// Exchange a mini-program login code for tokens, creating the account on first login.
#[tracing::instrument(name = "WeChat login", skip(login_form, pool, jwt_settings, wechat))]
pub async fn wechat_login(
    login_form: web::Json<WechatLoginRequest>,
    pool: web::Data<PgPool>,
    jwt_settings: web::Data<JwtSettings>,
    wechat: web::Data<WechatClient>,
) -> Result<HttpResponse, AppError> {
    let WechatLoginRequest { code, user_info } = login_form.into_inner();
    let code = code
        .filter(|code| !code.trim().is_empty())
        .ok_or_else(|| AppError::field("code", "This field is required."))?;

    let session = wechat.code_to_session(code.trim()).await?;

    let (user, mut profile, created) = find_or_create_wechat_user(&pool, &session.openid).await?;
    if created {
        tracing::info!("Created WeChat account {} for openid {}", user.id, session.openid);
    }

    if !user.is_active {
        return Err(AppError::Unauthorized("User account is disabled".to_string()));
    }

    if let Some(info) = user_info {
        profile = apply_wechat_user_info(&pool, user.id, &info).await?;
    }

    let tokens = generate_token_pair(user.id, &user.username, &jwt_settings)
        .map_err(|e| AppError::Internal(format!("Error generating JWT token: {:?}", e)))?;

    touch_last_login(&pool, user.id).await?;

    Ok(HttpResponse::Ok().json(WechatLoginResponse {
        token: tokens.access,
        refresh_token: tokens.refresh,
        expires_in: jwt_settings.access_token_lifetime().num_seconds(),
        user_info: WechatUserResponse::new(&user.username, &session.openid, &profile),
    }))
}
