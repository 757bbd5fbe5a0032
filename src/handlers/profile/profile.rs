use actix_web::{web, HttpResponse};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::db::profiles::{find_profile_by_user, update_profile};
use crate::db::users::{find_user_by_id, update_user, username_taken};
use crate::error::{field_errors, merge_field_errors, AppError, FieldErrors};
use crate::middleware::auth::Claims;
use crate::models::profile::{ProfileSummary, UpdateProfileRequest, UserProfile};
use crate::models::user::{validate_unreserved_username, UpdateUserRequest, User, UserResponse};
use crate::utils::parse_user::parse_user_id;

async fn load_user_and_profile(pool: &PgPool, user_id: Uuid) -> Result<(User, UserProfile), AppError> {
    let user = find_user_by_id(pool, user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;
    let profile = find_profile_by_user(pool, user_id)
        .await?
        .ok_or_else(|| AppError::not_found("Profile"))?;
    Ok((user, profile))
}

fn user_response(user: User, profile: &UserProfile) -> UserResponse {
    UserResponse {
        id: user.id,
        username: user.username,
        email: user.email,
        profile: ProfileSummary::from(profile),
    }
}

#[tracing::instrument(
    name = "Get current user",
    skip(pool, claims),
    fields(username = %claims.username)
)]
pub async fn get_me(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>
) -> Result<HttpResponse, AppError> {
    let user_id = parse_user_id(&claims)?;
    let (user, profile) = load_user_and_profile(&pool, user_id).await?;
    Ok(HttpResponse::Ok().json(user_response(user, &profile)))
}

#[tracing::instrument(
    name = "Update current user",
    skip(update_form, pool, claims),
    fields(username = %claims.username)
)]
pub async fn update_me(
    update_form: web::Json<UpdateUserRequest>,
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>
) -> Result<HttpResponse, AppError> {
    let user_id = parse_user_id(&claims)?;
    let update = update_form.into_inner();

    let mut errors: FieldErrors = match update.validate() {
        Ok(()) => FieldErrors::new(),
        Err(e) => field_errors(&e),
    };
    if let Some(Err(e)) = update.profile.as_ref().map(Validate::validate) {
        merge_field_errors(&mut errors, "profile", field_errors(&e));
    }
    if let Some(username) = update.username.as_deref() {
        let current = find_user_by_id(&pool, user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))?;
        // WeChat accounts may resubmit their own name, nobody may take a new one
        if username != current.username {
            if let Err(e) = validate_unreserved_username(username) {
                let message = e.message.map(|m| m.to_string()).unwrap_or_default();
                errors.entry("username".to_string()).or_default().push(message);
            }
        }
        if username_taken(&pool, username, Some(user_id)).await? {
            errors
                .entry("username".to_string())
                .or_default()
                .push("A user with that username already exists.".to_string());
        }
    }
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let mut tx = pool.begin().await?;
    let user = update_user(&mut *tx, user_id, update.username.as_deref(), update.email.as_deref()).await?;
    let profile = update_profile(
        &mut *tx,
        user_id,
        update.profile.as_ref().unwrap_or(&UpdateProfileRequest::default()),
    )
    .await?;
    tx.commit().await?;

    tracing::info!("Updated user {}", user_id);
    Ok(HttpResponse::Ok().json(user_response(user, &profile)))
}

#[tracing::instrument(
    name = "Get user profile",
    skip(pool, claims),
    fields(username = %claims.username)
)]
pub async fn get_user_profile(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>
) -> Result<HttpResponse, AppError> {
    let user_id = parse_user_id(&claims)?;

    tracing::info!("Fetching user profile for: {}", user_id);

    let profile = find_profile_by_user(&pool, user_id)
        .await?
        .ok_or_else(|| AppError::not_found("Profile"))?;
    Ok(HttpResponse::Ok().json(profile))
}

#[tracing::instrument(
    name = "Update user profile",
    skip(update_form, pool, claims),
    fields(username = %claims.username)
)]
pub async fn update_user_profile(
    update_form: web::Json<UpdateProfileRequest>,
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>
) -> Result<HttpResponse, AppError> {
    let user_id = parse_user_id(&claims)?;
    update_form.validate()?;

    let profile = update_profile(pool.get_ref(), user_id, &update_form).await?;
    Ok(HttpResponse::Ok().json(profile))
}
