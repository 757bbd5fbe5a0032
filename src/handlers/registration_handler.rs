use actix_web::{web, HttpResponse};
use secrecy::ExposeSecret;
use sqlx::PgPool;
use validator::Validate;

use crate::db::users::{insert_user_with_profile, username_taken, NewUser};
use crate::error::{is_unique_violation, AppError};
use crate::models::user::{RegistrationRequest, RegistrationResponse};
use crate::utils::password::hash_password;

const USERNAME_TAKEN: &str = "A user with that username already exists.";

#[tracing::instrument(
    name = "Adding a new user",
    // Don't show arguments
    skip(user_form, pool),
    fields(
        username = %user_form.username,
        email = %user_form
    )
)]
pub async fn register_user(
    user_form: web::Json<RegistrationRequest>,
    pool: web::Data<PgPool>
) -> Result<HttpResponse, AppError> {
    user_form.validate()?;

    if username_taken(&pool, &user_form.username, None).await? {
        return Err(AppError::field("username", USERNAME_TAKEN));
    }

    let password_hash = hash_password(user_form.password.expose_secret())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;

    let new_user = NewUser {
        username: &user_form.username,
        email: user_form.email.as_deref().unwrap_or_default(),
        password_hash: Some(&password_hash),
        openid: None,
    };

    let (user, _profile) = match insert_user_with_profile(&pool, new_user).await {
        Ok(created) => created,
        // Lost a race against a concurrent signup with the same name
        Err(e) if is_unique_violation(&e) => {
            return Err(AppError::field("username", USERNAME_TAKEN))
        }
        Err(e) => return Err(e.into()),
    };

    Ok(HttpResponse::Created().json(RegistrationResponse::from(user)))
}
