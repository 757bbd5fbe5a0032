use actix_web::{post, web, HttpResponse};
use sqlx::PgPool;

use crate::error::AppError;
use crate::handlers::registration_handler::register_user;
use crate::models::user::RegistrationRequest;

#[post("/users/")]
async fn register(
    user_form: web::Json<RegistrationRequest>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    register_user(user_form, pool).await
}
