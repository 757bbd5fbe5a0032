use actix_web::{get, patch, post, put, web, HttpResponse};
use sqlx::PgPool;

use crate::error::AppError;
use crate::handlers::password_handler;
use crate::handlers::profile::profile::{get_me, get_user_profile, update_me, update_user_profile};
use crate::middleware::auth::Claims;
use crate::models::profile::UpdateProfileRequest;
use crate::models::user::{ChangePasswordRequest, UpdateUserRequest};

#[get("/")]
async fn current_user(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>
) -> Result<HttpResponse, AppError> {
    get_me(pool, claims).await
}

#[patch("/")]
async fn update_current_user(
    update_form: web::Json<UpdateUserRequest>,
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>
) -> Result<HttpResponse, AppError> {
    update_me(update_form, pool, claims).await
}

#[get("/profile/")]
async fn profile(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>
) -> Result<HttpResponse, AppError> {
    get_user_profile(pool, claims).await
}

#[put("/profile/")]
async fn update_profile(
    update_form: web::Json<UpdateProfileRequest>,
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>
) -> Result<HttpResponse, AppError> {
    update_user_profile(update_form, pool, claims).await
}

#[post("/change_password/")]
async fn change_password(
    password_form: web::Json<ChangePasswordRequest>,
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>
) -> Result<HttpResponse, AppError> {
    password_handler::change_password(password_form, pool, claims).await
}
