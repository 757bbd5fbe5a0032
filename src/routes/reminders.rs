use actix_web::{delete, get, patch, post, put, web, HttpResponse};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;
use crate::handlers::reminder_handler;
use crate::middleware::auth::Claims;
use crate::models::reminder::{ReminderPatch, ReminderRequest, TodayQuery};

#[get("/")]
async fn list_reminders(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
) -> Result<HttpResponse, AppError> {
    reminder_handler::list(pool, claims).await
}

#[post("/")]
async fn create_reminder(
    reminder_form: web::Json<ReminderRequest>,
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
) -> Result<HttpResponse, AppError> {
    reminder_handler::create(reminder_form, pool, claims).await
}

#[get("/today/")]
async fn reminders_today(
    query: web::Query<TodayQuery>,
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
) -> Result<HttpResponse, AppError> {
    reminder_handler::today(query, pool, claims).await
}

#[get("/{reminder_id}/")]
async fn get_reminder(
    reminder_id: web::Path<Uuid>,
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
) -> Result<HttpResponse, AppError> {
    reminder_handler::get(reminder_id, pool, claims).await
}

#[put("/{reminder_id}/")]
async fn replace_reminder(
    reminder_id: web::Path<Uuid>,
    reminder_form: web::Json<ReminderRequest>,
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
) -> Result<HttpResponse, AppError> {
    reminder_handler::replace(reminder_id, reminder_form, pool, claims).await
}

#[patch("/{reminder_id}/")]
async fn patch_reminder(
    reminder_id: web::Path<Uuid>,
    patch_form: web::Json<ReminderPatch>,
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
) -> Result<HttpResponse, AppError> {
    reminder_handler::patch(reminder_id, patch_form, pool, claims).await
}

#[delete("/{reminder_id}/")]
async fn delete_reminder(
    reminder_id: web::Path<Uuid>,
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
) -> Result<HttpResponse, AppError> {
    reminder_handler::delete(reminder_id, pool, claims).await
}
