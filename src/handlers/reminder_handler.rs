use actix_web::{web, HttpResponse};
use chrono::{NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::db::reminders::{
    delete_reminder, find_reminder, insert_reminder, list_active_reminders, list_reminders,
    update_reminder,
};
use crate::error::{field_errors, AppError, FieldErrors};
use crate::middleware::auth::Claims;
use crate::models::reminder::{ReminderPatch, ReminderRequest, TodayQuery, TodayResponse};
use crate::utils::datetime::parse_date;
use crate::utils::parse_user::parse_user_id;

/// Field checks plus the frequency-dependent schedule rules.
fn validate_reminder(reminder: &ReminderRequest, start_date: NaiveDate) -> Result<(), AppError> {
    let mut errors: FieldErrors = match reminder.validate() {
        Ok(()) => FieldErrors::new(),
        Err(e) => field_errors(&e),
    };
    for (field, messages) in reminder.schedule(start_date).validate(&reminder.times) {
        errors.entry(field).or_default().extend(messages);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}

#[tracing::instrument(
    name = "List reminders",
    skip(pool, claims),
    fields(username = %claims.username)
)]
pub async fn list(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
) -> Result<HttpResponse, AppError> {
    let user_id = parse_user_id(&claims)?;
    let reminders = list_reminders(&pool, user_id).await?;
    Ok(HttpResponse::Ok().json(reminders))
}

#[tracing::instrument(
    name = "Create reminder",
    skip(reminder_form, pool, claims),
    fields(username = %claims.username)
)]
pub async fn create(
    reminder_form: web::Json<ReminderRequest>,
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
) -> Result<HttpResponse, AppError> {
    let user_id = parse_user_id(&claims)?;
    let start_date = Utc::now().date_naive();
    validate_reminder(&reminder_form, start_date)?;

    let reminder = insert_reminder(&pool, user_id, &reminder_form, start_date).await?;

    tracing::info!("Created reminder {} for user {}", reminder.id, user_id);
    Ok(HttpResponse::Created().json(reminder))
}

#[tracing::instrument(
    name = "Get reminder",
    skip(pool, claims),
    fields(username = %claims.username)
)]
pub async fn get(
    reminder_id: web::Path<Uuid>,
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
) -> Result<HttpResponse, AppError> {
    let user_id = parse_user_id(&claims)?;
    let reminder = find_reminder(&pool, user_id, *reminder_id)
        .await?
        .ok_or_else(|| AppError::not_found("Reminder"))?;
    Ok(HttpResponse::Ok().json(reminder))
}

#[tracing::instrument(
    name = "Replace reminder",
    skip(reminder_form, pool, claims),
    fields(username = %claims.username)
)]
pub async fn replace(
    reminder_id: web::Path<Uuid>,
    reminder_form: web::Json<ReminderRequest>,
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
) -> Result<HttpResponse, AppError> {
    let user_id = parse_user_id(&claims)?;
    let existing = find_reminder(&pool, user_id, *reminder_id)
        .await?
        .ok_or_else(|| AppError::not_found("Reminder"))?;
    validate_reminder(&reminder_form, existing.start_date)?;

    let reminder = update_reminder(&pool, user_id, *reminder_id, &reminder_form)
        .await?
        .ok_or_else(|| AppError::not_found("Reminder"))?;
    Ok(HttpResponse::Ok().json(reminder))
}

#[tracing::instrument(
    name = "Patch reminder",
    skip(patch_form, pool, claims),
    fields(username = %claims.username)
)]
pub async fn patch(
    reminder_id: web::Path<Uuid>,
    patch_form: web::Json<ReminderPatch>,
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
) -> Result<HttpResponse, AppError> {
    let user_id = parse_user_id(&claims)?;
    let existing = find_reminder(&pool, user_id, *reminder_id)
        .await?
        .ok_or_else(|| AppError::not_found("Reminder"))?;

    let merged = patch_form.into_inner().apply_to(&existing);
    validate_reminder(&merged, existing.start_date)?;

    let reminder = update_reminder(&pool, user_id, *reminder_id, &merged)
        .await?
        .ok_or_else(|| AppError::not_found("Reminder"))?;
    Ok(HttpResponse::Ok().json(reminder))
}

#[tracing::instrument(
    name = "Delete reminder",
    skip(pool, claims),
    fields(username = %claims.username)
)]
pub async fn delete(
    reminder_id: web::Path<Uuid>,
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
) -> Result<HttpResponse, AppError> {
    let user_id = parse_user_id(&claims)?;
    if !delete_reminder(&pool, user_id, *reminder_id).await? {
        return Err(AppError::not_found("Reminder"));
    }
    Ok(HttpResponse::NoContent().finish())
}

/// Active reminders due on `date` (default today, UTC).
#[tracing::instrument(
    name = "Reminders due today",
    skip(query, pool, claims),
    fields(username = %claims.username)
)]
pub async fn today(
    query: web::Query<TodayQuery>,
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
) -> Result<HttpResponse, AppError> {
    let user_id = parse_user_id(&claims)?;

    let date = match query.date.as_deref().filter(|raw| !raw.is_empty()) {
        Some(raw) => parse_date(raw)
            .ok_or_else(|| AppError::field("date", "Date has wrong format. Use YYYY-MM-DD."))?,
        None => Utc::now().date_naive(),
    };

    let reminders = list_active_reminders(&pool, user_id)
        .await?
        .into_iter()
        .filter(|reminder| reminder.schedule().occurs_on(date))
        .collect();

    Ok(HttpResponse::Ok().json(TodayResponse { date, reminders }))
}
