use actix_web::{web, HttpResponse};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::db::health_records::{
    delete_health_record, find_health_record, insert_health_record, insert_health_records_batch,
    list_health_records, update_health_record,
};
use crate::error::{field_errors, merge_field_errors, AppError, FieldErrors};
use crate::middleware::auth::Claims;
use crate::models::health_record::{HealthRecordListQuery, HealthRecordPatch, HealthRecordRequest};
use crate::utils::datetime::parse_date;
use crate::utils::parse_user::parse_user_id;

#[tracing::instrument(
    name = "List health records",
    skip(query, pool, claims),
    fields(username = %claims.username)
)]
pub async fn list_records(
    query: web::Query<HealthRecordListQuery>,
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
) -> Result<HttpResponse, AppError> {
    let user_id = parse_user_id(&claims)?;

    let start_date = query.start_date.as_deref().filter(|raw| !raw.is_empty());
    let end_date = query.end_date.as_deref().filter(|raw| !raw.is_empty());
    let (start, end) = (start_date.map(parse_date), end_date.map(parse_date));

    // An unparseable bound matches nothing rather than failing the request
    if matches!(start, Some(None)) || matches!(end, Some(None)) {
        tracing::info!("Invalid date filter {:?}..{:?}", start_date, end_date);
        return Ok(HttpResponse::Ok().json(Vec::<()>::new()));
    }

    let records = list_health_records(&pool, user_id, start.flatten(), end.flatten()).await?;
    Ok(HttpResponse::Ok().json(records))
}

#[tracing::instrument(
    name = "Create health record",
    skip(record_form, pool, claims),
    fields(username = %claims.username)
)]
pub async fn create_record(
    record_form: web::Json<HealthRecordRequest>,
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
) -> Result<HttpResponse, AppError> {
    let user_id = parse_user_id(&claims)?;
    record_form.validate()?;

    let record = insert_health_record(pool.get_ref(), user_id, &record_form.into_inner().normalized()).await?;

    tracing::info!("Created health record {} for user {}", record.id, user_id);
    Ok(HttpResponse::Created().json(record))
}

#[tracing::instrument(
    name = "Batch create health records",
    skip(records_form, pool, claims),
    fields(username = %claims.username, count = records_form.len())
)]
pub async fn batch_create_records(
    records_form: web::Json<Vec<HealthRecordRequest>>,
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
) -> Result<HttpResponse, AppError> {
    let user_id = parse_user_id(&claims)?;
    let records = records_form.into_inner();

    if records.is_empty() {
        return Err(AppError::BadRequest("Expected a non-empty list of records".to_string()));
    }

    let mut errors = FieldErrors::new();
    for (index, record) in records.iter().enumerate() {
        if let Err(e) = record.validate() {
            merge_field_errors(&mut errors, &index.to_string(), field_errors(&e));
        }
    }
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let records: Vec<HealthRecordRequest> =
        records.into_iter().map(HealthRecordRequest::normalized).collect();
    let created = insert_health_records_batch(&pool, user_id, &records).await?;

    tracing::info!("Created {} health records for user {}", created.len(), user_id);
    Ok(HttpResponse::Created().json(created))
}

#[tracing::instrument(
    name = "Get health record",
    skip(pool, claims),
    fields(username = %claims.username)
)]
pub async fn get_record(
    record_id: web::Path<Uuid>,
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
) -> Result<HttpResponse, AppError> {
    let user_id = parse_user_id(&claims)?;
    let record = find_health_record(&pool, user_id, *record_id)
        .await?
        .ok_or_else(|| AppError::not_found("Health record"))?;
    Ok(HttpResponse::Ok().json(record))
}

#[tracing::instrument(
    name = "Replace health record",
    skip(record_form, pool, claims),
    fields(username = %claims.username)
)]
pub async fn replace_record(
    record_id: web::Path<Uuid>,
    record_form: web::Json<HealthRecordRequest>,
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
) -> Result<HttpResponse, AppError> {
    let user_id = parse_user_id(&claims)?;

    // Ownership first so foreign ids answer 404 even with an invalid body
    find_health_record(&pool, user_id, *record_id)
        .await?
        .ok_or_else(|| AppError::not_found("Health record"))?;
    record_form.validate()?;

    let record = update_health_record(&pool, user_id, *record_id, &record_form.into_inner().normalized())
        .await?
        .ok_or_else(|| AppError::not_found("Health record"))?;
    Ok(HttpResponse::Ok().json(record))
}

#[tracing::instrument(
    name = "Patch health record",
    skip(patch_form, pool, claims),
    fields(username = %claims.username)
)]
pub async fn patch_record(
    record_id: web::Path<Uuid>,
    patch_form: web::Json<HealthRecordPatch>,
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
) -> Result<HttpResponse, AppError> {
    let user_id = parse_user_id(&claims)?;

    let existing = find_health_record(&pool, user_id, *record_id)
        .await?
        .ok_or_else(|| AppError::not_found("Health record"))?;
    patch_form.validate()?;

    let merged = patch_form.into_inner().apply_to(&existing);
    let record = update_health_record(&pool, user_id, *record_id, &merged)
        .await?
        .ok_or_else(|| AppError::not_found("Health record"))?;
    Ok(HttpResponse::Ok().json(record))
}

#[tracing::instrument(
    name = "Delete health record",
    skip(pool, claims),
    fields(username = %claims.username)
)]
pub async fn delete_record(
    record_id: web::Path<Uuid>,
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
) -> Result<HttpResponse, AppError> {
    let user_id = parse_user_id(&claims)?;
    if !delete_health_record(&pool, user_id, *record_id).await? {
        return Err(AppError::not_found("Health record"));
    }

    tracing::info!("Deleted health record {} for user {}", record_id, user_id);
    Ok(HttpResponse::NoContent().finish())
}
