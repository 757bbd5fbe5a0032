use actix_web::{delete, get, patch, post, put, web, HttpResponse};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;
use crate::handlers::health_data::health_records;
use crate::handlers::health_data::statistics::get_statistics;
use crate::middleware::auth::Claims;
use crate::models::health_record::{
    HealthRecordListQuery, HealthRecordPatch, HealthRecordRequest, StatisticsQuery,
};

#[get("/")]
async fn list_records(
    query: web::Query<HealthRecordListQuery>,
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
) -> Result<HttpResponse, AppError> {
    health_records::list_records(query, pool, claims).await
}

#[post("/")]
async fn create_record(
    record_form: web::Json<HealthRecordRequest>,
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
) -> Result<HttpResponse, AppError> {
    health_records::create_record(record_form, pool, claims).await
}

#[post("/batch/")]
async fn batch_create_records(
    records_form: web::Json<Vec<HealthRecordRequest>>,
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
) -> Result<HttpResponse, AppError> {
    health_records::batch_create_records(records_form, pool, claims).await
}

#[get("/statistics/")]
async fn statistics(
    query: web::Query<StatisticsQuery>,
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
) -> Result<HttpResponse, AppError> {
    get_statistics(query, pool, claims).await
}

#[get("/{record_id}/")]
async fn get_record(
    record_id: web::Path<Uuid>,
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
) -> Result<HttpResponse, AppError> {
    health_records::get_record(record_id, pool, claims).await
}

#[put("/{record_id}/")]
async fn replace_record(
    record_id: web::Path<Uuid>,
    record_form: web::Json<HealthRecordRequest>,
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
) -> Result<HttpResponse, AppError> {
    health_records::replace_record(record_id, record_form, pool, claims).await
}

#[patch("/{record_id}/")]
async fn patch_record(
    record_id: web::Path<Uuid>,
    patch_form: web::Json<HealthRecordPatch>,
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
) -> Result<HttpResponse, AppError> {
    health_records::patch_record(record_id, patch_form, pool, claims).await
}

#[delete("/{record_id}/")]
async fn delete_record(
    record_id: web::Path<Uuid>,
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
) -> Result<HttpResponse, AppError> {
    health_records::delete_record(record_id, pool, claims).await
}
