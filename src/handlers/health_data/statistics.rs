use actix_web::{web, HttpResponse};
use chrono::Utc;
use sqlx::PgPool;

use crate::db::health_records::list_health_records;
use crate::error::AppError;
use crate::middleware::auth::Claims;
use crate::models::health_record::StatisticsQuery;
use crate::utils::health_statistics::{summarize, MetricType, Period};
use crate::utils::parse_user::parse_user_id;

#[tracing::instrument(
    name = "Health record statistics",
    skip(query, pool, claims),
    fields(username = %claims.username)
)]
pub async fn get_statistics(
    query: web::Query<StatisticsQuery>,
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
) -> Result<HttpResponse, AppError> {
    let user_id = parse_user_id(&claims)?;

    let metric = MetricType::from_param(query.record_type.as_deref()).map_err(AppError::BadRequest)?;
    let period = Period::from_param(query.period.as_deref());

    let today = Utc::now().date_naive();
    let records = list_health_records(&pool, user_id, period.start_date(today), Some(today)).await?;

    tracing::debug!("Summarizing {} records as {:?} over {:?}", records.len(), metric, period);
    Ok(HttpResponse::Ok().json(summarize(metric, &records)))
}
