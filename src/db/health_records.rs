use chrono::NaiveDate;
use sqlx::{PgExecutor, Pool, Postgres};
use uuid::Uuid;

use crate::models::health_record::{HealthRecord, HealthRecordRequest};

const RECORD_COLUMNS: &str = "id, user_id, weight, systolic_pressure, diastolic_pressure, \
    heart_rate, blood_sugar, record_time, created_at, updated_at";

pub async fn insert_health_record<'e, E: PgExecutor<'e>>(
    executor: E,
    user_id: Uuid,
    record: &HealthRecordRequest,
) -> Result<HealthRecord, sqlx::Error> {
    sqlx::query_as::<_, HealthRecord>(&format!(
        r#"
        INSERT INTO health_records (
            id, user_id, weight, systolic_pressure, diastolic_pressure,
            heart_rate, blood_sugar, record_time
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING {}
        "#,
        RECORD_COLUMNS
    ))
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(record.weight)
    .bind(record.systolic_pressure)
    .bind(record.diastolic_pressure)
    .bind(record.heart_rate)
    .bind(record.blood_sugar)
    .bind(record.record_time)
    .fetch_one(executor)
    .await
}

/// Insert all records or none.
pub async fn insert_health_records_batch(
    pool: &Pool<Postgres>,
    user_id: Uuid,
    records: &[HealthRecordRequest],
) -> Result<Vec<HealthRecord>, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let mut created = Vec::with_capacity(records.len());
    for record in records {
        created.push(insert_health_record(&mut *tx, user_id, record).await?);
    }
    tx.commit().await?;
    Ok(created)
}

/// Records whose UTC `record_time` date falls inside the inclusive range, newest first.
pub async fn list_health_records(
    pool: &Pool<Postgres>,
    user_id: Uuid,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
) -> Result<Vec<HealthRecord>, sqlx::Error> {
    sqlx::query_as::<_, HealthRecord>(&format!(
        r#"
        SELECT {} FROM health_records
        WHERE user_id = $1
          AND ($2::date IS NULL OR (record_time AT TIME ZONE 'UTC')::date >= $2)
          AND ($3::date IS NULL OR (record_time AT TIME ZONE 'UTC')::date <= $3)
        ORDER BY record_time DESC
        "#,
        RECORD_COLUMNS
    ))
    .bind(user_id)
    .bind(start_date)
    .bind(end_date)
    .fetch_all(pool)
    .await
}

pub async fn find_health_record(
    pool: &Pool<Postgres>,
    user_id: Uuid,
    record_id: Uuid,
) -> Result<Option<HealthRecord>, sqlx::Error> {
    sqlx::query_as::<_, HealthRecord>(&format!(
        "SELECT {} FROM health_records WHERE id = $1 AND user_id = $2",
        RECORD_COLUMNS
    ))
    .bind(record_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

pub async fn update_health_record(
    pool: &Pool<Postgres>,
    user_id: Uuid,
    record_id: Uuid,
    record: &HealthRecordRequest,
) -> Result<Option<HealthRecord>, sqlx::Error> {
    sqlx::query_as::<_, HealthRecord>(&format!(
        r#"
        UPDATE health_records SET
            weight = $3,
            systolic_pressure = $4,
            diastolic_pressure = $5,
            heart_rate = $6,
            blood_sugar = $7,
            record_time = $8,
            updated_at = NOW()
        WHERE id = $1 AND user_id = $2
        RETURNING {}
        "#,
        RECORD_COLUMNS
    ))
    .bind(record_id)
    .bind(user_id)
    .bind(record.weight)
    .bind(record.systolic_pressure)
    .bind(record.diastolic_pressure)
    .bind(record.heart_rate)
    .bind(record.blood_sugar)
    .bind(record.record_time)
    .fetch_optional(pool)
    .await
}

/// Returns whether a row owned by `user_id` was removed.
pub async fn delete_health_record(
    pool: &Pool<Postgres>,
    user_id: Uuid,
    record_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM health_records WHERE id = $1 AND user_id = $2")
        .bind(record_id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
