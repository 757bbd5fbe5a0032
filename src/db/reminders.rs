use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::models::reminder::{MedicationReminder, ReminderRequest};

const REMINDER_COLUMNS: &str = "id, user_id, name, description, frequency, weekdays, month_days, \
    custom_interval, times, start_date, end_date, is_active, created_at, updated_at";

pub async fn insert_reminder(
    pool: &Pool<Postgres>,
    user_id: Uuid,
    reminder: &ReminderRequest,
    start_date: chrono::NaiveDate,
) -> Result<MedicationReminder, sqlx::Error> {
    sqlx::query_as::<_, MedicationReminder>(&format!(
        r#"
        INSERT INTO medication_reminders (
            id, user_id, name, description, frequency, weekdays, month_days,
            custom_interval, times, start_date, end_date, is_active
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        RETURNING {}
        "#,
        REMINDER_COLUMNS
    ))
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(&reminder.name)
    .bind(reminder.description.as_deref())
    .bind(reminder.frequency)
    .bind(reminder.weekdays.as_deref())
    .bind(reminder.month_days.as_deref())
    .bind(reminder.custom_interval)
    .bind(&reminder.times)
    .bind(start_date)
    .bind(reminder.end_date)
    .bind(reminder.is_active)
    .fetch_one(pool)
    .await
}

pub async fn list_reminders(
    pool: &Pool<Postgres>,
    user_id: Uuid,
) -> Result<Vec<MedicationReminder>, sqlx::Error> {
    sqlx::query_as::<_, MedicationReminder>(&format!(
        "SELECT {} FROM medication_reminders WHERE user_id = $1 ORDER BY created_at DESC",
        REMINDER_COLUMNS
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn list_active_reminders(
    pool: &Pool<Postgres>,
    user_id: Uuid,
) -> Result<Vec<MedicationReminder>, sqlx::Error> {
    sqlx::query_as::<_, MedicationReminder>(&format!(
        "SELECT {} FROM medication_reminders WHERE user_id = $1 AND is_active ORDER BY name",
        REMINDER_COLUMNS
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn find_reminder(
    pool: &Pool<Postgres>,
    user_id: Uuid,
    reminder_id: Uuid,
) -> Result<Option<MedicationReminder>, sqlx::Error> {
    sqlx::query_as::<_, MedicationReminder>(&format!(
        "SELECT {} FROM medication_reminders WHERE id = $1 AND user_id = $2",
        REMINDER_COLUMNS
    ))
    .bind(reminder_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

/// `start_date` is fixed at creation and never rewritten.
pub async fn update_reminder(
    pool: &Pool<Postgres>,
    user_id: Uuid,
    reminder_id: Uuid,
    reminder: &ReminderRequest,
) -> Result<Option<MedicationReminder>, sqlx::Error> {
    sqlx::query_as::<_, MedicationReminder>(&format!(
        r#"
        UPDATE medication_reminders SET
            name = $3,
            description = $4,
            frequency = $5,
            weekdays = $6,
            month_days = $7,
            custom_interval = $8,
            times = $9,
            end_date = $10,
            is_active = $11,
            updated_at = NOW()
        WHERE id = $1 AND user_id = $2
        RETURNING {}
        "#,
        REMINDER_COLUMNS
    ))
    .bind(reminder_id)
    .bind(user_id)
    .bind(&reminder.name)
    .bind(reminder.description.as_deref())
    .bind(reminder.frequency)
    .bind(reminder.weekdays.as_deref())
    .bind(reminder.month_days.as_deref())
    .bind(reminder.custom_interval)
    .bind(&reminder.times)
    .bind(reminder.end_date)
    .bind(reminder.is_active)
    .fetch_optional(pool)
    .await
}

pub async fn delete_reminder(
    pool: &Pool<Postgres>,
    user_id: Uuid,
    reminder_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM medication_reminders WHERE id = $1 AND user_id = $2")
        .bind(reminder_id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
