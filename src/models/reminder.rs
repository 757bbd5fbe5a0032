use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::utils::reminder_schedule::Schedule;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    #[default]
    Daily,
    Weekly,
    Monthly,
    Custom,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct MedicationReminder {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub frequency: Frequency,
    pub weekdays: Option<Vec<i16>>,
    pub month_days: Option<Vec<i16>>,
    pub custom_interval: Option<i32>,
    pub times: Vec<String>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MedicationReminder {
    pub fn schedule(&self) -> Schedule<'_> {
        Schedule {
            frequency: self.frequency,
            weekdays: self.weekdays.as_deref().unwrap_or_default(),
            month_days: self.month_days.as_deref().unwrap_or_default(),
            custom_interval: self.custom_interval,
            start_date: self.start_date,
            end_date: self.end_date,
        }
    }
}

/// Create/replace body. `start_date` is assigned by the server and never read.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ReminderRequest {
    #[validate(length(min = 1, max = 100, message = "Ensure this field has between 1 and 100 characters."))]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub frequency: Frequency,
    #[serde(default, deserialize_with = "deserialize_day_list")]
    pub weekdays: Option<Vec<i16>>,
    #[serde(default, deserialize_with = "deserialize_day_list")]
    pub month_days: Option<Vec<i16>>,
    #[serde(default)]
    pub custom_interval: Option<i32>,
    #[serde(default, deserialize_with = "deserialize_times")]
    pub times: Vec<String>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

impl ReminderRequest {
    pub fn schedule(&self, start_date: NaiveDate) -> Schedule<'_> {
        Schedule {
            frequency: self.frequency,
            weekdays: self.weekdays.as_deref().unwrap_or_default(),
            month_days: self.month_days.as_deref().unwrap_or_default(),
            custom_interval: self.custom_interval,
            start_date,
            end_date: self.end_date,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ReminderPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub frequency: Option<Frequency>,
    #[serde(default, deserialize_with = "deserialize_day_list")]
    pub weekdays: Option<Vec<i16>>,
    #[serde(default, deserialize_with = "deserialize_day_list")]
    pub month_days: Option<Vec<i16>>,
    pub custom_interval: Option<i32>,
    #[serde(default, deserialize_with = "deserialize_optional_times")]
    pub times: Option<Vec<String>>,
    pub end_date: Option<NaiveDate>,
    pub is_active: Option<bool>,
}

impl ReminderPatch {
    pub fn apply_to(self, reminder: &MedicationReminder) -> ReminderRequest {
        ReminderRequest {
            name: self.name.unwrap_or_else(|| reminder.name.clone()),
            description: self.description.or_else(|| reminder.description.clone()),
            frequency: self.frequency.unwrap_or(reminder.frequency),
            weekdays: self.weekdays.or_else(|| reminder.weekdays.clone()),
            month_days: self.month_days.or_else(|| reminder.month_days.clone()),
            custom_interval: self.custom_interval.or(reminder.custom_interval),
            times: self.times.unwrap_or_else(|| reminder.times.clone()),
            end_date: self.end_date.or(reminder.end_date),
            is_active: self.is_active.unwrap_or(reminder.is_active),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct TodayQuery {
    pub date: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TodayResponse {
    pub date: NaiveDate,
    pub reminders: Vec<MedicationReminder>,
}

fn default_active() -> bool {
    true
}

/// Lists arrive either as JSON arrays or as the legacy comma-separated form.
#[derive(Deserialize)]
#[serde(untagged)]
enum ListOrCsv<T> {
    List(Vec<T>),
    Csv(String),
}

fn split_csv(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|part| !part.is_empty())
}

fn deserialize_day_list<'de, D>(deserializer: D) -> Result<Option<Vec<i16>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<ListOrCsv<i16>>::deserialize(deserializer)? {
        None => Ok(None),
        Some(ListOrCsv::List(days)) => Ok(Some(days)),
        Some(ListOrCsv::Csv(raw)) => split_csv(&raw)
            .map(|part| {
                part.parse::<i16>()
                    .map_err(|_| serde::de::Error::custom(format!("invalid day '{}'", part)))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some),
    }
}

fn deserialize_optional_times<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<ListOrCsv<String>>::deserialize(deserializer)? {
        None => None,
        Some(ListOrCsv::List(times)) => Some(times),
        Some(ListOrCsv::Csv(raw)) => Some(split_csv(&raw).map(str::to_string).collect()),
    })
}

fn deserialize_times<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(deserialize_optional_times(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply() {
        let request: ReminderRequest =
            serde_json::from_str(r#"{"name":"Aspirin","times":["08:00"]}"#).unwrap();
        assert_eq!(request.frequency, Frequency::Daily);
        assert!(request.is_active);
        assert!(request.weekdays.is_none());
    }

    #[test]
    fn comma_separated_lists_are_accepted() {
        let request: ReminderRequest = serde_json::from_str(
            r#"{"name":"Vitamin D","frequency":"weekly","weekdays":"1,3, 5","times":"08:00,19:30"}"#,
        )
        .unwrap();
        assert_eq!(request.weekdays, Some(vec![1, 3, 5]));
        assert_eq!(request.times, vec!["08:00".to_string(), "19:30".to_string()]);
    }

    #[test]
    fn unknown_frequency_is_rejected() {
        let result = serde_json::from_str::<ReminderRequest>(
            r#"{"name":"x","frequency":"hourly","times":["08:00"]}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn frequency_serializes_lowercase() {
        assert_eq!(serde_json::to_value(Frequency::Monthly).unwrap(), "monthly");
    }
}
