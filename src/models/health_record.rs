use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::utils::datetime::{deserialize_datetime, deserialize_optional_datetime};

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct HealthRecord {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub user_id: Uuid,
    pub weight: f64,
    pub systolic_pressure: i32,
    pub diastolic_pressure: i32,
    pub heart_rate: i32,
    pub blood_sugar: Option<f64>,
    pub record_time: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct HealthRecordRequest {
    #[validate(range(exclusive_min = 0.0, max = 999.99, message = "Ensure this value is between 0 and 999.99."))]
    pub weight: f64,
    #[validate(range(min = 30, max = 300, message = "Ensure this value is between 30 and 300."))]
    pub systolic_pressure: i32,
    #[validate(range(min = 20, max = 200, message = "Ensure this value is between 20 and 200."))]
    pub diastolic_pressure: i32,
    #[validate(range(min = 20, max = 300, message = "Ensure this value is between 20 and 300."))]
    pub heart_rate: i32,
    #[validate(range(exclusive_min = 0.0, max = 99.99, message = "Ensure this value is between 0 and 99.99."))]
    pub blood_sugar: Option<f64>,
    #[serde(deserialize_with = "deserialize_datetime")]
    pub record_time: DateTime<Utc>,
}

impl HealthRecordRequest {
    /// Decimal columns keep two places.
    pub fn normalized(mut self) -> Self {
        self.weight = round_to(self.weight, 2);
        self.blood_sugar = self.blood_sugar.map(|value| round_to(value, 2));
        self
    }
}

/// `PATCH` body; every field optional.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct HealthRecordPatch {
    #[validate(range(exclusive_min = 0.0, max = 999.99, message = "Ensure this value is between 0 and 999.99."))]
    pub weight: Option<f64>,
    #[validate(range(min = 30, max = 300, message = "Ensure this value is between 30 and 300."))]
    pub systolic_pressure: Option<i32>,
    #[validate(range(min = 20, max = 200, message = "Ensure this value is between 20 and 200."))]
    pub diastolic_pressure: Option<i32>,
    #[validate(range(min = 20, max = 300, message = "Ensure this value is between 20 and 300."))]
    pub heart_rate: Option<i32>,
    #[validate(range(exclusive_min = 0.0, max = 99.99, message = "Ensure this value is between 0 and 99.99."))]
    pub blood_sugar: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_optional_datetime")]
    pub record_time: Option<DateTime<Utc>>,
}

impl HealthRecordPatch {
    /// Overlay the supplied fields onto an existing record.
    pub fn apply_to(self, record: &HealthRecord) -> HealthRecordRequest {
        HealthRecordRequest {
            weight: self.weight.unwrap_or(record.weight),
            systolic_pressure: self.systolic_pressure.unwrap_or(record.systolic_pressure),
            diastolic_pressure: self.diastolic_pressure.unwrap_or(record.diastolic_pressure),
            heart_rate: self.heart_rate.unwrap_or(record.heart_rate),
            blood_sugar: self.blood_sugar.or(record.blood_sugar),
            record_time: self.record_time.unwrap_or(record.record_time),
        }
        .normalized()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct HealthRecordListQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StatisticsQuery {
    #[serde(rename = "type")]
    pub record_type: Option<String>,
    pub period: Option<String>,
}

pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::field_errors;

    fn request_json(weight: &str, systolic: i32) -> String {
        format!(
            r#"{{"weight":{},"systolic_pressure":{},"diastolic_pressure":80,"heart_rate":72,"record_time":"2025-03-01T08:00:00Z"}}"#,
            weight, systolic
        )
    }

    #[test]
    fn valid_record_is_rounded() {
        let request: HealthRecordRequest = serde_json::from_str(&request_json("70.456", 120)).unwrap();
        assert!(request.validate().is_ok());
        assert_eq!(request.normalized().weight, 70.46);
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let request: HealthRecordRequest = serde_json::from_str(&request_json("0", 400)).unwrap();
        let fields = field_errors(&request.validate().unwrap_err());
        assert!(fields.contains_key("weight"));
        assert!(fields.contains_key("systolic_pressure"));
    }

    #[test]
    fn bad_record_time_fails_to_parse() {
        let json = r#"{"weight":70,"systolic_pressure":120,"diastolic_pressure":80,"heart_rate":72,"record_time":"soon"}"#;
        assert!(serde_json::from_str::<HealthRecordRequest>(json).is_err());
    }

    #[test]
    fn patch_keeps_unsupplied_fields() {
        let record = HealthRecord {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            weight: 70.0,
            systolic_pressure: 120,
            diastolic_pressure: 80,
            heart_rate: 72,
            blood_sugar: Some(5.6),
            record_time: Utc::now(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let patch: HealthRecordPatch = serde_json::from_str(r#"{"heart_rate":65}"#).unwrap();
        let merged = patch.apply_to(&record);

        assert_eq!(merged.heart_rate, 65);
        assert_eq!(merged.weight, 70.0);
        assert_eq!(merged.blood_sugar, Some(5.6));
        assert_eq!(merged.record_time, record.record_time);
    }
}
