use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
    #[serde(rename = "O")]
    Other,
}

impl Gender {
    pub fn as_code(&self) -> &'static str {
        match self {
            Gender::Male => "M",
            Gender::Female => "F",
            Gender::Other => "O",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "M" => Some(Gender::Male),
            "F" => Some(Gender::Female),
            "O" => Some(Gender::Other),
            _ => None,
        }
    }

    /// WeChat encodes gender as 0 (unknown), 1 (male), 2 (female).
    pub fn from_wechat(code: i32) -> Option<Self> {
        match code {
            1 => Some(Gender::Male),
            2 => Some(Gender::Female),
            _ => None,
        }
    }

    pub fn wechat_code(code: &str) -> i32 {
        match Self::from_code(code) {
            Some(Gender::Male) => 1,
            Some(Gender::Female) => 2,
            _ => 0,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct UserProfile {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub user_id: Uuid,
    pub name: String,
    pub gender: String,
    pub birth_date: Option<NaiveDate>,
    pub age: Option<i32>,
    pub phone: String,
    pub height: Option<f64>,
    pub weight: Option<f64>,
    pub medical_history: String,
    pub allergies: String,
    pub openid: Option<String>,
    pub nickname: Option<String>,
    pub avatar_url: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub country: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The profile subset embedded in `GET /users/me/`.
#[derive(Debug, Serialize)]
pub struct ProfileSummary {
    pub name: String,
    pub gender: String,
    pub age: Option<i32>,
    pub phone: String,
    pub height: Option<f64>,
}

impl From<&UserProfile> for ProfileSummary {
    fn from(profile: &UserProfile) -> Self {
        Self {
            name: profile.name.clone(),
            gender: profile.gender.clone(),
            age: profile.age,
            phone: profile.phone.clone(),
            height: profile.height,
        }
    }
}

/// Partial profile update. Absent fields keep their stored value.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(max = 50, message = "Ensure this field has no more than 50 characters."))]
    pub name: Option<String>,
    #[validate(custom(function = "validate_gender"))]
    pub gender: Option<String>,
    pub birth_date: Option<NaiveDate>,
    #[validate(range(min = 0, max = 150, message = "Ensure this value is between 0 and 150."))]
    pub age: Option<i32>,
    #[validate(custom(function = "validate_phone"))]
    pub phone: Option<String>,
    #[validate(range(exclusive_min = 0.0, max = 300.0, message = "Ensure this value is between 0 and 300."))]
    pub height: Option<f64>,
    #[validate(range(exclusive_min = 0.0, max = 999.99, message = "Ensure this value is between 0 and 999.99."))]
    pub weight: Option<f64>,
    pub medical_history: Option<String>,
    pub allergies: Option<String>,
    #[validate(length(max = 50, message = "Ensure this field has no more than 50 characters."))]
    pub nickname: Option<String>,
    #[validate(url(message = "Enter a valid URL."))]
    pub avatar_url: Option<String>,
    #[validate(length(max = 30, message = "Ensure this field has no more than 30 characters."))]
    pub city: Option<String>,
    #[validate(length(max = 30, message = "Ensure this field has no more than 30 characters."))]
    pub province: Option<String>,
    #[validate(length(max = 30, message = "Ensure this field has no more than 30 characters."))]
    pub country: Option<String>,
}

pub fn validate_gender(gender: &str) -> Result<(), ValidationError> {
    if gender.is_empty() || Gender::from_code(gender).is_some() {
        Ok(())
    } else {
        Err(ValidationError::new("gender")
            .with_message(format!("\"{}\" is not a valid choice.", gender).into()))
    }
}

pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    if phone.len() > 11 {
        return Err(ValidationError::new("phone_length")
            .with_message("Ensure this field has no more than 11 characters.".into()));
    }
    if !phone.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::new("phone_digits")
            .with_message("Phone numbers may contain digits only.".into()));
    }
    Ok(())
}
