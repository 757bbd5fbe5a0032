use std::fmt;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use secrecy::{ExposeSecret, SecretString};
use validator::{Validate, ValidateEmail, ValidationError, ValidationErrors};

use crate::models::profile::{ProfileSummary, UpdateProfileRequest};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: Option<String>,
    pub is_active: bool,
    pub date_joined: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl User {
    /// WeChat-only accounts have no password and can never password-login.
    pub fn has_usable_password(&self) -> bool {
        self.password_hash.as_deref().is_some_and(|hash| !hash.is_empty())
    }
}

/// Usernames of accounts created by WeChat login start with this.
pub const WECHAT_USERNAME_PREFIX: &str = "wx_";

#[derive(Serialize, Deserialize)]
pub struct RegistrationRequest {
    pub username: String,
    pub email: Option<String>,
    #[serde(serialize_with = "serialize_secret_string", deserialize_with = "deserialize_secret_string")]
    pub password: SecretString,
}

// Secret fields cannot go through the derive, so these impls run the checks by hand
impl Validate for RegistrationRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Err(e) = validate_username(&self.username).and_then(|()| validate_unreserved_username(&self.username)) {
            errors.add("username", e);
        }
        if let Some(Err(e)) = self.email.as_deref().map(validate_email) {
            errors.add("email", e);
        }
        if let Err(e) = validate_password(&self.password) {
            errors.add("password", e);
        }
        into_result(errors)
    }
}

impl fmt::Display for RegistrationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Username: {}, Email: {}", self.username, self.email.as_deref().unwrap_or(""))
    }
}

#[derive(Debug, Serialize)]
pub struct RegistrationResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
}

impl From<User> for RegistrationResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
        }
    }
}

/// `GET /users/me/` payload: the account plus a profile summary.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub profile: ProfileSummary,
}

#[derive(Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(custom(function = "validate_username"))]
    pub username: Option<String>,
    #[validate(custom(function = "validate_email"))]
    pub email: Option<String>,
    pub profile: Option<UpdateProfileRequest>,
}

#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    #[serde(deserialize_with = "deserialize_secret_string")]
    pub old_password: SecretString,
    #[serde(deserialize_with = "deserialize_secret_string")]
    pub new_password: SecretString,
}

impl Validate for ChangePasswordRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Err(e) = validate_password(&self.new_password) {
            errors.add("new_password", e);
        }
        into_result(errors)
    }
}

#[derive(Deserialize)]
pub struct PasswordResetRequest {
    pub email: String,
}

#[derive(Deserialize)]
pub struct PasswordResetConfirm {
    pub token: String,
    #[serde(deserialize_with = "deserialize_secret_string")]
    pub new_password: SecretString,
}

impl Validate for PasswordResetConfirm {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Err(e) = validate_password(&self.new_password) {
            errors.add("new_password", e);
        }
        into_result(errors)
    }
}

fn into_result(errors: ValidationErrors) -> Result<(), ValidationErrors> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.is_empty() || username.chars().count() > 150 {
        return Err(ValidationError::new("username_length")
            .with_message("Username must be between 1 and 150 characters.".into()));
    }
    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
    {
        return Err(ValidationError::new("username_chars").with_message(
            "Username may contain only letters, numbers, and @/./+/-/_ characters.".into(),
        ));
    }
    Ok(())
}

/// The WeChat prefix is kept free so a first WeChat login always gets its username.
pub fn validate_unreserved_username(username: &str) -> Result<(), ValidationError> {
    if username.starts_with(WECHAT_USERNAME_PREFIX) {
        return Err(ValidationError::new("username_reserved").with_message(
            format!("Usernames starting with '{}' are reserved.", WECHAT_USERNAME_PREFIX).into(),
        ));
    }
    Ok(())
}

/// Blank emails are allowed, anything else must look like an address.
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.is_empty() || email.validate_email() {
        Ok(())
    } else {
        Err(ValidationError::new("email").with_message("Enter a valid email address.".into()))
    }
}

pub fn validate_password(password: &SecretString) -> Result<(), ValidationError> {
    let password = password.expose_secret();
    if password.chars().count() < 8 {
        return Err(ValidationError::new("password_too_short")
            .with_message("This password is too short. It must contain at least 8 characters.".into()));
    }
    if password.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::new("password_entirely_numeric")
            .with_message("This password is entirely numeric.".into()));
    }
    Ok(())
}

pub fn serialize_secret_string<S>(_: &SecretString, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str("[REDACTED]")
}

pub fn deserialize_secret_string<'de, D>(deserializer: D) -> Result<SecretString, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    Ok(SecretString::new(s.into_boxed_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::field_errors;

    fn registration(username: &str, email: Option<&str>, password: &str) -> RegistrationRequest {
        RegistrationRequest {
            username: username.to_string(),
            email: email.map(str::to_string),
            password: SecretString::new(password.to_string().into_boxed_str()),
        }
    }

    #[test]
    fn valid_registration_passes() {
        assert!(registration("alice_01", Some("alice@example.com"), "testpass123").validate().is_ok());
        assert!(registration("bob", None, "testpass123").validate().is_ok());
        assert!(registration("dave", Some(""), "testpass123").validate().is_ok());
    }

    #[test]
    fn invalid_fields_are_reported_per_field() {
        let errors = registration("bad name!", Some("not-an-email"), "1234567")
            .validate()
            .unwrap_err();
        let fields = field_errors(&errors);

        assert!(fields.contains_key("username"));
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("password"));
    }

    #[test]
    fn wechat_prefix_is_reserved_at_registration() {
        let errors = registration("wx_openid-victim", None, "testpass123")
            .validate()
            .unwrap_err();
        assert!(field_errors(&errors).contains_key("username"));
    }

    #[test]
    fn new_passwords_are_checked_under_their_field() {
        let change = ChangePasswordRequest {
            old_password: SecretString::new("testpass123".to_string().into_boxed_str()),
            new_password: SecretString::new("12345678".to_string().into_boxed_str()),
        };
        assert!(field_errors(&change.validate().unwrap_err()).contains_key("new_password"));

        let reset = PasswordResetConfirm {
            token: "t".into(),
            new_password: SecretString::new("short".to_string().into_boxed_str()),
        };
        assert!(field_errors(&reset.validate().unwrap_err()).contains_key("new_password"));
    }

    #[test]
    fn numeric_passwords_are_rejected() {
        let password = SecretString::new("1234567890".to_string().into_boxed_str());
        assert!(validate_password(&password).is_err());
    }

    #[test]
    fn password_is_never_serialized() {
        let json = serde_json::to_value(registration("carol", None, "testpass123")).unwrap();
        assert_eq!(json["password"], "[REDACTED]");
    }

    #[test]
    fn accounts_without_hash_cannot_password_login() {
        let user = User {
            id: Uuid::new_v4(),
            username: "wx_abc".into(),
            email: String::new(),
            password_hash: None,
            is_active: true,
            date_joined: Utc::now(),
            last_login: None,
        };
        assert!(!user.has_usable_password());
    }
}
