//! Application-wide error type.
//!
//! Handlers return `Result<HttpResponse, AppError>`; the `ResponseError`
//! impl below is the single place where failures become HTTP responses.
//! Server-side failures are logged with their original cause and answered
//! with a generic message.

use std::collections::BTreeMap;

use actix_web::error::{JsonPayloadError, PathError, QueryPayloadError};
use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, ResponseError};
use serde::Serialize;
use validator::ValidationErrors;

use crate::services::wechat_client::WechatError;

/// Field name -> list of messages, rendered as the `errors` object of a 400.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid request data")]
    Validation(FieldErrors),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Upstream service error: {0}")]
    Upstream(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrors>,
}

impl AppError {
    /// Single field-level validation failure.
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.to_string(), vec![message.into()]);
        AppError::Validation(errors)
    }

    pub fn not_found(what: &str) -> Self {
        AppError::NotFound(format!("{} not found", what))
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let (message, errors) = match self {
            AppError::Validation(errors) => (self.to_string(), Some(errors.clone())),
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                ("Database error, please try again later".to_string(), None)
            }
            AppError::Internal(e) => {
                tracing::error!("Unhandled error: {}", e);
                ("Internal server error".to_string(), None)
            }
            AppError::Upstream(e) => {
                tracing::error!("Upstream error: {}", e);
                (self.to_string(), None)
            }
            other => (other.to_string(), None),
        };

        HttpResponse::build(status).json(ErrorBody {
            code: status.as_u16(),
            message,
            errors,
        })
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        AppError::Validation(field_errors(&errors))
    }
}

impl From<WechatError> for AppError {
    fn from(error: WechatError) -> Self {
        match error {
            WechatError::Api { errcode, errmsg } => {
                tracing::info!("WeChat rejected the login code: {} {}", errcode, errmsg);
                AppError::BadRequest(format!("WeChat login failed: {}", errmsg))
            }
            WechatError::MissingOpenid => {
                AppError::BadRequest("WeChat login failed: no openid returned".to_string())
            }
            other => AppError::Upstream(other.to_string()),
        }
    }
}

pub fn field_errors(errors: &ValidationErrors) -> FieldErrors {
    errors
        .field_errors()
        .into_iter()
        .map(|(field, errs)| {
            let messages = errs
                .iter()
                .map(|e| match &e.message {
                    Some(message) => message.to_string(),
                    None => format!("Invalid value ({})", e.code),
                })
                .collect();
            (field.to_string(), messages)
        })
        .collect()
}

/// Merge `other` into `into`, prefixing every key (used for nested objects).
pub fn merge_field_errors(into: &mut FieldErrors, prefix: &str, other: FieldErrors) {
    for (field, messages) in other {
        into.entry(format!("{}.{}", prefix, field))
            .or_default()
            .extend(messages);
    }
}

pub fn is_unique_violation(error: &sqlx::Error) -> bool {
    error
        .as_database_error()
        .map(|db| db.is_unique_violation())
        .unwrap_or(false)
}

/// Name of the unique constraint an insert tripped over, if that is what failed.
pub fn violated_unique_constraint(error: &sqlx::Error) -> Option<&str> {
    error
        .as_database_error()
        .filter(|db| db.is_unique_violation())
        .and_then(|db| db.constraint())
}

pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    tracing::info!("Rejected JSON body: {}", err);
    AppError::BadRequest(format!("Invalid JSON body: {}", err)).into()
}

pub fn query_error_handler(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::BadRequest(format!("Invalid query string: {}", err)).into()
}

pub fn path_error_handler(err: PathError, _req: &HttpRequest) -> actix_web::Error {
    tracing::debug!("Unmatched path parameter: {}", err);
    AppError::NotFound("Not found".to_string()).into()
}
