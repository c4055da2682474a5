use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse
};
use chrono::{DateTime, Utc};
use config::ConfigError;
use derive_more::Display;
use serde::Serialize;
use validator::{ValidationErrors, ValidationErrorsKind};

use crate::constants::{GENERIC_FAILURE_MESSAGE, RATE_LIMITED_MESSAGE, VALIDATION_FAILED_MESSAGE};

#[derive(Debug)]
pub enum AppError {
    RateLimited { reset_time: DateTime<Utc> },
    ValidationError(FieldErrors),
    DispatchError(DispatchError),
    InternalError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::RateLimited { reset_time } => {
                write!(f, "Rate limited until {}", reset_time.to_rfc3339())
            }
            AppError::ValidationError(errors) => write!(f, "validation error: {}", errors),
            AppError::DispatchError(err) => write!(f, "Email dispatch failed: {}", err),
            AppError::InternalError(msg) => write!(f, "Internal server error: {}", msg)
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let body = match self {
            AppError::RateLimited { reset_time } => {
                serde_json::json!({
                    "error": RATE_LIMITED_MESSAGE,
                    "resetTime": reset_time.timestamp_millis()
                })
            }
            AppError::ValidationError(errors) => {
                serde_json::json!({
                    "error": VALIDATION_FAILED_MESSAGE,
                    "details": errors
                })
            }
            // Provider and internal details stay in the server logs
            AppError::DispatchError(_) | AppError::InternalError(_) => {
                serde_json::json!({"error": GENERIC_FAILURE_MESSAGE})
            }
        };
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .json(body)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::DispatchError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl AppError {
    pub fn to_http_response(&self) -> HttpResponse {
        self.error_response()
    }
}

impl From<FieldErrors> for AppError {
    fn from(errors: FieldErrors) -> Self {
        AppError::ValidationError(errors)
    }
}

impl From<DispatchError> for AppError {
    fn from(err: DispatchError) -> Self {
        AppError::DispatchError(err)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InternalError(format!("Malformed request body: {}", err))
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::InternalError(format!("Configuration error: {}", err))
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalError(err.to_string())
    }
}

impl From<redis::RedisError> for AppError {
    fn from(err: redis::RedisError) -> Self {
        AppError::InternalError(format!("Redis operation failed: {}", err))
    }
}

impl From<deadpool_redis::PoolError> for AppError {
    fn from(err: deadpool_redis::PoolError) -> Self {
        AppError::InternalError(format!("Redis connection failed: {}", err))
    }
}

/// Which of the two contact emails a dispatch failure belongs to.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum DispatchStage {
    #[display("team notification")]
    TeamNotification,

    #[display("user confirmation")]
    UserConfirmation,
}

#[derive(Debug, Display)]
pub enum DispatchError {
    #[display("{stage} email failed: {detail}")]
    Provider { stage: DispatchStage, detail: String },

    #[display("{stage} email timed out after {}", humantime::format_duration(*after))]
    Timeout { stage: DispatchStage, after: Duration },
}

impl DispatchError {
    pub fn stage(&self) -> DispatchStage {
        match self {
            DispatchError::Provider { stage, .. } | DispatchError::Timeout { stage, .. } => *stage,
        }
    }
}

/// Field name to the list of messages describing what is wrong with it.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Adds validator's messages, skipping fields that already carry an
    /// error of their own.
    pub fn merge_validation(&mut self, errors: &ValidationErrors) {
        for (field, kind) in errors.errors() {
            if self.contains(field) {
                continue;
            }
            if let ValidationErrorsKind::Field(errors) = kind {
                for e in errors {
                    let message = e
                        .message
                        .as_ref()
                        .map(|s| s.to_string())
                        .unwrap_or_else(|| "Invalid value".to_string());
                    self.add(field.to_string(), message);
                }
            }
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages = self.0.iter()
            .flat_map(|(field, errors)| errors.iter().map(move |e| format!("{}:{}", field, e)))
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "{}", messages)
    }
}

impl From<ValidationErrors> for FieldErrors {
    fn from(errors: ValidationErrors) -> Self {
        let mut field_errors = FieldErrors::new();
        field_errors.merge_validation(&errors);
        field_errors
    }
}
