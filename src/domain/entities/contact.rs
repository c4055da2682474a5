use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::borrow::Cow;

use validator::{Validate, ValidationError};

use crate::errors::FieldErrors;

static NAME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-ZÀ-ÿ\s'\-]+$").expect("name pattern is valid")
});

static PHONE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+]?[0-9\s\-()]{8,20}$").expect("phone pattern is valid")
});

/// Submitted contact form, after the JSON fields have been checked to be
/// strings.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ContactForm {
    #[validate(
        custom(function = "validate_name_length"),
        regex(path = *NAME_REGEX, message = "Name contains invalid characters")
    )]
    pub name: String,

    #[validate(
        email(message = "Please enter a valid email address"),
        length(max = 255, message = "Email must be less than 255 characters")
    )]
    pub email: String,

    #[validate(length(max = 100, message = "Company name must be less than 100 characters"))]
    pub company: Option<String>,

    #[validate(regex(path = *PHONE_REGEX, message = "Please enter a valid phone number"))]
    pub phone: Option<String>,

    #[validate(custom(function = "validate_message_length"))]
    pub message: String,
}

/// A submission that passed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionRequest {
    pub name: String,
    pub email: String,
    pub message: String,
    pub company: Option<String>,
    pub phone: Option<String>,
}

impl From<ContactForm> for SubmissionRequest {
    fn from(form: ContactForm) -> Self {
        SubmissionRequest {
            name: form.name,
            email: form.email,
            message: form.message,
            company: form.company.filter(|c| !c.is_empty()),
            phone: form.phone.filter(|p| !p.is_empty()),
        }
    }
}

impl ContactForm {
    /// Validates an untyped JSON payload. Never panics: anything that is not
    /// an acceptable submission comes back as a non-empty field error map.
    pub fn parse(value: &Value) -> Result<SubmissionRequest, FieldErrors> {
        let empty = Map::new();
        let object = value.as_object().unwrap_or(&empty);
        let mut errors = FieldErrors::new();

        let name = required_string(object, "name", &mut errors);
        let email = required_string(object, "email", &mut errors);
        let message = required_string(object, "message", &mut errors);
        let company = optional_string(object, "company", &mut errors);
        // An empty phone is the form's way of saying "not given"
        let phone = optional_string(object, "phone", &mut errors).filter(|p| !p.is_empty());

        let form = ContactForm {
            name: name.unwrap_or_default(),
            email: email.unwrap_or_default(),
            company,
            phone,
            message: message.unwrap_or_default(),
        };

        if let Err(validation) = form.validate() {
            errors.merge_validation(&validation);
        }

        if errors.is_empty() {
            Ok(form.into())
        } else {
            Err(errors)
        }
    }
}

fn validate_name_length(name: &str) -> Result<(), ValidationError> {
    check_length(
        name,
        2,
        100,
        "Name must be at least 2 characters",
        "Name must be less than 100 characters",
    )
}

fn validate_message_length(message: &str) -> Result<(), ValidationError> {
    check_length(
        message,
        10,
        2000,
        "Message must be at least 10 characters",
        "Message must be less than 2000 characters",
    )
}

/// Character-count bounds with a distinct message for each side.
fn check_length(
    value: &str,
    min: usize,
    max: usize,
    too_short: &'static str,
    too_long: &'static str,
) -> Result<(), ValidationError> {
    let len = value.chars().count();

    if len < min {
        return Err(new_validation_error("length_min", too_short));
    }
    if len > max {
        return Err(new_validation_error("length_max", too_long));
    }
    Ok(())
}

fn new_validation_error(code: &'static str, msg: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(msg));
    err
}

fn required_string(object: &Map<String, Value>, field: &str, errors: &mut FieldErrors) -> Option<String> {
    match object.get(field) {
        None => {
            errors.add(field, "Required");
            None
        }
        Some(value) => as_string(value, field, errors),
    }
}

fn optional_string(object: &Map<String, Value>, field: &str, errors: &mut FieldErrors) -> Option<String> {
    match object.get(field) {
        None | Some(Value::Null) => None,
        Some(value) => as_string(value, field, errors),
    }
}

fn as_string(value: &Value, field: &str, errors: &mut FieldErrors) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        other => {
            errors.add(field, format!("Expected string, received {}", json_type_name(other)));
            None
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
