//! Structural and range checks for incoming payloads.
//!
//! Validators work on the raw JSON body so that every failing field can be
//! reported at once, instead of stopping at the first deserialization error.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::db::models::BatchJobRequest;
use crate::web::models::LoginRequest;

pub const LOGIN_INVALID_MESSAGE: &str = "Invalid request data";
pub const BATCH_INVALID_MESSAGE: &str =
    "Invalid input data. Please check your values and try again.";
pub const IMPORT_SETUP_ID_INTEGER_MESSAGE: &str =
    "Import Setup ID must be a positive integer greater than 0";

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
        .expect("email pattern is a valid regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Constraint {
    Required,
    Type,
    Email,
    NonEmpty,
    Min,
    Max,
    Integer,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub constraint: Constraint,
    pub message: String,
}

impl FieldError {
    fn new(field: &str, constraint: Constraint, message: impl Into<String>) -> Self {
        FieldError {
            field: field.to_string(),
            constraint,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct ValidationError {
    pub message: String,
    pub errors: Vec<FieldError>,
}

impl ValidationError {
    /// The body could not be read as a JSON object at all.
    pub fn malformed_body(message: &str, detail: impl Into<String>) -> Self {
        ValidationError {
            message: message.to_string(),
            errors: vec![FieldError::new("body", Constraint::Type, detail)],
        }
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    pub fn fields(&self) -> Vec<&str> {
        self.errors.iter().map(|e| e.field.as_str()).collect()
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn as_object<'a>(payload: &'a Value, message: &str) -> Result<&'a Map<String, Value>, ValidationError> {
    payload.as_object().ok_or_else(|| {
        ValidationError::malformed_body(
            message,
            format!("Expected object, received {}", type_name(payload)),
        )
    })
}

fn string_field<'a>(
    obj: &'a Map<String, Value>,
    field: &str,
    errors: &mut Vec<FieldError>,
) -> Option<&'a str> {
    match obj.get(field) {
        None => {
            errors.push(FieldError::new(field, Constraint::Required, "Required"));
            None
        }
        Some(Value::String(s)) => Some(s.as_str()),
        Some(other) => {
            errors.push(FieldError::new(
                field,
                Constraint::Type,
                format!("Expected string, received {}", type_name(other)),
            ));
            None
        }
    }
}

fn number_field<'a>(
    obj: &'a Map<String, Value>,
    field: &str,
    errors: &mut Vec<FieldError>,
) -> Option<&'a serde_json::Number> {
    match obj.get(field) {
        None => {
            errors.push(FieldError::new(field, Constraint::Required, "Required"));
            None
        }
        Some(Value::Number(n)) => Some(n),
        Some(other) => {
            errors.push(FieldError::new(
                field,
                Constraint::Type,
                format!("Expected number, received {}", type_name(other)),
            ));
            None
        }
    }
}

/// Range check shared by the numeric batch fields. Returns the value only when
/// it lies inside `[min, max]`.
fn bounded(
    field: &str,
    value: f64,
    min: (f64, &str),
    max: Option<(f64, &str)>,
    errors: &mut Vec<FieldError>,
) -> Option<f64> {
    if value < min.0 {
        errors.push(FieldError::new(field, Constraint::Min, min.1));
        return None;
    }
    if let Some((limit, message)) = max {
        if value > limit {
            errors.push(FieldError::new(field, Constraint::Max, message));
            return None;
        }
    }
    Some(value)
}

fn as_positive_integer(number: &serde_json::Number) -> Option<i64> {
    if let Some(i) = number.as_i64() {
        return (i > 0).then_some(i);
    }
    let f = number.as_f64()?;
    // 2^63 is the first float past i64::MAX.
    if f.fract() == 0.0 && f > 0.0 && f < 9_223_372_036_854_775_808.0 {
        Some(f as i64)
    } else {
        None
    }
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email)
}

pub fn validate_login(payload: &Value) -> Result<LoginRequest, ValidationError> {
    let obj = as_object(payload, LOGIN_INVALID_MESSAGE)?;
    let mut errors = Vec::new();

    let email = string_field(obj, "email", &mut errors).and_then(|email| {
        if is_valid_email(email) {
            Some(email)
        } else {
            errors.push(FieldError::new(
                "email",
                Constraint::Email,
                "Please enter a valid email address",
            ));
            None
        }
    });

    let password = string_field(obj, "password", &mut errors).and_then(|password| {
        if password.is_empty() {
            errors.push(FieldError::new(
                "password",
                Constraint::NonEmpty,
                "Password is required",
            ));
            None
        } else {
            Some(password)
        }
    });

    match (email, password) {
        (Some(email), Some(password)) if errors.is_empty() => Ok(LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        }),
        _ => Err(ValidationError {
            message: LOGIN_INVALID_MESSAGE.to_string(),
            errors,
        }),
    }
}

pub fn validate_batch_job_request(payload: &Value) -> Result<BatchJobRequest, ValidationError> {
    let obj = as_object(payload, BATCH_INVALID_MESSAGE)?;
    let mut errors = Vec::new();

    let old_patients_target = number_field(obj, "oldPatientsTarget", &mut errors)
        .and_then(|n| n.as_f64())
        .and_then(|v| {
            bounded(
                "oldPatientsTarget",
                v,
                (0.0, "Must be at least 0"),
                Some((100.0, "Must be at most 100")),
                &mut errors,
            )
        });

    // The range check only covers magnitude; integrality is checked on its own.
    let import_setup_id = number_field(obj, "importSetupId", &mut errors)
        .and_then(|n| {
            let v = n.as_f64()?;
            bounded(
                "importSetupId",
                v,
                (1.0, "Must be a positive integer greater than 0"),
                None,
                &mut errors,
            )
            .map(|_| n)
        })
        .and_then(|n| match as_positive_integer(n) {
            Some(id) => Some(id),
            None => {
                errors.push(FieldError::new(
                    "importSetupId",
                    Constraint::Integer,
                    IMPORT_SETUP_ID_INTEGER_MESSAGE,
                ));
                None
            }
        });

    let hourly_batch_count = number_field(obj, "hourlyBatchCount", &mut errors)
        .and_then(|n| n.as_f64())
        .and_then(|v| {
            bounded(
                "hourlyBatchCount",
                v,
                (1.0, "Must be at least 1"),
                Some((100.0, "Must be at most 100")),
                &mut errors,
            )
        });

    match (old_patients_target, import_setup_id, hourly_batch_count) {
        (Some(old_patients_target), Some(import_setup_id), Some(hourly_batch_count))
            if errors.is_empty() =>
        {
            Ok(BatchJobRequest {
                old_patients_target,
                import_setup_id,
                hourly_batch_count,
            })
        }
        _ => {
            let only_integrality = errors.iter().all(|e| e.constraint == Constraint::Integer);
            let message = if only_integrality {
                IMPORT_SETUP_ID_INTEGER_MESSAGE
            } else {
                BATCH_INVALID_MESSAGE
            };
            Err(ValidationError {
                message: message.to_string(),
                errors,
            })
        }
    }
}
