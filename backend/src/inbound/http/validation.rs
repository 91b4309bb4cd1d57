//! Shared validation helpers for inbound HTTP adapters.

use actix_web::{HttpRequest, error::JsonPayloadError, web};
use serde_json::json;

use crate::domain::{EmployeeInput, EmployeeInputValidationError, Error};

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    MissingField,
    OutOfRange,
    MalformedBody,
}

impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            ErrorCode::MissingField => "missing_field",
            ErrorCode::OutOfRange => "out_of_range",
            ErrorCode::MalformedBody => "malformed_body",
        }
    }
}

/// Newtype wrapper for HTTP field names to provide type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    fn as_str(&self) -> &'static str {
        self.0
    }
}

/// Builder for validation errors with field context.
struct ValidationError {
    field: &'static str,
    message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }

    fn with_code(self, code: &str) -> Error {
        Error::invalid_request(self.message).with_details(json!({
            "field": self.field,
            "code": code,
        }))
    }
}

pub(crate) fn missing_field_error(field: FieldName) -> Error {
    let field = field.as_str();
    ValidationError::new(field, format!("missing required field: {field}"))
        .with_code(ErrorCode::MissingField.as_str())
}

pub(crate) fn required<T>(value: Option<T>, field: FieldName) -> Result<T, Error> {
    value.ok_or_else(|| missing_field_error(field))
}

/// Narrow a signed JSON number into an unsigned field.
///
/// Negative values collapse to zero so the domain reports them as
/// non-positive; values above the target range are rejected here.
pub(crate) fn parse_unsigned<T: TryFrom<i64>>(value: i64, field: FieldName) -> Result<T, Error> {
    let field = field.as_str();
    T::try_from(value.max(0)).map_err(|_| {
        ValidationError::new(field, format!("{field} is out of range"))
            .with_code(ErrorCode::OutOfRange.as_str())
    })
}

/// Map a creation-input validation failure to an `invalid_request` error.
pub(crate) fn employee_input_error(err: EmployeeInputValidationError) -> Error {
    ValidationError::new(err.field(), err.to_string()).with_code(err.code())
}

/// Validate raw creation fields into an [`EmployeeInput`].
pub(crate) fn parse_employee_input(
    name: String,
    salary: u64,
    age: u32,
    title: String,
) -> Result<EmployeeInput, Error> {
    EmployeeInput::new(name, salary, age, title).map_err(employee_input_error)
}

/// JSON extractor configuration that reports malformed bodies as domain errors.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(json_error_handler)
}

fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    ValidationError::new("body", format!("request body is not valid JSON: {err}"))
        .with_code(ErrorCode::MalformedBody.as_str())
        .into()
}
