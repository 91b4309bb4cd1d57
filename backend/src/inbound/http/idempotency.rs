//! Helpers for parsing idempotency headers in HTTP handlers.

use actix_web::http::header::HeaderMap;

use crate::domain::Error;
use crate::domain::idempotency::{IdempotencyKey, IdempotencyKeyValidationError};

/// HTTP header name for idempotency keys.
pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

/// Extract the idempotency key from request headers.
pub fn extract_idempotency_key(
    headers: &HeaderMap,
) -> Result<Option<IdempotencyKey>, IdempotencyKeyValidationError> {
    let Some(header_value) = headers.get(IDEMPOTENCY_KEY_HEADER) else {
        return Ok(None);
    };

    let key_str = header_value
        .to_str()
        .map_err(|_| IdempotencyKeyValidationError::InvalidKey)?;

    IdempotencyKey::new(key_str).map(Some)
}

/// Resolve the key for a create request, generating a fresh one when absent.
pub fn idempotency_key_or_random(headers: &HeaderMap) -> Result<IdempotencyKey, Error> {
    extract_idempotency_key(headers)
        .map(|key| key.unwrap_or_else(IdempotencyKey::random))
        .map_err(map_idempotency_key_error)
}

/// Map idempotency key validation errors to domain errors.
pub fn map_idempotency_key_error(err: IdempotencyKeyValidationError) -> Error {
    let message = match err {
        IdempotencyKeyValidationError::EmptyKey => "idempotency-key header must not be empty",
        IdempotencyKeyValidationError::TooLong => "idempotency-key header is too long",
        IdempotencyKeyValidationError::InvalidKey => {
            "idempotency-key header must contain only visible ASCII characters"
        }
    };
    Error::invalid_request(message).with_details(serde_json::json!({
        "field": IDEMPOTENCY_KEY_HEADER,
        "code": "invalid_idempotency_key",
    }))
}
