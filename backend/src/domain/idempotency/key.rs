//! Idempotency key validation.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Upper bound on key length, in bytes.
pub const MAX_IDEMPOTENCY_KEY_LEN: usize = 255;

/// Validation errors for [`IdempotencyKey`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdempotencyKeyValidationError {
    /// The key string was empty.
    #[error("idempotency key must not be empty")]
    EmptyKey,
    /// The key exceeded [`MAX_IDEMPOTENCY_KEY_LEN`].
    #[error("idempotency key must be at most {MAX_IDEMPOTENCY_KEY_LEN} bytes")]
    TooLong,
    /// The key contained whitespace or non-visible characters.
    #[error("idempotency key must contain only visible ASCII characters")]
    InvalidKey,
}

/// Client-supplied opaque idempotency key.
///
/// Clients send this via the `Idempotency-Key` HTTP header so repeated create
/// requests resolve to the same employee record. The same key is forwarded
/// upstream so the upstream service can deduplicate as well.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IdempotencyKey(String);

impl IdempotencyKey {
    /// Validate and construct an [`IdempotencyKey`] from a string.
    ///
    /// # Errors
    ///
    /// Returns [`IdempotencyKeyValidationError::EmptyKey`] for empty input,
    /// [`IdempotencyKeyValidationError::TooLong`] for oversized input, and
    /// [`IdempotencyKeyValidationError::InvalidKey`] when any byte is not a
    /// visible ASCII character.
    ///
    /// # Example
    ///
    /// ```
    /// # use employee_gateway::domain::idempotency::IdempotencyKey;
    /// let key = IdempotencyKey::new("order-7731").expect("valid key");
    /// assert_eq!(key.as_ref(), "order-7731");
    /// ```
    pub fn new(key: impl AsRef<str>) -> Result<Self, IdempotencyKeyValidationError> {
        Self::from_owned(key.as_ref().to_owned())
    }

    /// Generate a new random [`IdempotencyKey`].
    ///
    /// Used by the transport when a client omits the header.
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    fn from_owned(key: String) -> Result<Self, IdempotencyKeyValidationError> {
        if key.is_empty() {
            return Err(IdempotencyKeyValidationError::EmptyKey);
        }
        if key.len() > MAX_IDEMPOTENCY_KEY_LEN {
            return Err(IdempotencyKeyValidationError::TooLong);
        }
        if !key.bytes().all(|byte| byte.is_ascii_graphic()) {
            return Err(IdempotencyKeyValidationError::InvalidKey);
        }
        Ok(Self(key))
    }
}

impl AsRef<str> for IdempotencyKey {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<IdempotencyKey> for String {
    fn from(value: IdempotencyKey) -> Self {
        value.0
    }
}

impl TryFrom<String> for IdempotencyKey {
    type Error = IdempotencyKeyValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}
