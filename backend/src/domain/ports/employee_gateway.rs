//! Driven port for the upstream employee data service.
//!
//! Every upstream response is classified into a typed [`Outcome`]: success,
//! not-found, rate-limited, or transient error. This classification is the
//! single input the resilience pipeline uses to decide whether to retry.

use async_trait::async_trait;

use super::define_port_error;
use crate::domain::idempotency::IdempotencyKey;
use crate::domain::{EmployeeInput, EmployeeRecord};

define_port_error! {
    /// Non-success outcomes of an upstream call.
    pub enum EmployeeGatewayError {
        /// Upstream reported that the resource does not exist (HTTP 404).
        NotFound { message: String } =>
            "employee not found upstream: {message}",
        /// Upstream or local admission refused the call (HTTP 429).
        RateLimited { message: String } =>
            "upstream rate limited request: {message}",
        /// Any other failure: transport errors, 5xx, other 4xx, undecodable bodies.
        Transient { message: String } =>
            "upstream call failed: {message}",
    }
}

/// Coarse classification of an [`EmployeeGatewayError`], used by retry
/// predicates and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutcomeKind {
    /// See [`EmployeeGatewayError::NotFound`].
    NotFound,
    /// See [`EmployeeGatewayError::RateLimited`].
    RateLimited,
    /// See [`EmployeeGatewayError::Transient`].
    Transient,
}

impl EmployeeGatewayError {
    /// Classify this error.
    pub fn kind(&self) -> OutcomeKind {
        match self {
            Self::NotFound { .. } => OutcomeKind::NotFound,
            Self::RateLimited { .. } => OutcomeKind::RateLimited,
            Self::Transient { .. } => OutcomeKind::Transient,
        }
    }

    /// Message carried by the error, without the variant prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::NotFound { message }
            | Self::RateLimited { message }
            | Self::Transient { message } => message.as_str(),
        }
    }
}

/// Tagged result of one upstream call.
pub type Outcome<T> = Result<T, EmployeeGatewayError>;

/// Port for the four upstream employee operations.
///
/// Implementations perform exactly one upstream request per call; retries,
/// admission, and fallbacks are layered on top by the resilience pipeline.
#[async_trait]
pub trait EmployeeGateway: Send + Sync {
    /// Fetch every employee.
    async fn list_employees(&self) -> Outcome<Vec<EmployeeRecord>>;

    /// Fetch one employee by identifier.
    async fn get_employee(&self, id: &str) -> Outcome<EmployeeRecord>;

    /// Create an employee.
    ///
    /// When `idempotency_key` is supplied it is forwarded upstream so the
    /// upstream service can deduplicate repeated attempts.
    async fn create_employee(
        &self,
        input: &EmployeeInput,
        idempotency_key: Option<&IdempotencyKey>,
    ) -> Outcome<EmployeeRecord>;

    /// Delete the employee with the given name.
    ///
    /// Returns upstream's acknowledgement flag; `false` means nothing was
    /// deleted even though the call itself succeeded.
    async fn delete_employee_by_name(&self, name: &str) -> Outcome<bool>;
}
