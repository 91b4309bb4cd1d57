//! Driving port for employee mutations.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::domain::idempotency::IdempotencyKey;
use crate::domain::{EmployeeInput, EmployeeRecord, Error};

/// Domain use-case port for creating and deleting employees.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmployeeCommand: Send + Sync {
    /// Create an employee, replaying the cached record for a repeated `key`.
    ///
    /// Creation is best effort: when upstream cannot confirm it, a degraded
    /// record marked as pending is returned (and cached) instead of an error.
    async fn create(
        &self,
        key: IdempotencyKey,
        input: EmployeeInput,
        cancel: &CancellationToken,
    ) -> Result<EmployeeRecord, Error>;

    /// Delete the employee with identifier `id` and return its name.
    async fn delete_by_id(&self, id: &str, cancel: &CancellationToken) -> Result<String, Error>;
}
