//! Driving port for employee reads.
//!
//! Inbound adapters (HTTP handlers) call this port; the production
//! implementation is the employee facade, which routes every read through the
//! resilience pipeline.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::domain::{EmployeeRecord, Error};

/// Result of a lookup by identifier.
///
/// Two reserved identifiers select aggregate views instead of a record, so a
/// lookup can resolve to any of three shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmployeeLookup {
    /// A single employee.
    Employee(EmployeeRecord),
    /// Highest salary across all employees.
    HighestSalary(u64),
    /// Names of the best-paid employees, highest first.
    TopEarnerNames(Vec<String>),
}

/// Domain use-case port for employee queries.
///
/// Every method observes `cancel`; once it fires the call returns a
/// `cancelled` error without further upstream attempts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmployeeQuery: Send + Sync {
    /// Every employee, or a single fallback record when upstream is unusable.
    async fn get_all(&self, cancel: &CancellationToken) -> Result<Vec<EmployeeRecord>, Error>;

    /// Look up `id`, honouring the reserved aggregate identifiers.
    async fn get_by_id(&self, id: &str, cancel: &CancellationToken)
    -> Result<EmployeeLookup, Error>;

    /// Employees whose name contains `fragment`, ignoring case.
    async fn search_by_name(
        &self,
        fragment: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<EmployeeRecord>, Error>;

    /// Highest salary across all employees.
    async fn highest_salary(&self, cancel: &CancellationToken) -> Result<u64, Error>;

    /// Names of the ten best-paid employees.
    async fn top_ten_names(&self, cancel: &CancellationToken) -> Result<Vec<String>, Error>;
}
