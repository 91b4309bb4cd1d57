//! Derived read-only views over an employee snapshot.
//!
//! These functions never call upstream; the facade fetches a fresh snapshot
//! through the read pipeline and hands it in.

use crate::domain::{EmployeeRecord, Error};

/// Failures of the aggregation functions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AggregationError {
    /// The snapshot held no employees.
    #[error("employee list is empty")]
    EmptyCollection,
    /// No employee name contained the fragment.
    #[error("no employee name contains '{fragment}'")]
    NoMatch {
        /// Fragment that was searched for.
        fragment: String,
    },
}

impl From<AggregationError> for Error {
    fn from(value: AggregationError) -> Self {
        match &value {
            AggregationError::EmptyCollection => Error::empty_collection(value.to_string()),
            AggregationError::NoMatch { .. } => Error::not_found(value.to_string()),
        }
    }
}

/// Highest salary in `employees`.
///
/// # Errors
///
/// Returns [`AggregationError::EmptyCollection`] for an empty slice.
///
/// # Examples
/// ```
/// use employee_gateway::domain::aggregation::highest_salary;
/// use employee_gateway::domain::EmployeeRecord;
///
/// let staff = [5000, 7000].map(|salary| EmployeeRecord {
///     salary,
///     ..EmployeeRecord::fallback()
/// });
/// assert_eq!(highest_salary(&staff), Ok(7000));
/// ```
pub fn highest_salary(employees: &[EmployeeRecord]) -> Result<u64, AggregationError> {
    employees
        .iter()
        .map(|employee| employee.salary)
        .max()
        .ok_or(AggregationError::EmptyCollection)
}

/// Names of the `n` best-paid employees, highest salary first.
///
/// Equal salaries keep their snapshot order.
pub fn top_n_earners(employees: &[EmployeeRecord], n: usize) -> Vec<String> {
    let mut ranked = employees.iter().collect::<Vec<_>>();
    ranked.sort_by(|left, right| right.salary.cmp(&left.salary));
    ranked
        .into_iter()
        .take(n)
        .map(|employee| employee.name.clone())
        .collect()
}

/// Employees whose name contains `fragment`, ignoring case.
///
/// Records with an empty name never match.
///
/// # Errors
///
/// Returns [`AggregationError::NoMatch`] when nothing matches.
pub fn search_by_name_fragment(
    employees: &[EmployeeRecord],
    fragment: &str,
) -> Result<Vec<EmployeeRecord>, AggregationError> {
    let needle = fragment.to_lowercase();
    let matches = employees
        .iter()
        .filter(|employee| {
            !employee.name.is_empty() && employee.name.to_lowercase().contains(&needle)
        })
        .cloned()
        .collect::<Vec<_>>();

    if matches.is_empty() {
        return Err(AggregationError::NoMatch {
            fragment: fragment.to_owned(),
        });
    }
    Ok(matches)
}
