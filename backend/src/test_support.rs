//! Test utilities for the employee gateway crate.
//!
//! This module provides shared helpers for both unit tests (in `src/`) and
//! integration tests (in `tests/`). It is compiled for tests and when the
//! `test-support` feature is enabled.

pub mod employee_gateway;
pub mod resilience;

use crate::domain::EmployeeRecord;

/// Build an employee record with a derived title and email.
pub fn employee(id: &str, name: &str, salary: u64) -> EmployeeRecord {
    EmployeeRecord {
        id: id.to_owned(),
        name: name.to_owned(),
        salary,
        age: 30,
        title: "Engineer".to_owned(),
        email: format!("{id}@company.test"),
    }
}
