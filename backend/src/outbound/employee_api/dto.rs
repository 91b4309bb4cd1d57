//! DTOs for the upstream employee API.
//!
//! Every upstream response is wrapped in `{"data": ..., "status": ...}`. The
//! adapter decodes into these transport DTOs first, then maps into domain
//! records in one pass.

use serde::{Deserialize, Serialize};

use crate::domain::{EmployeeInput, EmployeeRecord};

#[derive(Debug, Deserialize)]
pub(super) struct EnvelopeDto<T> {
    pub(super) data: Option<T>,
    #[serde(default)]
    pub(super) status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct EmployeeDto {
    #[serde(default)]
    pub(super) id: String,
    #[serde(default)]
    pub(super) employee_name: Option<String>,
    #[serde(default)]
    pub(super) employee_salary: Option<u64>,
    #[serde(default)]
    pub(super) employee_age: Option<u32>,
    #[serde(default)]
    pub(super) employee_title: Option<String>,
    #[serde(default)]
    pub(super) employee_email: Option<String>,
}

impl From<EmployeeDto> for EmployeeRecord {
    fn from(value: EmployeeDto) -> Self {
        Self {
            id: value.id,
            name: value.employee_name.unwrap_or_default(),
            salary: value.employee_salary.unwrap_or_default(),
            age: value.employee_age.unwrap_or_default(),
            title: value.employee_title.unwrap_or_default(),
            email: value.employee_email.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct CreateEmployeeDto<'a> {
    pub(super) name: &'a str,
    pub(super) salary: u64,
    pub(super) age: u32,
    pub(super) title: &'a str,
}

impl<'a> From<&'a EmployeeInput> for CreateEmployeeDto<'a> {
    fn from(value: &'a EmployeeInput) -> Self {
        Self {
            name: value.name(),
            salary: value.salary(),
            age: value.age(),
            title: value.title(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct DeleteEmployeeDto<'a> {
    pub(super) name: &'a str,
}
