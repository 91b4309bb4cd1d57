//! Employee records and creation inputs.
//!
//! `EmployeeRecord` values are produced by the upstream gateway or synthesised
//! as fallback/degraded values. They are immutable once built and cheap to
//! clone. `EmployeeInput` is the validated subset a client supplies when
//! requesting creation.

use uuid::Uuid;

const FALLBACK_ID: &str = "0";
const FALLBACK_NAME: &str = "Fallback Employee";
const FALLBACK_TITLE: &str = "N/A";
const FALLBACK_EMAIL: &str = "fallback@example.com";
const DEGRADED_ID_PREFIX: &str = "fallback-";
const PENDING_SUFFIX: &str = " (pending)";

/// One employee as known to the upstream service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmployeeRecord {
    /// Opaque identifier assigned by upstream (or synthesised locally).
    pub id: String,
    /// Display name. Empty when upstream omitted it.
    pub name: String,
    /// Annual salary.
    pub salary: u64,
    /// Age in years.
    pub age: u32,
    /// Job title.
    pub title: String,
    /// Contact email. Empty for locally synthesised records.
    pub email: String,
}

impl EmployeeRecord {
    /// Placeholder substituted by read paths when upstream cannot be reached.
    ///
    /// # Examples
    /// ```
    /// use employee_gateway::domain::EmployeeRecord;
    ///
    /// let fallback = EmployeeRecord::fallback();
    /// assert_eq!(fallback.id, "0");
    /// assert_eq!(fallback.salary, 0);
    /// ```
    pub fn fallback() -> Self {
        Self {
            id: FALLBACK_ID.to_owned(),
            name: FALLBACK_NAME.to_owned(),
            salary: 0,
            age: 0,
            title: FALLBACK_TITLE.to_owned(),
            email: FALLBACK_EMAIL.to_owned(),
        }
    }

    /// Locally synthesised record returned when a creation could not be
    /// confirmed upstream.
    ///
    /// The identifier is freshly generated and the name is marked as pending
    /// so clients can tell the record apart from a confirmed one.
    pub fn degraded_from(input: &EmployeeInput) -> Self {
        Self {
            id: format!("{DEGRADED_ID_PREFIX}{}", Uuid::new_v4()),
            name: format!("{}{PENDING_SUFFIX}", input.name()),
            salary: input.salary(),
            age: input.age(),
            title: input.title().to_owned(),
            email: String::new(),
        }
    }

    /// Whether this record was synthesised by [`EmployeeRecord::degraded_from`].
    pub fn is_degraded(&self) -> bool {
        self.id.starts_with(DEGRADED_ID_PREFIX) && self.name.ends_with(PENDING_SUFFIX)
    }
}

/// Validation errors for [`EmployeeInput`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum EmployeeInputValidationError {
    /// Name was blank.
    #[error("name must not be empty")]
    EmptyName,
    /// Salary was zero.
    #[error("salary must be positive")]
    NonPositiveSalary,
    /// Age was zero.
    #[error("age must be positive")]
    NonPositiveAge,
    /// Title was blank.
    #[error("title must not be empty")]
    EmptyTitle,
}

impl EmployeeInputValidationError {
    /// Name of the offending input field.
    pub fn field(self) -> &'static str {
        match self {
            Self::EmptyName => "name",
            Self::NonPositiveSalary => "salary",
            Self::NonPositiveAge => "age",
            Self::EmptyTitle => "title",
        }
    }

    /// Stable machine-readable code for the failure.
    pub fn code(self) -> &'static str {
        match self {
            Self::EmptyName => "empty_name",
            Self::NonPositiveSalary => "non_positive_salary",
            Self::NonPositiveAge => "non_positive_age",
            Self::EmptyTitle => "empty_title",
        }
    }
}

/// Attributes a client supplies to request creation of an employee.
///
/// ## Invariants
/// - `name` and `title` are non-empty once trimmed.
/// - `salary` and `age` are strictly positive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmployeeInput {
    name: String,
    salary: u64,
    age: u32,
    title: String,
}

impl EmployeeInput {
    /// Validate and construct a creation input.
    ///
    /// # Errors
    ///
    /// Returns the first [`EmployeeInputValidationError`] encountered, checking
    /// fields in declaration order.
    ///
    /// # Examples
    /// ```
    /// use employee_gateway::domain::{EmployeeInput, EmployeeInputValidationError};
    ///
    /// let input = EmployeeInput::new("Ada", 6000, 36, "Analyst").expect("valid input");
    /// assert_eq!(input.name(), "Ada");
    ///
    /// let err = EmployeeInput::new("Ada", 0, 36, "Analyst").expect_err("zero salary");
    /// assert_eq!(err, EmployeeInputValidationError::NonPositiveSalary);
    /// ```
    pub fn new(
        name: impl Into<String>,
        salary: u64,
        age: u32,
        title: impl Into<String>,
    ) -> Result<Self, EmployeeInputValidationError> {
        let name = name.into().trim().to_owned();
        let title = title.into().trim().to_owned();
        if name.is_empty() {
            return Err(EmployeeInputValidationError::EmptyName);
        }
        if salary == 0 {
            return Err(EmployeeInputValidationError::NonPositiveSalary);
        }
        if age == 0 {
            return Err(EmployeeInputValidationError::NonPositiveAge);
        }
        if title.is_empty() {
            return Err(EmployeeInputValidationError::EmptyTitle);
        }
        Ok(Self {
            name,
            salary,
            age,
            title,
        })
    }

    /// Requested display name.
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Requested salary.
    pub fn salary(&self) -> u64 {
        self.salary
    }

    /// Requested age.
    pub fn age(&self) -> u32 {
        self.age
    }

    /// Requested job title.
    pub fn title(&self) -> &str {
        self.title.as_str()
    }
}
