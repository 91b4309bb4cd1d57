//! Dispatch of the lookup identifier onto records or aggregate views.
//!
//! Two reserved identifiers share the lookup namespace with real employee
//! ids. They are matched here, once, so nothing else has to know about the
//! overload.

/// Number of names returned by the top-earners view.
pub const TOP_EARNER_LIMIT: usize = 10;

const HIGHEST_SALARY_ID: &str = "highestSalary";
const TOP_EARNERS_ID: &str = "topTenHighestEarningEmployeeNames";

/// What a lookup identifier refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupTarget<'a> {
    /// A real employee identifier, passed through untouched.
    Employee(&'a str),
    /// The highest-salary aggregate.
    HighestSalary,
    /// The top-earners aggregate.
    TopTenEarners,
}

impl<'a> LookupTarget<'a> {
    /// Classify `id`. Reserved identifiers match after trimming, ignoring
    /// ASCII case.
    ///
    /// # Examples
    /// ```
    /// use employee_gateway::domain::employee_service::LookupTarget;
    ///
    /// assert_eq!(LookupTarget::parse(" HIGHESTSALARY "), LookupTarget::HighestSalary);
    /// assert_eq!(LookupTarget::parse("42"), LookupTarget::Employee("42"));
    /// ```
    pub fn parse(id: &'a str) -> Self {
        let trimmed = id.trim();
        if trimmed.eq_ignore_ascii_case(HIGHEST_SALARY_ID) {
            Self::HighestSalary
        } else if trimmed.eq_ignore_ascii_case(TOP_EARNERS_ID) {
            Self::TopTenEarners
        } else {
            Self::Employee(id)
        }
    }
}
