//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod employee_command;
mod employee_gateway;
mod employee_query;

#[cfg(test)]
pub use employee_command::MockEmployeeCommand;
pub use employee_command::EmployeeCommand;
pub use employee_gateway::{EmployeeGateway, EmployeeGatewayError, Outcome, OutcomeKind};
#[cfg(test)]
pub use employee_query::MockEmployeeQuery;
pub use employee_query::{EmployeeLookup, EmployeeQuery};
