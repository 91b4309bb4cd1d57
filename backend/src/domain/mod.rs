//! Domain primitives, ports, and services.
//!
//! Purpose: hold the transport-agnostic core of the employee gateway. Nothing
//! here knows about HTTP; adapters in `inbound` and `outbound` translate to
//! and from these types.
//!
//! Public surface:
//! - Error (alias to `error::Error`): typed error payload crossing the core boundary.
//! - ErrorCode (alias to `error::ErrorCode`): stable error identifier.
//! - EmployeeRecord / EmployeeInput: employee data and validated creation input.
//! - EmployeeFacade: implementation of the driving ports.

pub mod aggregation;
pub mod employee;
pub mod employee_service;
pub mod error;
pub mod idempotency;
pub mod ports;
pub mod resilience;

pub use self::aggregation::AggregationError;
pub use self::employee::{EmployeeInput, EmployeeInputValidationError, EmployeeRecord};
pub use self::employee_service::EmployeeFacade;
pub use self::error::{Error, ErrorCode, ErrorValidationError};
