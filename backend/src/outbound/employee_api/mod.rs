//! Upstream employee API adapter.
//!
//! This module provides a thin reqwest implementation of the
//! `EmployeeGateway` port.

mod dto;
mod http_gateway;

pub use http_gateway::{EmployeeHttpGateway, EmployeeHttpGatewayBuildError, IDEMPOTENCY_KEY_HEADER};
