//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;
use std::time::Duration;

use crate::domain::ports::{EmployeeCommand, EmployeeQuery};

/// Default upper bound on how long one request may keep the pipeline busy.
pub const DEFAULT_REQUEST_DEADLINE: Duration = Duration::from_secs(30);

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub employees_query: Arc<dyn EmployeeQuery>,
    pub employees_command: Arc<dyn EmployeeCommand>,
    pub request_deadline: Duration,
}

impl HttpState {
    /// Construct state from the two driving ports.
    ///
    /// # Examples
    /// ```no_run
    /// use std::sync::Arc;
    ///
    /// use employee_gateway::domain::EmployeeFacade;
    /// use employee_gateway::inbound::http::state::HttpState;
    ///
    /// fn wire(facade: EmployeeFacade) -> HttpState {
    ///     let facade = Arc::new(facade);
    ///     HttpState::new(facade.clone(), facade)
    /// }
    /// ```
    pub fn new(
        employees_query: Arc<dyn EmployeeQuery>,
        employees_command: Arc<dyn EmployeeCommand>,
    ) -> Self {
        Self {
            employees_query,
            employees_command,
            request_deadline: DEFAULT_REQUEST_DEADLINE,
        }
    }

    /// Override the per-request deadline.
    pub fn with_request_deadline(mut self, deadline: Duration) -> Self {
        self.request_deadline = deadline;
        self
    }
}
