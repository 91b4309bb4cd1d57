//! Employee facade implementing the driving ports.
//!
//! The facade is the only entry point inbound adapters use. It routes every
//! upstream call through the resilience pipeline, short-circuits repeated
//! creates via the idempotency cache, and computes aggregate views over a
//! freshly fetched snapshot.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::domain::aggregation::{highest_salary, search_by_name_fragment, top_n_earners};
use crate::domain::idempotency::{IdempotencyCache, IdempotencyKey};
use crate::domain::ports::{
    EmployeeCommand, EmployeeGateway, EmployeeLookup, EmployeeQuery, OutcomeKind,
};
use crate::domain::resilience::{PipelineError, ReadResult, ResiliencePipeline};
use crate::domain::{EmployeeInput, EmployeeRecord, Error};

mod lookup;

pub use lookup::{LookupTarget, TOP_EARNER_LIMIT};

/// Orchestrates gateway, pipeline, cache, and aggregation per operation.
#[derive(Clone)]
pub struct EmployeeFacade {
    gateway: Arc<dyn EmployeeGateway>,
    pipeline: Arc<ResiliencePipeline>,
    idempotency: Arc<IdempotencyCache>,
}

impl EmployeeFacade {
    /// Create a facade over the given collaborators.
    pub fn new(
        gateway: Arc<dyn EmployeeGateway>,
        pipeline: Arc<ResiliencePipeline>,
        idempotency: Arc<IdempotencyCache>,
    ) -> Self {
        Self {
            gateway,
            pipeline,
            idempotency,
        }
    }

    async fn snapshot(
        &self,
        cancel: &CancellationToken,
    ) -> Result<ReadResult<Vec<EmployeeRecord>>, Error> {
        let gateway = &self.gateway;
        self.pipeline
            .execute_read(
                "list_employees",
                cancel,
                || vec![EmployeeRecord::fallback()],
                move || gateway.list_employees(),
            )
            .await
            .map_err(|error| map_pipeline_error("list employees", error))
    }

    async fn fetch_employee(
        &self,
        id: &str,
        cancel: &CancellationToken,
    ) -> Result<ReadResult<EmployeeRecord>, Error> {
        let gateway = &self.gateway;
        self.pipeline
            .execute_read(
                "get_employee",
                cancel,
                EmployeeRecord::fallback,
                move || gateway.get_employee(id),
            )
            .await
            .map_err(|error| map_pipeline_error("get employee", error))
    }
}

fn map_pipeline_error(operation: &str, error: PipelineError) -> Error {
    match error {
        PipelineError::Cancelled => Error::cancelled(format!("{operation} was cancelled")),
        PipelineError::Upstream(error) => match error.kind() {
            OutcomeKind::NotFound => Error::not_found(error.to_string()),
            OutcomeKind::RateLimited => Error::rate_limited(error.to_string()),
            OutcomeKind::Transient => Error::transient_upstream(error.to_string()),
        },
    }
}

#[async_trait]
impl EmployeeQuery for EmployeeFacade {
    async fn get_all(&self, cancel: &CancellationToken) -> Result<Vec<EmployeeRecord>, Error> {
        let snapshot = self.snapshot(cancel).await?;
        info!(
            count = snapshot.value.len(),
            fallback = snapshot.is_fallback(),
            "listed employees"
        );
        Ok(snapshot.into_value())
    }

    async fn get_by_id(
        &self,
        id: &str,
        cancel: &CancellationToken,
    ) -> Result<EmployeeLookup, Error> {
        match LookupTarget::parse(id) {
            LookupTarget::HighestSalary => self
                .highest_salary(cancel)
                .await
                .map(EmployeeLookup::HighestSalary),
            LookupTarget::TopTenEarners => self
                .top_ten_names(cancel)
                .await
                .map(EmployeeLookup::TopEarnerNames),
            LookupTarget::Employee(id) => self
                .fetch_employee(id, cancel)
                .await
                .map(|employee| EmployeeLookup::Employee(employee.into_value())),
        }
    }

    async fn search_by_name(
        &self,
        fragment: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<EmployeeRecord>, Error> {
        let snapshot = self.snapshot(cancel).await?;
        Ok(search_by_name_fragment(&snapshot.value, fragment)?)
    }

    async fn highest_salary(&self, cancel: &CancellationToken) -> Result<u64, Error> {
        let snapshot = self.snapshot(cancel).await?;
        Ok(highest_salary(&snapshot.value)?)
    }

    async fn top_ten_names(&self, cancel: &CancellationToken) -> Result<Vec<String>, Error> {
        let snapshot = self.snapshot(cancel).await?;
        Ok(top_n_earners(&snapshot.value, TOP_EARNER_LIMIT))
    }
}

#[async_trait]
impl EmployeeCommand for EmployeeFacade {
    async fn create(
        &self,
        key: IdempotencyKey,
        input: EmployeeInput,
        cancel: &CancellationToken,
    ) -> Result<EmployeeRecord, Error> {
        if let Some(cached) = self.idempotency.lookup(&key) {
            info!(key = %key, id = %cached.id, "idempotency hit; replaying cached employee");
            return Ok(cached);
        }

        let gateway = &self.gateway;
        let (input_ref, key_ref) = (&input, &key);
        let outcome = self
            .pipeline
            .execute_write("create_employee", cancel, move || {
                gateway.create_employee(input_ref, Some(key_ref))
            })
            .await;

        let record = match outcome {
            Ok(record) => record,
            Err(PipelineError::Cancelled) => {
                return Err(Error::cancelled("create employee was cancelled"));
            }
            Err(PipelineError::Upstream(failure)) => {
                let degraded = EmployeeRecord::degraded_from(&input);
                error!(
                    key = %key,
                    id = %degraded.id,
                    error = %failure,
                    "create employee failed after retries; returning pending record"
                );
                degraded
            }
        };

        let stored = self.idempotency.store(&key, record);
        info!(key = %key, id = %stored.id, name = %stored.name, "employee created");
        Ok(stored)
    }

    async fn delete_by_id(&self, id: &str, cancel: &CancellationToken) -> Result<String, Error> {
        let lookup = self.fetch_employee(id, cancel).await?;
        if lookup.is_fallback() {
            return Err(Error::transient_upstream(format!(
                "employee {id} could not be fetched for deletion"
            )));
        }
        let employee = lookup.into_value();

        let gateway = &self.gateway;
        let name = employee.name.as_str();
        let deleted = self
            .pipeline
            .execute_write("delete_employee", cancel, move || {
                gateway.delete_employee_by_name(name)
            })
            .await
            .map_err(|error| map_pipeline_error("delete employee", error))?;

        if !deleted {
            return Err(Error::delete_returned_false(format!(
                "upstream reported nothing deleted for employee {id}"
            )));
        }
        info!(id, name = %employee.name, "employee deleted");
        Ok(employee.name)
    }
}

#[cfg(test)]
mod tests;
