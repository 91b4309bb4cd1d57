//! Scripted upstream gateway double.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::idempotency::IdempotencyKey;
use crate::domain::ports::{EmployeeGateway, EmployeeGatewayError, Outcome};
use crate::domain::{EmployeeInput, EmployeeRecord};

/// Calls observed by a [`ScriptedGateway`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GatewayCalls {
    pub list: usize,
    pub get: Vec<String>,
    /// Employee name and forwarded idempotency key for each create.
    pub create: Vec<(String, Option<String>)>,
    pub delete: Vec<String>,
}

/// Gateway replaying queued outcomes per operation.
///
/// Once a queue runs dry every further call fails with a transient error.
#[derive(Default)]
pub struct ScriptedGateway {
    list: Mutex<VecDeque<Outcome<Vec<EmployeeRecord>>>>,
    get: Mutex<VecDeque<Outcome<EmployeeRecord>>>,
    create: Mutex<VecDeque<Outcome<EmployeeRecord>>>,
    delete: Mutex<VecDeque<Outcome<bool>>>,
    calls: Mutex<GatewayCalls>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_list(self, outcome: Outcome<Vec<EmployeeRecord>>) -> Self {
        lock(&self.list).push_back(outcome);
        self
    }

    pub fn push_get(self, outcome: Outcome<EmployeeRecord>) -> Self {
        lock(&self.get).push_back(outcome);
        self
    }

    pub fn push_create(self, outcome: Outcome<EmployeeRecord>) -> Self {
        lock(&self.create).push_back(outcome);
        self
    }

    pub fn push_delete(self, outcome: Outcome<bool>) -> Self {
        lock(&self.delete).push_back(outcome);
        self
    }

    pub fn calls(&self) -> GatewayCalls {
        lock(&self.calls).clone()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(_) => panic!("scripted gateway mutex"),
    }
}

fn next<T>(queue: &Mutex<VecDeque<Outcome<T>>>, operation: &str) -> Outcome<T> {
    lock(queue).pop_front().unwrap_or_else(|| {
        Err(EmployeeGatewayError::transient(format!(
            "no scripted outcome left for {operation}"
        )))
    })
}

#[async_trait]
impl EmployeeGateway for ScriptedGateway {
    async fn list_employees(&self) -> Outcome<Vec<EmployeeRecord>> {
        lock(&self.calls).list += 1;
        next(&self.list, "list")
    }

    async fn get_employee(&self, id: &str) -> Outcome<EmployeeRecord> {
        lock(&self.calls).get.push(id.to_owned());
        next(&self.get, "get")
    }

    async fn create_employee(
        &self,
        input: &EmployeeInput,
        idempotency_key: Option<&IdempotencyKey>,
    ) -> Outcome<EmployeeRecord> {
        lock(&self.calls).create.push((
            input.name().to_owned(),
            idempotency_key.map(ToString::to_string),
        ));
        next(&self.create, "create")
    }

    async fn delete_employee_by_name(&self, name: &str) -> Outcome<bool> {
        lock(&self.calls).delete.push(name.to_owned());
        next(&self.delete, "delete")
    }
}
