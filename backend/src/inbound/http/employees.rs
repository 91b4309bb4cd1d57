//! Employee HTTP handlers.
//!
//! ```text
//! GET    /api
//! GET    /api/search/{fragment}
//! GET    /api/{id}
//! POST   /api
//! DELETE /api/{id}
//! ```
//!
//! `GET /api/highestSalary` and `GET /api/topTenHighestEarningEmployeeNames`
//! are served by `GET /api/{id}` through the facade's reserved-identifier
//! dispatch.

use std::future::Future;
use std::time::Duration;

use actix_web::http::header::ContentType;
use actix_web::{HttpRequest, HttpResponse, delete, get, post, web};
use serde::{Deserialize, Serialize};
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::warn;

use crate::domain::EmployeeRecord;
use crate::domain::ports::EmployeeLookup;
use crate::inbound::http::ApiResult;
use crate::inbound::http::idempotency::idempotency_key_or_random;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, json_config, parse_employee_input, parse_unsigned, required,
};

const NAME: FieldName = FieldName::new("name");
const SALARY: FieldName = FieldName::new("salary");
const AGE: FieldName = FieldName::new("age");
const TITLE: FieldName = FieldName::new("title");

/// Employee payload using the upstream field names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeResponse {
    pub id: String,
    pub employee_name: String,
    pub employee_salary: u64,
    pub employee_age: u32,
    pub employee_title: String,
    pub employee_email: String,
}

impl From<EmployeeRecord> for EmployeeResponse {
    fn from(value: EmployeeRecord) -> Self {
        Self {
            id: value.id,
            employee_name: value.name,
            employee_salary: value.salary,
            employee_age: value.age,
            employee_title: value.title,
            employee_email: value.email,
        }
    }
}

/// Request payload for creating an employee.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct CreateEmployeeRequest {
    pub name: Option<String>,
    pub salary: Option<i64>,
    pub age: Option<i64>,
    pub title: Option<String>,
}

/// Cancellation scope bounding one request's work.
///
/// Dropping the scope (for example when the client disconnects and actix
/// drops the handler future) cancels the token too.
struct RequestDeadline {
    cancel: CancellationToken,
    deadline: Duration,
    _guard: DropGuard,
}

impl RequestDeadline {
    fn start(deadline: Duration) -> Self {
        let cancel = CancellationToken::new();
        let guard = cancel.clone().drop_guard();
        Self {
            cancel,
            deadline,
            _guard: guard,
        }
    }

    fn token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Drive `work` to completion, cancelling the token once the deadline passes.
    ///
    /// The future still runs after cancellation so it can report
    /// `Cancelled` rather than being dropped mid-flight.
    async fn run<F: Future>(&self, work: F) -> F::Output {
        tokio::pin!(work);
        tokio::select! {
            biased;
            output = &mut work => return output,
            () = tokio::time::sleep(self.deadline) => {
                warn!(deadline_ms = self.deadline.as_millis(), "request deadline elapsed; cancelling");
                self.cancel.cancel();
            }
        }
        work.await
    }
}

fn employee_list(employees: Vec<EmployeeRecord>) -> Vec<EmployeeResponse> {
    employees.into_iter().map(EmployeeResponse::from).collect()
}

/// List every employee known upstream.
#[get("")]
pub async fn list_employees(
    state: web::Data<HttpState>,
) -> ApiResult<web::Json<Vec<EmployeeResponse>>> {
    let scope = RequestDeadline::start(state.request_deadline);
    let employees = scope
        .run(state.employees_query.get_all(scope.token()))
        .await?;
    Ok(web::Json(employee_list(employees)))
}

/// List employees whose name contains the fragment, ignoring case.
#[get("/search/{fragment}")]
pub async fn search_employees(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<Vec<EmployeeResponse>>> {
    let fragment = path.into_inner();
    let scope = RequestDeadline::start(state.request_deadline);
    let employees = scope
        .run(state.employees_query.search_by_name(&fragment, scope.token()))
        .await?;
    Ok(web::Json(employee_list(employees)))
}

/// Fetch one employee, or an aggregate when `id` is a reserved identifier.
#[get("/{id}")]
pub async fn get_employee(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = path.into_inner();
    let scope = RequestDeadline::start(state.request_deadline);
    let lookup = scope
        .run(state.employees_query.get_by_id(&id, scope.token()))
        .await?;
    let response = match lookup {
        EmployeeLookup::Employee(employee) => {
            HttpResponse::Ok().json(EmployeeResponse::from(employee))
        }
        EmployeeLookup::HighestSalary(salary) => HttpResponse::Ok().json(salary),
        EmployeeLookup::TopEarnerNames(names) => HttpResponse::Ok().json(names),
    };
    Ok(response)
}

/// Create an employee, honouring the optional `Idempotency-Key` header.
#[post("")]
pub async fn create_employee(
    state: web::Data<HttpState>,
    request: HttpRequest,
    payload: web::Json<CreateEmployeeRequest>,
) -> ApiResult<HttpResponse> {
    let key = idempotency_key_or_random(request.headers())?;
    let CreateEmployeeRequest {
        name,
        salary,
        age,
        title,
    } = payload.into_inner();
    let name = required(name, NAME)?;
    let salary = parse_unsigned(required(salary, SALARY)?, SALARY)?;
    let age = parse_unsigned(required(age, AGE)?, AGE)?;
    let title = required(title, TITLE)?;
    let input = parse_employee_input(name, salary, age, title)?;

    let scope = RequestDeadline::start(state.request_deadline);
    let employee = scope
        .run(state.employees_command.create(key, input, scope.token()))
        .await?;
    Ok(HttpResponse::Created().json(EmployeeResponse::from(employee)))
}

/// Delete an employee by id and return the deleted employee's name.
#[delete("/{id}")]
pub async fn delete_employee(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = path.into_inner();
    let scope = RequestDeadline::start(state.request_deadline);
    let name = scope
        .run(state.employees_command.delete_by_id(&id, scope.token()))
        .await?;
    Ok(HttpResponse::Ok()
        .content_type(ContentType::plaintext())
        .body(name))
}

/// Register the employee routes under `/api`.
pub fn employees_scope() -> actix_web::Scope {
    web::scope("/api")
        .app_data(json_config())
        .service(list_employees)
        .service(create_employee)
        .service(search_employees)
        .service(get_employee)
        .service(delete_employee)
}

#[cfg(test)]
#[path = "employees_tests.rs"]
mod tests;
