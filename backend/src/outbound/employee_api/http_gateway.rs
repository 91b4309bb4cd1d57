//! Reqwest-backed upstream employee gateway.
//!
//! This adapter owns transport details only: URL construction, headers,
//! timeouts, status classification, and JSON decoding into domain records.
//! It performs exactly one request per call.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::dto::{CreateEmployeeDto, DeleteEmployeeDto, EmployeeDto, EnvelopeDto};
use crate::domain::idempotency::IdempotencyKey;
use crate::domain::ports::{EmployeeGateway, EmployeeGatewayError, Outcome};
use crate::domain::{EmployeeInput, EmployeeRecord};

/// Header carrying the idempotency key to upstream.
pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

const EMPLOYEE_COLLECTION: &str = "employee";

/// Errors raised while building an [`EmployeeHttpGateway`].
#[derive(Debug, thiserror::Error)]
pub enum EmployeeHttpGatewayBuildError {
    /// The base URL cannot have paths appended to it.
    #[error("upstream base URL {url} cannot be used as a base")]
    InvalidBaseUrl {
        /// Offending URL.
        url: String,
    },
    /// The HTTP client could not be constructed.
    #[error("failed to build upstream HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Upstream employee gateway performing HTTP requests against one base URL.
pub struct EmployeeHttpGateway {
    client: Client,
    collection: Url,
}

impl EmployeeHttpGateway {
    /// Build an adapter using a reqwest client with an explicit request timeout.
    ///
    /// `base_url` is the API root (for example `http://localhost:8112/api/v1/`);
    /// a trailing slash is added when missing.
    ///
    /// # Errors
    ///
    /// Returns an error when `base_url` cannot carry a path or when the
    /// reqwest client cannot be constructed.
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, EmployeeHttpGatewayBuildError> {
        let collection = collection_url(base_url)?;
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, collection })
    }

    fn employee_url(&self, id: &str) -> Url {
        let mut url = self.collection.clone();
        // `collection_url` already proved the URL can be a base.
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.push(id);
        }
        url
    }

    async fn send<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Outcome<T> {
        let response = request
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        debug!(operation, status = status.as_u16(), "upstream responded");
        if !status.is_success() {
            return Err(classify_status(status, body.as_ref()));
        }
        decode_data(body.as_ref())
    }
}

#[async_trait]
impl EmployeeGateway for EmployeeHttpGateway {
    async fn list_employees(&self) -> Outcome<Vec<EmployeeRecord>> {
        let request = self.client.get(self.collection.clone());
        let employees: Vec<EmployeeDto> = self.send("list_employees", request).await?;
        Ok(employees.into_iter().map(EmployeeRecord::from).collect())
    }

    async fn get_employee(&self, id: &str) -> Outcome<EmployeeRecord> {
        let request = self.client.get(self.employee_url(id));
        let employee: EmployeeDto = self.send("get_employee", request).await?;
        Ok(employee.into())
    }

    async fn create_employee(
        &self,
        input: &EmployeeInput,
        idempotency_key: Option<&IdempotencyKey>,
    ) -> Outcome<EmployeeRecord> {
        let mut request = self
            .client
            .post(self.collection.clone())
            .json(&CreateEmployeeDto::from(input));
        if let Some(key) = idempotency_key {
            request = request.header(IDEMPOTENCY_KEY_HEADER, key.as_ref());
        }
        let employee: EmployeeDto = self.send("create_employee", request).await?;
        Ok(employee.into())
    }

    async fn delete_employee_by_name(&self, name: &str) -> Outcome<bool> {
        let request = self
            .client
            .delete(self.collection.clone())
            .json(&DeleteEmployeeDto { name });
        self.send("delete_employee", request).await
    }
}

fn collection_url(mut base_url: Url) -> Result<Url, EmployeeHttpGatewayBuildError> {
    if base_url.cannot_be_a_base() {
        return Err(EmployeeHttpGatewayBuildError::InvalidBaseUrl {
            url: base_url.to_string(),
        });
    }
    if !base_url.path().ends_with('/') {
        let path = format!("{}/", base_url.path());
        base_url.set_path(&path);
    }
    base_url
        .join(EMPLOYEE_COLLECTION)
        .map_err(|_| EmployeeHttpGatewayBuildError::InvalidBaseUrl {
            url: base_url.to_string(),
        })
}

fn decode_data<T: DeserializeOwned>(body: &[u8]) -> Outcome<T> {
    let envelope: EnvelopeDto<T> = serde_json::from_slice(body).map_err(|error| {
        EmployeeGatewayError::transient(format!("invalid upstream JSON payload: {error}"))
    })?;
    envelope.data.ok_or_else(|| {
        EmployeeGatewayError::transient(format!(
            "upstream response carried no data (status: {})",
            envelope.status.as_deref().unwrap_or("unknown")
        ))
    })
}

fn map_transport_error(error: reqwest::Error) -> EmployeeGatewayError {
    if error.is_timeout() {
        EmployeeGatewayError::transient(format!("upstream timed out: {error}"))
    } else {
        EmployeeGatewayError::transient(error.to_string())
    }
}

fn classify_status(status: StatusCode, body: &[u8]) -> EmployeeGatewayError {
    let body_preview = body_preview(body);
    let message = if body_preview.is_empty() {
        format!("status {}", status.as_u16())
    } else {
        format!("status {}: {}", status.as_u16(), body_preview)
    };

    match status {
        StatusCode::TOO_MANY_REQUESTS => EmployeeGatewayError::rate_limited(message),
        StatusCode::NOT_FOUND => EmployeeGatewayError::not_found(message),
        _ => EmployeeGatewayError::transient(message),
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}
