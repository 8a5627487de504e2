//! services/api/src/adapters/backend.rs
//!
//! This module contains the adapter for the business REST backend.
//! It implements the `ExpenseService` and `PaymentMethodService` ports from the
//! `core` crate over plain JSON HTTP calls.

use async_trait::async_trait;
use recurring_core::domain::{CreatedExpense, ExpenseRequest, PaymentMethod};
use recurring_core::ports::{ExpenseService, PaymentMethodService, PortError, PortResult};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that talks to the REST backend owning expenses and payment methods.
#[derive(Clone)]
pub struct BackendClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl BackendClient {
    /// Creates a new `BackendClient`. Without a timeout, a hung call waits indefinitely.
    pub fn new(
        base_url: impl Into<String>,
        token: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, reqwest::Error> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Sends the request and decodes a 2xx JSON body; any other status is a rejection.
    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> PortResult<T> {
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        let response = check_status(response).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| PortError::Unexpected(format!("Malformed backend response: {}", e)))
    }
}

async fn check_status(response: Response) -> PortResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let detail = if body.trim().is_empty() {
        status.to_string()
    } else {
        format!("{}: {}", status, body.trim())
    };
    match status {
        StatusCode::NOT_FOUND => Err(PortError::NotFound(detail)),
        s if s.is_client_error() => Err(PortError::Rejected(detail)),
        _ => Err(PortError::Unexpected(detail)),
    }
}

//=========================================================================================
// Port Implementations
//=========================================================================================

#[async_trait]
impl ExpenseService for BackendClient {
    async fn create_expense(&self, request: &ExpenseRequest) -> PortResult<CreatedExpense> {
        self.send_json(self.client.post(self.url("expenses")).json(request))
            .await
    }
}

#[async_trait]
impl PaymentMethodService for BackendClient {
    async fn list_payment_methods(&self) -> PortResult<Vec<PaymentMethod>> {
        self.send_json(self.client.get(self.url("payment-methods")))
            .await
    }
}
