//! # Payments Client SDK
//!
//! A typed Rust client for the payment authorizer API.

use payments_types::{ErrorResponse, PayRequest, PaymentResponse, TransactionResponse};
use reqwest::Client;
use serde::de::DeserializeOwned;

/// Header the server reads the idempotency key from.
const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

/// Error type for client operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid base URL: {0}")]
    InvalidUrl(String),
}

impl ClientError {
    /// HTTP status of an API error, if this is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Payments API client.
pub struct PaymentsClient {
    base_url: String,
    http: Client,
}

impl PaymentsClient {
    /// Creates a new client.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    /// Checks if the API is healthy.
    pub async fn health(&self) -> Result<bool, ClientError> {
        let resp = self
            .http
            .get(format!("{}/health", self.base_url))
            .send()
            .await?;
        Ok(resp.status().is_success())
    }

    /// Authorizes a card payment.
    ///
    /// Re-sending the same `idempotency_key` never charges twice; the server
    /// answers 409 instead.
    pub async fn pay(
        &self,
        card_number: &str,
        bank: &str,
        amount: i64,
        idempotency_key: &str,
    ) -> Result<PaymentResponse, ClientError> {
        let req = PayRequest {
            card_number: card_number.to_string(),
            bank: bank.to_string(),
            amount,
            idempotency_key: Some(idempotency_key.to_string()),
        };
        let resp = self
            .http
            .post(format!("{}/payment/pay", self.base_url))
            .header(IDEMPOTENCY_KEY_HEADER, idempotency_key)
            .json(&req)
            .send()
            .await?;
        self.handle_response(resp).await
    }

    /// Gets the ledger entry recorded for an idempotency key.
    pub async fn get_transaction(
        &self,
        idempotency_key: &str,
    ) -> Result<TransactionResponse, ClientError> {
        let url = self.transaction_url(idempotency_key)?;
        let resp = self.http.get(url).send().await?;
        self.handle_response(resp).await
    }

    /// The key is pushed as one path segment, so reserved characters are escaped.
    fn transaction_url(&self, idempotency_key: &str) -> Result<reqwest::Url, ClientError> {
        let mut url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| {
                ClientError::InvalidUrl(format!("{}: cannot be a base", self.base_url))
            })?
            .pop_if_empty()
            .extend(["payment", "transactions", idempotency_key]);
        Ok(url)
    }

    async fn handle_response<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = resp.status();
        if status.is_success() {
            let body = resp.text().await?;
            Ok(serde_json::from_str(&body)?)
        } else {
            let body = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| format!("{}: {}", e.error, e.reason))
                .unwrap_or(body);
            Err(ClientError::Api {
                status: status.as_u16(),
                message,
            })
        }
    }
}
