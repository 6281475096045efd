//! The Cashiers confirmation client.

use async_trait::async_trait;

use payments_types::{Bank, BankConfirmation, BankError, CardNumber, ConfirmationOutcome};

use crate::{map_transport_error, normalize_base_url};

/// Looks the payment up with `GET {base}/payment/{card}?amount={amount}`.
///
/// Only the status class matters: 2xx approves, anything else rejects.
pub struct CashiersClient {
    http: reqwest::Client,
    base_url: String,
}

impl CashiersClient {
    pub fn new(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: normalize_base_url(base_url),
        }
    }

    fn payment_url(&self, card: &CardNumber) -> Result<reqwest::Url, BankError> {
        let invalid = |message: String| BankError::Protocol {
            bank: Bank::Cashiers,
            message,
        };

        let mut url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| invalid(format!("invalid base URL {}: {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| invalid(format!("base URL cannot have a path: {}", self.base_url)))?
            .pop_if_empty()
            .push("payment")
            .push(card.as_str());
        Ok(url)
    }
}

#[async_trait]
impl BankConfirmation for CashiersClient {
    #[tracing::instrument(skip(self, card), fields(bank = %Bank::Cashiers, card = %card))]
    async fn confirm(
        &self,
        card: &CardNumber,
        amount: i64,
    ) -> Result<ConfirmationOutcome, BankError> {
        let url = self.payment_url(card)?;

        let resp = self
            .http
            .get(url)
            .query(&[("amount", amount)])
            .send()
            .await
            .map_err(|e| map_transport_error(Bank::Cashiers, e))?;

        let status = resp.status();
        tracing::debug!(status = status.as_u16(), "Cashiers answered");

        if status.is_success() {
            Ok(ConfirmationOutcome::approved())
        } else {
            Ok(ConfirmationOutcome::rejected(format!(
                "Error Status Code: {}",
                status.as_u16()
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{dead_url, http, serve};
    use axum::{
        Router,
        extract::{Path, Query},
        http::StatusCode,
        routing::get,
    };
    use std::collections::HashMap;

    fn card() -> CardNumber {
        CardNumber::new("1234567812345678").unwrap()
    }

    async fn stub() -> String {
        let router = Router::new().route(
            "/payment/{card}",
            get(
                |Path(card): Path<String>, Query(params): Query<HashMap<String, String>>| async move {
                    let amount: i64 = params
                        .get("amount")
                        .and_then(|a| a.parse().ok())
                        .unwrap_or_default();
                    if card == "1234567812345678" && amount <= 500 {
                        StatusCode::OK
                    } else {
                        StatusCode::PAYMENT_REQUIRED
                    }
                },
            ),
        );
        serve(router).await
    }

    #[tokio::test]
    async fn test_success_status_approves() {
        let client = CashiersClient::new(http(), &stub().await);

        let outcome = client.confirm(&card(), 150).await.unwrap();
        assert!(outcome.approved);
    }

    #[tokio::test]
    async fn test_error_status_rejects_with_code() {
        let client = CashiersClient::new(http(), &stub().await);

        let outcome = client.confirm(&card(), 900).await.unwrap();
        assert!(!outcome.approved);
        assert_eq!(outcome.reason.as_deref(), Some("Error Status Code: 402"));
    }

    #[tokio::test]
    async fn test_connection_refused_is_unavailable() {
        let client = CashiersClient::new(http(), &dead_url().await);

        let result = client.confirm(&card(), 150).await;
        assert!(matches!(result, Err(BankError::Unavailable { .. })));
    }

    #[test]
    fn test_payment_url_encodes_card() {
        let client = CashiersClient::new(http(), "http://fake.cashiers.no/");
        let card = CardNumber::new("12 34/56").unwrap();

        let url = client.payment_url(&card).unwrap();
        assert_eq!(
            url.as_str(),
            "http://fake.cashiers.no/payment/12%2034%2F56"
        );
    }
}
