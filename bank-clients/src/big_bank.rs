//! The Big Bank confirmation client.

use async_trait::async_trait;
use serde::Deserialize;

use payments_types::{Bank, BankConfirmation, BankError, CardNumber, ConfirmationOutcome};

use crate::{map_transport_error, normalize_base_url, status_error};

const REJECTION_REASON: &str = "Transaction not approved by Big Bank.";

#[derive(Debug, Deserialize)]
struct CheckResponse {
    successful: bool,
}

/// Looks the amount up with `GET {base}/check/{amount}`.
pub struct BigBankClient {
    http: reqwest::Client,
    base_url: String,
}

impl BigBankClient {
    pub fn new(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: normalize_base_url(base_url),
        }
    }
}

#[async_trait]
impl BankConfirmation for BigBankClient {
    #[tracing::instrument(skip(self, card), fields(bank = %Bank::BigBank, card = %card))]
    async fn confirm(
        &self,
        card: &CardNumber,
        amount: i64,
    ) -> Result<ConfirmationOutcome, BankError> {
        let resp = self
            .http
            .get(format!("{}/check/{}", self.base_url, amount))
            .send()
            .await
            .map_err(|e| map_transport_error(Bank::BigBank, e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(status_error(Bank::BigBank, status));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| map_transport_error(Bank::BigBank, e))?;

        let check: CheckResponse =
            serde_json::from_str(&body).map_err(|e| BankError::Protocol {
                bank: Bank::BigBank,
                message: format!("HTTP {}: {}", status, e),
            })?;

        tracing::debug!(successful = check.successful, "Big Bank answered");

        if check.successful {
            Ok(ConfirmationOutcome::approved())
        } else {
            Ok(ConfirmationOutcome::rejected(REJECTION_REASON))
        }
    }
}
