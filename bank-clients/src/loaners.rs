//! Loaners confirmation client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use payments_types::{Bank, BankConfirmation, BankError, CardNumber, ConfirmationOutcome};

use crate::{map_transport_error, normalize_base_url, status_error};

/// Response code Loaners uses for a processed check.
const SUCCESS_CODE: i32 = 1;
/// Status label of an approved check.
const APPROVED_STATUS: &str = "Approved";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CheckRequest<'a> {
    card_number: &'a str,
    amount: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CheckResponse {
    response_code: i32,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    error_reason: Option<String>,
}

impl CheckResponse {
    fn into_outcome(self) -> ConfirmationOutcome {
        if self.response_code != SUCCESS_CODE {
            return ConfirmationOutcome::rejected(format!(
                "Error status code: {}, with reason: {}",
                self.response_code,
                self.error_reason.as_deref().unwrap_or("unknown")
            ));
        }

        match self.status.as_deref() {
            Some(APPROVED_STATUS) => ConfirmationOutcome::approved(),
            other => ConfirmationOutcome::rejected(format!(
                "Transaction not approved. Status: {}",
                other.unwrap_or("missing")
            )),
        }
    }
}

/// Submits `{cardNumber, amount}` to `POST {base}/payment/check`.
pub struct LoanersClient {
    http: reqwest::Client,
    base_url: String,
}

impl LoanersClient {
    pub fn new(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: normalize_base_url(base_url),
        }
    }
}

#[async_trait]
impl BankConfirmation for LoanersClient {
    #[tracing::instrument(skip(self, card), fields(bank = %Bank::Loaners, card = %card))]
    async fn confirm(
        &self,
        card: &CardNumber,
        amount: i64,
    ) -> Result<ConfirmationOutcome, BankError> {
        let resp = self
            .http
            .post(format!("{}/payment/check", self.base_url))
            .json(&CheckRequest {
                card_number: card.as_str(),
                amount,
            })
            .send()
            .await
            .map_err(|e| map_transport_error(Bank::Loaners, e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(status_error(Bank::Loaners, status));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| map_transport_error(Bank::Loaners, e))?;

        let check: CheckResponse =
            serde_json::from_str(&body).map_err(|e| BankError::Protocol {
                bank: Bank::Loaners,
                message: format!("HTTP {}: {}", status, e),
            })?;

        tracing::debug!(
            response_code = check.response_code,
            status = ?check.status,
            "Loaners answered"
        );

        Ok(check.into_outcome())
    }
}
