//! Data Transfer Objects (DTOs) for requests and responses.
//!
//! Field names are camelCase to stay compatible with existing clients of
//! the payment endpoint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Authorization, Bank, LedgerEntry, SizeClass, TransactionId};

// ─────────────────────────────────────────────────────────────────────────────
// Payment DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// Request to pay with a card.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayRequest {
    pub card_number: String,
    /// Bank name, e.g. "The Big Bank"
    pub bank: String,
    /// Amount in smallest currency unit
    pub amount: i64,
    /// Optional here; the `Idempotency-Key` header is the alternative.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
}

/// Response after a successful payment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResponse {
    pub card_number: String,
    pub bank: Bank,
    pub amount: i64,
    pub transaction_id: TransactionId,
    pub transaction_timestamp: DateTime<Utc>,
    pub current_account_balance: i64,
    pub duration_ms: u64,
    pub size_class: SizeClass,
}

impl From<Authorization> for PaymentResponse {
    fn from(auth: Authorization) -> Self {
        Self {
            card_number: auth.entry.card.as_str().to_string(),
            bank: auth.entry.bank,
            amount: auth.entry.amount,
            transaction_id: auth.entry.id,
            transaction_timestamp: auth.entry.created_at,
            current_account_balance: auth.balance,
            duration_ms: auth.elapsed.as_millis() as u64,
            size_class: auth.entry.size_class,
        }
    }
}

/// A recorded ledger entry as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResponse {
    pub id: TransactionId,
    pub bank: Bank,
    pub idempotency_key: String,
    pub card_number: String,
    pub amount: i64,
    pub size_class: SizeClass,
    pub created_at: DateTime<Utc>,
}

impl From<LedgerEntry> for TransactionResponse {
    fn from(entry: LedgerEntry) -> Self {
        Self {
            id: entry.id,
            bank: entry.bank,
            idempotency_key: entry.idempotency_key,
            card_number: entry.card.into(),
            amount: entry.amount,
            size_class: entry.size_class,
            created_at: entry.created_at,
        }
    }
}

/// Error body for every failed API call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank: Option<String>,
    /// Machine-friendly error kind, e.g. `INSUFFICIENT_FUNDS`
    pub error: String,
    /// Human-readable explanation
    pub reason: String,
    /// HTTP status code
    pub code: u16,
    /// Balance after commit; only set for `PROCESSING_TIMEOUT`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balance: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CardNumber;
    use std::time::Duration;

    #[test]
    fn test_pay_request_accepts_legacy_shape() {
        let req: PayRequest =
            serde_json::from_str(r#"{"cardNumber":"1234","bank":"The Big Bank","amount":100}"#)
                .unwrap();

        assert_eq!(req.card_number, "1234");
        assert_eq!(req.amount, 100);
        assert!(req.idempotency_key.is_none());
    }

    #[test]
    fn test_payment_response_from_authorization() {
        let entry = LedgerEntry::new(
            Bank::Loaners,
            "key-1",
            CardNumber::new("1234").unwrap(),
            150,
            SizeClass::Big,
        );
        let response = PaymentResponse::from(Authorization {
            balance: 850,
            elapsed: Duration::from_millis(42),
            entry,
        });

        assert_eq!(response.current_account_balance, 850);
        assert_eq!(response.duration_ms, 42);

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["currentAccountBalance"], 850);
        assert_eq!(json["sizeClass"], "big");
    }
}
