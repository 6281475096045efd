//! Error types for the payment authorizer.

use crate::domain::{Bank, CardNumber};

/// Failures reported by [`crate::PaymentRepository`] adapters (balance store and ledger).
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Transaction error: {0}")]
    Transaction(String),

    /// The ledger already holds an entry for this idempotency key.
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    /// The stored balance no longer matches the balance the caller observed.
    #[error("Balance changed concurrently for card {card}")]
    BalanceConflict { card: String },

    #[error("Entity not found")]
    NotFound,
}

/// Failures from a bank confirmation client.
///
/// Business rejections are NOT errors - they are a
/// [`crate::ConfirmationOutcome`] with `approved == false`.
#[derive(Debug, thiserror::Error)]
pub enum BankError {
    /// Transport-level failure (timeout, connection refused, upstream 5xx).
    #[error("{bank} is currently unavailable: {message}")]
    Unavailable { bank: Bank, message: String },

    /// The bank answered with something we cannot interpret.
    #[error("Unexpected response from {bank}: {message}")]
    Protocol { bank: Bank, message: String },
}

impl BankError {
    /// Only transport failures are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, BankError::Unavailable { .. })
    }

    pub fn bank(&self) -> Bank {
        match self {
            BankError::Unavailable { bank, .. } | BankError::Protocol { bank, .. } => *bank,
        }
    }
}

/// Typed failure of a single `authorize` call.
///
/// Every variant is terminal for the call. `ProcessingTimeout` is special:
/// the ledger write and balance update already committed, the response is
/// merely late.
#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Duplicate transaction detected: {idempotency_key}")]
    DuplicateRequest { idempotency_key: String },

    #[error("No balance found for card: {}", card.masked())]
    AccountNotFound { card: CardNumber },

    #[error("Insufficient funds: available {available}, requested {requested} (bank: {bank})")]
    InsufficientFunds {
        available: i64,
        requested: i64,
        bank: String,
    },

    #[error("Unsupported bank: {bank}")]
    UnsupportedBank { bank: String },

    #[error("Bank validation failed for {bank}: {reason}")]
    BankValidationFailed { bank: String, reason: String },

    #[error("{bank} service is currently unavailable. Please try again later.")]
    BankUnavailable { bank: Bank },

    #[error("Payment processing took too long: {elapsed_ms} ms")]
    ProcessingTimeout { elapsed_ms: u64, balance: i64 },

    #[error(transparent)]
    Store(#[from] RepoError),
}

impl PaymentError {
    /// Short machine-friendly label, used in API error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            PaymentError::InvalidRequest(_) => "INVALID_REQUEST",
            PaymentError::DuplicateRequest { .. } => "DUPLICATE_REQUEST",
            PaymentError::AccountNotFound { .. } => "ACCOUNT_NOT_FOUND",
            PaymentError::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            PaymentError::UnsupportedBank { .. } => "UNSUPPORTED_BANK",
            PaymentError::BankValidationFailed { .. } => "BANK_VALIDATION_FAILED",
            PaymentError::BankUnavailable { .. } => "BANK_UNAVAILABLE",
            PaymentError::ProcessingTimeout { .. } => "PROCESSING_TIMEOUT",
            PaymentError::Store(_) => "STORE_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_unavailable_is_retryable() {
        let unavailable = BankError::Unavailable {
            bank: Bank::Cashiers,
            message: "connection refused".into(),
        };
        let protocol = BankError::Protocol {
            bank: Bank::BigBank,
            message: "missing field".into(),
        };

        assert!(unavailable.is_retryable());
        assert!(!protocol.is_retryable());
        assert_eq!(protocol.bank(), Bank::BigBank);
    }

    #[test]
    fn test_account_not_found_masks_card() {
        let err = PaymentError::AccountNotFound {
            card: CardNumber::new("1234567812345678").unwrap(),
        };
        let message = err.to_string();

        assert!(message.ends_with("5678"));
        assert!(!message.contains("12345678123"));
    }

    #[test]
    fn test_store_error_converts() {
        let err: PaymentError = RepoError::Database("disk full".into()).into();
        assert_eq!(err.kind(), "STORE_ERROR");
    }
}
