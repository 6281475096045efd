//! Payment request and ledger entry domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

use super::bank::{Bank, SizeClass};
use super::card::CardNumber;
use crate::error::PaymentError;

/// Longest idempotency key the ledger accepts.
pub const MAX_IDEMPOTENCY_KEY_LEN: usize = 128;

/// Unique identifier for a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(Uuid);

impl TransactionId {
    /// Creates a new random TransactionId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a TransactionId from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Returns the UUID value.
    pub fn into_uuid(self) -> Uuid {
        self.0
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TransactionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// A single payment to authorize. Built per call and discarded afterwards.
///
/// `bank` stays a raw string: an unknown bank is a routing failure that is
/// reported after the balance check, not a parse failure at the boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRequest {
    pub card: CardNumber,
    pub bank: String,
    /// Amount in the smallest currency unit.
    pub amount: i64,
    pub idempotency_key: String,
}

impl PaymentRequest {
    /// Builds a request; surrounding whitespace is not part of the idempotency key.
    pub fn new(
        card: CardNumber,
        bank: impl Into<String>,
        amount: i64,
        idempotency_key: impl Into<String>,
    ) -> Self {
        Self {
            card,
            bank: bank.into(),
            amount,
            idempotency_key: idempotency_key.into().trim().to_string(),
        }
    }

    /// Checks the invariants that do not need any stored state.
    pub fn validate(&self) -> Result<(), PaymentError> {
        if self.amount <= 0 {
            return Err(PaymentError::InvalidRequest(
                "Amount must be positive".into(),
            ));
        }
        let key = self.idempotency_key.trim();
        if key.is_empty() {
            return Err(PaymentError::InvalidRequest(
                "Idempotency key cannot be empty".into(),
            ));
        }
        if key.chars().count() > MAX_IDEMPOTENCY_KEY_LEN {
            return Err(PaymentError::InvalidRequest(format!(
                "Idempotency key cannot exceed {} characters",
                MAX_IDEMPOTENCY_KEY_LEN
            )));
        }
        Ok(())
    }
}

/// A completed payment as recorded in the ledger.
///
/// Immutable once written. Its existence for an idempotency key is the
/// durable proof that the payment was processed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: TransactionId,
    pub bank: Bank,
    pub idempotency_key: String,
    pub card: CardNumber,
    pub amount: i64,
    pub size_class: SizeClass,
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Creates a new entry stamped with the current time.
    pub fn new(
        bank: Bank,
        idempotency_key: impl Into<String>,
        card: CardNumber,
        amount: i64,
        size_class: SizeClass,
    ) -> Self {
        Self {
            id: TransactionId::new(),
            bank,
            idempotency_key: idempotency_key.into(),
            card,
            amount,
            size_class,
            created_at: Utc::now(),
        }
    }

    /// Reconstructs an entry from database fields.
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: TransactionId,
        bank: Bank,
        idempotency_key: String,
        card: CardNumber,
        amount: i64,
        size_class: SizeClass,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            bank,
            idempotency_key,
            card,
            amount,
            size_class,
            created_at,
        }
    }
}

/// Result of a successful authorization.
#[derive(Debug, Clone)]
pub struct Authorization {
    /// Card balance after the debit.
    pub balance: i64,
    /// Wall-clock time the authorization took.
    pub elapsed: Duration,
    /// The ledger entry that was written.
    pub entry: LedgerEntry,
}
