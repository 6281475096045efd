//! Repository port trait.
//!
//! This is the primary port in our hexagonal architecture.
//! Adapters (Postgres, SQLite, in-memory) implement this trait; it covers
//! both the balance store and the transaction ledger.

use crate::domain::{CardNumber, LedgerEntry};
use crate::error::RepoError;

/// Persisted state the payment authorizer reads and writes.
///
/// Balances are provisioned externally; the authorizer only ever debits
/// them through [`PaymentRepository::settle`].
#[async_trait::async_trait]
pub trait PaymentRepository: Send + Sync + 'static {
    // ─────────────────────────────────────────────────────────────────────────────
    // Balance Store
    // ─────────────────────────────────────────────────────────────────────────────

    /// Current balance for a card, `None` if the card has no balance record.
    async fn get_balance(&self, card: &CardNumber) -> Result<Option<i64>, RepoError>;

    /// Creates or overwrites the balance for a card (provisioning).
    async fn set_balance(&self, card: &CardNumber, amount: i64) -> Result<(), RepoError>;

    /// Sets the balance to `new` only if it is still `expected`.
    ///
    /// Returns `false` when the stored balance had changed (or is missing).
    async fn compare_and_set_balance(
        &self,
        card: &CardNumber,
        expected: i64,
        new: i64,
    ) -> Result<bool, RepoError>;

    // ─────────────────────────────────────────────────────────────────────────────
    // Transaction Ledger
    // ─────────────────────────────────────────────────────────────────────────────

    /// Whether an entry with this idempotency key was already recorded.
    async fn ledger_entry_exists(&self, idempotency_key: &str) -> Result<bool, RepoError>;

    /// Finds the ledger entry for an idempotency key.
    async fn find_ledger_entry(
        &self,
        idempotency_key: &str,
    ) -> Result<Option<LedgerEntry>, RepoError>;

    /// Appends an entry. Fails with [`RepoError::DuplicateKey`] if the
    /// idempotency key is already present.
    async fn append_ledger_entry(&self, entry: &LedgerEntry) -> Result<(), RepoError>;

    // ─────────────────────────────────────────────────────────────────────────────
    // Settlement (MUST be atomic)
    // ─────────────────────────────────────────────────────────────────────────────

    /// Appends `entry` and debits `entry.amount` from the card in one atomic unit.
    ///
    /// The debit is conditional: it applies only if the stored balance still
    /// equals `expected_balance`. Returns the new balance.
    ///
    /// # Errors
    /// - [`RepoError::DuplicateKey`] - the idempotency key was already used
    /// - [`RepoError::BalanceConflict`] - the balance changed since it was read
    /// - [`RepoError::NotFound`] - the card has no balance record
    ///
    /// On any error neither the ledger nor the balance is modified.
    async fn settle(&self, entry: &LedgerEntry, expected_balance: i64) -> Result<i64, RepoError>;
}
