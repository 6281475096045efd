//! In-memory repository adapter backed by `DashMap`.
//!
//! Used by the service and HTTP tests, and by local runs that do not need
//! durable state. Settlement takes the card's shard lock for the whole
//! check-append-debit sequence, so it is atomic with respect to every other
//! write on the same card.

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;

use payments_types::{CardNumber, LedgerEntry, PaymentRepository, RepoError};

/// Cloneable handle; clones share the same maps.
#[derive(Debug, Clone, Default)]
pub struct MemoryRepo {
    balances: Arc<DashMap<CardNumber, i64>>,
    ledger: Arc<DashMap<String, LedgerEntry>>,
}

impl MemoryRepo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a repository pre-provisioned with the given balances.
    pub fn with_balances(balances: impl IntoIterator<Item = (CardNumber, i64)>) -> Self {
        let repo = Self::new();
        for (card, amount) in balances {
            repo.balances.insert(card, amount);
        }
        repo
    }

    /// Number of recorded ledger entries.
    pub fn ledger_len(&self) -> usize {
        self.ledger.len()
    }
}

#[async_trait]
impl PaymentRepository for MemoryRepo {
    async fn get_balance(&self, card: &CardNumber) -> Result<Option<i64>, RepoError> {
        Ok(self.balances.get(card).map(|b| *b))
    }

    async fn set_balance(&self, card: &CardNumber, amount: i64) -> Result<(), RepoError> {
        if amount < 0 {
            return Err(RepoError::Database(format!(
                "Balance cannot be negative: {}",
                amount
            )));
        }
        self.balances.insert(card.clone(), amount);
        Ok(())
    }

    async fn compare_and_set_balance(
        &self,
        card: &CardNumber,
        expected: i64,
        new: i64,
    ) -> Result<bool, RepoError> {
        match self.balances.get_mut(card) {
            Some(mut balance) if *balance == expected => {
                *balance = new;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn ledger_entry_exists(&self, idempotency_key: &str) -> Result<bool, RepoError> {
        Ok(self.ledger.contains_key(idempotency_key))
    }

    async fn find_ledger_entry(
        &self,
        idempotency_key: &str,
    ) -> Result<Option<LedgerEntry>, RepoError> {
        Ok(self.ledger.get(idempotency_key).map(|e| e.clone()))
    }

    async fn append_ledger_entry(&self, entry: &LedgerEntry) -> Result<(), RepoError> {
        match self.ledger.entry(entry.idempotency_key.clone()) {
            Entry::Occupied(_) => Err(RepoError::DuplicateKey(entry.idempotency_key.clone())),
            Entry::Vacant(slot) => {
                slot.insert(entry.clone());
                Ok(())
            }
        }
    }

    async fn settle(&self, entry: &LedgerEntry, expected_balance: i64) -> Result<i64, RepoError> {
        // Held until the end of the function; every balance write for this
        // card serializes behind it.
        let mut balance = self
            .balances
            .get_mut(&entry.card)
            .ok_or(RepoError::NotFound)?;

        if *balance != expected_balance {
            return Err(RepoError::BalanceConflict {
                card: entry.card.masked(),
            });
        }

        let new_balance = expected_balance - entry.amount;
        if new_balance < 0 {
            return Err(RepoError::Database(format!(
                "Balance cannot be negative: {}",
                new_balance
            )));
        }

        match self.ledger.entry(entry.idempotency_key.clone()) {
            Entry::Occupied(_) => {
                return Err(RepoError::DuplicateKey(entry.idempotency_key.clone()));
            }
            Entry::Vacant(slot) => {
                slot.insert(entry.clone());
            }
        }

        *balance = new_balance;
        Ok(new_balance)
    }
}
