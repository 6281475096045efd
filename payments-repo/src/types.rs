//! Shared helpers for the sqlx adapters: column parsing and error mapping.

use payments_types::{Bank, CardNumber, RepoError, SizeClass};

// ─────────────────────────────────────────────────────────────────────────────
// Parsing helpers
// ─────────────────────────────────────────────────────────────────────────────

pub fn parse_bank(s: &str) -> Result<Bank, RepoError> {
    s.parse()
        .map_err(|_| RepoError::Database(format!("Unknown bank: {}", s)))
}

pub fn parse_size_class(s: &str) -> Result<SizeClass, RepoError> {
    s.parse().map_err(RepoError::Database)
}

pub fn parse_card(s: String) -> Result<CardNumber, RepoError> {
    CardNumber::new(s).map_err(|e| RepoError::Database(e.to_string()))
}

// ─────────────────────────────────────────────────────────────────────────────
// Error mapping
// ─────────────────────────────────────────────────────────────────────────────

pub fn db_error(err: sqlx::Error) -> RepoError {
    RepoError::Database(err.to_string())
}

pub fn tx_error(err: sqlx::Error) -> RepoError {
    RepoError::Transaction(err.to_string())
}

/// Maps a failed ledger INSERT; a unique violation means the key was already used.
pub fn ledger_insert_error(err: sqlx::Error, idempotency_key: &str) -> RepoError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            RepoError::DuplicateKey(idempotency_key.to_string())
        }
        _ => db_error(err),
    }
}

pub fn ensure_non_negative(amount: i64) -> Result<(), RepoError> {
    if amount < 0 {
        return Err(RepoError::Database(format!(
            "Balance cannot be negative: {}",
            amount
        )));
    }
    Ok(())
}
