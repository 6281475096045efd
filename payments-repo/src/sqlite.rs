//! SQLite repository adapter.
#![allow(clippy::collapsible_if)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;
use uuid::Uuid;

use payments_types::{CardNumber, LedgerEntry, PaymentRepository, RepoError, TransactionId};

use crate::types::{
    db_error, ensure_non_negative, ledger_insert_error, parse_bank, parse_card, parse_size_class,
    tx_error,
};

// ─────────────────────────────────────────────────────────────────────────────
// Row types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, sqlx::FromRow)]
struct DbBalance {
    amount: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct DbLedgerEntry {
    id: String,
    bank: String,
    idempotency_key: String,
    card_number: String,
    amount: i64,
    size_class: String,
    created_at: String,
}

impl DbLedgerEntry {
    fn into_domain(self) -> Result<LedgerEntry, RepoError> {
        let id = Uuid::parse_str(&self.id).map_err(|e| RepoError::Database(e.to_string()))?;
        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .map_err(|e| RepoError::Database(e.to_string()))?
            .with_timezone(&Utc);

        Ok(LedgerEntry::from_parts(
            TransactionId::from_uuid(id),
            parse_bank(&self.bank)?,
            self.idempotency_key,
            parse_card(self.card_number)?,
            self.amount,
            parse_size_class(&self.size_class)?,
            created_at,
        ))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// SQLite Repository
// ─────────────────────────────────────────────────────────────────────────────

/// SQLite repository implementation.
pub struct SqliteRepo {
    pool: SqlitePool,
}

fn is_in_memory(database_url: &str) -> bool {
    database_url.contains(":memory:") || database_url.contains("mode=memory")
}

impl SqliteRepo {
    /// Creates a new SQLite repository with automatic migration.
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        // Ensure on-disk SQLite target directory exists (no-op for in-memory).
        if let Some(path) = database_url.strip_prefix("sqlite://") {
            // Remove query parameters
            let path = path.split('?').next().unwrap_or(path);
            if path != ":memory:" {
                let p = std::path::Path::new(path);
                if let Some(parent) = p.parent() {
                    if !parent.as_os_str().is_empty() {
                        tokio::fs::create_dir_all(parent).await?;
                    }
                }
            }
        }

        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

        // Every connection to `:memory:` opens its own database, so an
        // in-memory store must live on exactly one connection that never expires.
        let pool_options = if is_in_memory(database_url) {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(8)
        };
        let pool = pool_options.connect_with(options).await?;

        let repo = Self { pool };
        repo.create_schema().await?;
        tracing::debug!("SQLite schema ready");
        Ok(repo)
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Creates the database schema (idempotent).
    pub async fn create_schema(&self) -> Result<(), RepoError> {
        let ddl = include_str!("../migrations/0001_create_tables.sql");
        sqlx::query(ddl).execute(&self.pool).await.map_err(db_error)?;
        Ok(())
    }

    async fn insert_entry<'e, E>(executor: E, entry: &LedgerEntry) -> Result<(), RepoError>
    where
        E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
    {
        sqlx::query(
            r#"INSERT INTO transactions (id, bank, idempotency_key, card_number, amount, size_class, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(entry.id.to_string())
        .bind(entry.bank.name())
        .bind(&entry.idempotency_key)
        .bind(entry.card.as_str())
        .bind(entry.amount)
        .bind(entry.size_class.as_str())
        .bind(entry.created_at.to_rfc3339())
        .execute(executor)
        .await
        .map_err(|e| ledger_insert_error(e, &entry.idempotency_key))?;
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Repository implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl PaymentRepository for SqliteRepo {
    async fn get_balance(&self, card: &CardNumber) -> Result<Option<i64>, RepoError> {
        let row: Option<DbBalance> =
            sqlx::query_as(r#"SELECT amount FROM balances WHERE card_number = ?"#)
                .bind(card.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error)?;

        Ok(row.map(|r| r.amount))
    }

    async fn set_balance(&self, card: &CardNumber, amount: i64) -> Result<(), RepoError> {
        ensure_non_negative(amount)?;

        sqlx::query(
            r#"INSERT INTO balances (card_number, amount) VALUES (?, ?)
               ON CONFLICT(card_number) DO UPDATE SET amount = excluded.amount"#,
        )
        .bind(card.as_str())
        .bind(amount)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(())
    }

    async fn compare_and_set_balance(
        &self,
        card: &CardNumber,
        expected: i64,
        new: i64,
    ) -> Result<bool, RepoError> {
        ensure_non_negative(new)?;

        let result =
            sqlx::query(r#"UPDATE balances SET amount = ? WHERE card_number = ? AND amount = ?"#)
                .bind(new)
                .bind(card.as_str())
                .bind(expected)
                .execute(&self.pool)
                .await
                .map_err(db_error)?;

        Ok(result.rows_affected() == 1)
    }

    async fn ledger_entry_exists(&self, idempotency_key: &str) -> Result<bool, RepoError> {
        let exists: bool = sqlx::query_scalar(
            r#"SELECT EXISTS(SELECT 1 FROM transactions WHERE idempotency_key = ?)"#,
        )
        .bind(idempotency_key)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(exists)
    }

    async fn find_ledger_entry(
        &self,
        idempotency_key: &str,
    ) -> Result<Option<LedgerEntry>, RepoError> {
        let row: Option<DbLedgerEntry> = sqlx::query_as(
            r#"SELECT id, bank, idempotency_key, card_number, amount, size_class, created_at
               FROM transactions WHERE idempotency_key = ?"#,
        )
        .bind(idempotency_key)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        row.map(DbLedgerEntry::into_domain).transpose()
    }

    async fn append_ledger_entry(&self, entry: &LedgerEntry) -> Result<(), RepoError> {
        Self::insert_entry(&self.pool, entry).await
    }

    async fn settle(&self, entry: &LedgerEntry, expected_balance: i64) -> Result<i64, RepoError> {
        let new_balance = expected_balance - entry.amount;
        ensure_non_negative(new_balance)?;

        let mut db_tx = self.pool.begin().await.map_err(tx_error)?;

        // Dropping `db_tx` without commit rolls back the INSERT.
        Self::insert_entry(&mut *db_tx, entry).await?;

        let result =
            sqlx::query(r#"UPDATE balances SET amount = ? WHERE card_number = ? AND amount = ?"#)
                .bind(new_balance)
                .bind(entry.card.as_str())
                .bind(expected_balance)
                .execute(&mut *db_tx)
                .await
                .map_err(db_error)?;

        if result.rows_affected() == 0 {
            let current: Option<DbBalance> =
                sqlx::query_as(r#"SELECT amount FROM balances WHERE card_number = ?"#)
                    .bind(entry.card.as_str())
                    .fetch_optional(&mut *db_tx)
                    .await
                    .map_err(db_error)?;

            db_tx.rollback().await.map_err(tx_error)?;
            tracing::debug!(card = %entry.card, "Settlement rolled back, balance moved");

            return Err(match current {
                None => RepoError::NotFound,
                Some(_) => RepoError::BalanceConflict {
                    card: entry.card.masked(),
                },
            });
        }

        db_tx.commit().await.map_err(tx_error)?;

        Ok(new_balance)
    }
}
