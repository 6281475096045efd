//! PostgreSQL repository adapter.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
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
    id: Uuid,
    bank: String,
    idempotency_key: String,
    card_number: String,
    amount: i64,
    size_class: String,
    created_at: DateTime<Utc>,
}

impl DbLedgerEntry {
    fn into_domain(self) -> Result<LedgerEntry, RepoError> {
        Ok(LedgerEntry::from_parts(
            TransactionId::from_uuid(self.id),
            parse_bank(&self.bank)?,
            self.idempotency_key,
            parse_card(self.card_number)?,
            self.amount,
            parse_size_class(&self.size_class)?,
            self.created_at,
        ))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// PostgreSQL Repository
// ─────────────────────────────────────────────────────────────────────────────

/// PostgreSQL repository; settlement runs in a single transaction.
pub struct PostgresRepo {
    pool: PgPool,
}

/// Executes SQL statements from a migration file, splitting by semicolons.
async fn execute_migration(pool: &PgPool, sql: &str, name: &str) -> Result<(), anyhow::Error> {
    for statement in sql.split(';') {
        let stmt = statement.trim();
        if !stmt.is_empty() {
            sqlx::query(stmt)
                .execute(pool)
                .await
                .map_err(|e| anyhow::anyhow!("Migration {} failed: {}", name, e))?;
        }
    }
    Ok(())
}

impl PostgresRepo {
    /// Creates a new PostgreSQL repository with automatic migration.
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        execute_migration(
            &pool,
            include_str!("../migrations/0001_create_tables_pg.sql"),
            "0001",
        )
        .await?;
        Ok(Self { pool })
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn insert_entry<'e, E>(executor: E, entry: &LedgerEntry) -> Result<(), RepoError>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>,
    {
        sqlx::query(
            r#"INSERT INTO transactions (id, bank, idempotency_key, card_number, amount, size_class, created_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7)"#,
        )
        .bind(entry.id.into_uuid())
        .bind(entry.bank.name())
        .bind(&entry.idempotency_key)
        .bind(entry.card.as_str())
        .bind(entry.amount)
        .bind(entry.size_class.as_str())
        .bind(entry.created_at)
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
impl PaymentRepository for PostgresRepo {
    async fn get_balance(&self, card: &CardNumber) -> Result<Option<i64>, RepoError> {
        let row: Option<DbBalance> =
            sqlx::query_as(r#"SELECT amount FROM balances WHERE card_number = $1"#)
                .bind(card.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error)?;

        Ok(row.map(|r| r.amount))
    }

    async fn set_balance(&self, card: &CardNumber, amount: i64) -> Result<(), RepoError> {
        ensure_non_negative(amount)?;

        sqlx::query(
            r#"INSERT INTO balances (card_number, amount) VALUES ($1, $2)
               ON CONFLICT (card_number) DO UPDATE SET amount = EXCLUDED.amount"#,
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

        let result = sqlx::query(
            r#"UPDATE balances SET amount = $1 WHERE card_number = $2 AND amount = $3"#,
        )
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
            r#"SELECT EXISTS(SELECT 1 FROM transactions WHERE idempotency_key = $1)"#,
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
               FROM transactions WHERE idempotency_key = $1"#,
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

        // Lock the balance row so the conditional debit cannot interleave.
        let current: Option<DbBalance> =
            sqlx::query_as(r#"SELECT amount FROM balances WHERE card_number = $1 FOR UPDATE"#)
                .bind(entry.card.as_str())
                .fetch_optional(&mut *db_tx)
                .await
                .map_err(db_error)?;

        match current {
            None => return Err(RepoError::NotFound),
            Some(row) if row.amount != expected_balance => {
                tracing::debug!(card = %entry.card, "Settlement aborted, balance moved");
                return Err(RepoError::BalanceConflict {
                    card: entry.card.masked(),
                });
            }
            Some(_) => {}
        }

        Self::insert_entry(&mut *db_tx, entry).await?;

        sqlx::query(r#"UPDATE balances SET amount = $1 WHERE card_number = $2"#)
            .bind(new_balance)
            .bind(entry.card.as_str())
            .execute(&mut *db_tx)
            .await
            .map_err(db_error)?;

        db_tx.commit().await.map_err(tx_error)?;

        Ok(new_balance)
    }
}
