//! SQLite repository integration tests.

#[cfg(test)]
mod tests {
    use payments_types::{Bank, CardNumber, LedgerEntry, PaymentRepository, RepoError, SizeClass};

    use crate::SqliteRepo;

    async fn setup_repo() -> SqliteRepo {
        SqliteRepo::new("sqlite::memory:").await.unwrap()
    }

    fn card(raw: &str) -> CardNumber {
        CardNumber::new(raw).unwrap()
    }

    fn entry(key: &str, card_number: &str, amount: i64) -> LedgerEntry {
        LedgerEntry::new(Bank::BigBank, key, card(card_number), amount, SizeClass::Big)
    }

    #[tokio::test]
    async fn test_balance_upsert() {
        let repo = setup_repo().await;
        let c = card("4000123412341234");

        assert_eq!(repo.get_balance(&c).await.unwrap(), None);

        repo.set_balance(&c, 1000).await.unwrap();
        assert_eq!(repo.get_balance(&c).await.unwrap(), Some(1000));

        repo.set_balance(&c, 250).await.unwrap();
        assert_eq!(repo.get_balance(&c).await.unwrap(), Some(250));
    }

    #[tokio::test]
    async fn test_negative_balance_rejected() {
        let repo = setup_repo().await;

        let result = repo.set_balance(&card("4000"), -5).await;

        assert!(matches!(result, Err(RepoError::Database(_))));
    }

    #[tokio::test]
    async fn test_compare_and_set_balance() {
        let repo = setup_repo().await;
        let c = card("4000");
        repo.set_balance(&c, 100).await.unwrap();

        assert!(!repo.compare_and_set_balance(&c, 99, 10).await.unwrap());
        assert_eq!(repo.get_balance(&c).await.unwrap(), Some(100));

        assert!(repo.compare_and_set_balance(&c, 100, 10).await.unwrap());
        assert_eq!(repo.get_balance(&c).await.unwrap(), Some(10));
    }

    #[tokio::test]
    async fn test_append_and_find_entry() {
        let repo = setup_repo().await;
        let original = entry("key-1", "4000", 300);

        repo.append_ledger_entry(&original).await.unwrap();

        assert!(repo.ledger_entry_exists("key-1").await.unwrap());
        assert!(!repo.ledger_entry_exists("key-2").await.unwrap());

        let found = repo.find_ledger_entry("key-1").await.unwrap().unwrap();
        assert_eq!(found.id, original.id);
        assert_eq!(found.bank, Bank::BigBank);
        assert_eq!(found.card, card("4000"));
        assert_eq!(found.amount, 300);
        assert_eq!(found.size_class, SizeClass::Big);
        assert_eq!(found.created_at, original.created_at);

        assert!(repo.find_ledger_entry("key-2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_append_duplicate_key() {
        let repo = setup_repo().await;
        repo.append_ledger_entry(&entry("key-1", "4000", 300))
            .await
            .unwrap();

        let result = repo.append_ledger_entry(&entry("key-1", "5000", 20)).await;

        assert!(matches!(result, Err(RepoError::DuplicateKey(k)) if k == "key-1"));
    }

    #[tokio::test]
    async fn test_settle_success() {
        let repo = setup_repo().await;
        let c = card("4000");
        repo.set_balance(&c, 1000).await.unwrap();

        let new_balance = repo.settle(&entry("key-1", "4000", 300), 1000).await.unwrap();

        assert_eq!(new_balance, 700);
        assert_eq!(repo.get_balance(&c).await.unwrap(), Some(700));
        assert!(repo.ledger_entry_exists("key-1").await.unwrap());
    }

    #[tokio::test]
    async fn test_settle_duplicate_rolls_back() {
        let repo = setup_repo().await;
        let c = card("4000");
        repo.set_balance(&c, 1000).await.unwrap();
        repo.settle(&entry("key-1", "4000", 300), 1000).await.unwrap();

        let result = repo.settle(&entry("key-1", "4000", 300), 700).await;

        assert!(matches!(result, Err(RepoError::DuplicateKey(_))));
        assert_eq!(repo.get_balance(&c).await.unwrap(), Some(700));
    }

    #[tokio::test]
    async fn test_settle_conflict_rolls_back_entry() {
        let repo = setup_repo().await;
        let c = card("4000");
        repo.set_balance(&c, 1000).await.unwrap();

        let result = repo.settle(&entry("key-1", "4000", 300), 900).await;

        assert!(matches!(result, Err(RepoError::BalanceConflict { .. })));
        assert_eq!(repo.get_balance(&c).await.unwrap(), Some(1000));
        assert!(!repo.ledger_entry_exists("key-1").await.unwrap());
    }

    #[tokio::test]
    async fn test_settle_unknown_card() {
        let repo = setup_repo().await;

        let result = repo.settle(&entry("key-1", "4000", 300), 1000).await;

        assert!(matches!(result, Err(RepoError::NotFound)));
        assert!(!repo.ledger_entry_exists("key-1").await.unwrap());
    }

    #[tokio::test]
    async fn test_file_database_persists_across_reopen() {
        let dir = std::env::temp_dir().join(format!("payments-repo-{}", uuid::Uuid::new_v4()));
        let url = format!("sqlite://{}/payments.db", dir.display());

        {
            let repo = SqliteRepo::new(&url).await.unwrap();
            repo.set_balance(&card("4000"), 1000).await.unwrap();
            repo.settle(&entry("key-1", "4000", 300), 1000).await.unwrap();
            repo.pool().close().await;
        }

        let reopened = SqliteRepo::new(&url).await.unwrap();
        assert_eq!(reopened.get_balance(&card("4000")).await.unwrap(), Some(700));
        assert!(reopened.ledger_entry_exists("key-1").await.unwrap());

        reopened.pool().close().await;
        let _ = std::fs::remove_dir_all(dir);
    }
}
