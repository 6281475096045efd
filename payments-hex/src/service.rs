//! Payment Application Service
//!
//! Orchestrates one authorization through the repository and bank ports:
//! idempotency check, balance check, routing, bank confirmation (with
//! retry), then an atomic ledger write plus conditional debit.
//! Contains NO infrastructure logic - pure business orchestration.

use std::time::Duration;

use tokio::time::Instant;

use payments_types::{
    Authorization, Bank, BankError, BankRegistry, CardNumber, LedgerEntry, PaymentError,
    PaymentRepository, PaymentRequest, RepoError, RoutingDecision,
};

use crate::retry::{RetryPolicy, retry_bank_call};

/// Reason reported when a bank routes to confirmation but no client is registered.
const UNSUPPORTED_BANK_REASON: &str = "Unsupported bank.";

/// Tunables for [`PaymentService`].
#[derive(Debug, Clone)]
pub struct AuthorizerConfig {
    /// Retry policy around the bank confirmation call.
    pub retry: RetryPolicy,
    /// Ceiling on total processing time before the call reports `ProcessingTimeout`.
    pub max_processing_time: Duration,
    /// How many times settlement is re-attempted after a concurrent balance change.
    pub max_settle_attempts: u32,
}

impl Default for AuthorizerConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            max_processing_time: Duration::from_secs(30),
            max_settle_attempts: 64,
        }
    }
}

/// Application service for payment authorization.
///
/// Generic over `R: PaymentRepository` - the adapter is injected at compile time.
/// Bank clients are looked up at runtime through the [`BankRegistry`], so a
/// new bank is added by registering a client, not by editing this service.
pub struct PaymentService<R: PaymentRepository> {
    repo: R,
    banks: BankRegistry,
    config: AuthorizerConfig,
}

impl<R: PaymentRepository> PaymentService<R> {
    /// Creates a service with the default [`AuthorizerConfig`].
    pub fn new(repo: R, banks: BankRegistry) -> Self {
        Self::with_config(repo, banks, AuthorizerConfig::default())
    }

    pub fn with_config(repo: R, banks: BankRegistry, config: AuthorizerConfig) -> Self {
        Self {
            repo,
            banks,
            config,
        }
    }

    /// Returns a reference to the underlying repository.
    pub fn repo(&self) -> &R {
        &self.repo
    }

    pub fn config(&self) -> &AuthorizerConfig {
        &self.config
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Authorization
    // ─────────────────────────────────────────────────────────────────────────────

    /// Authorizes and records a payment.
    ///
    /// Each step is a hard gate; nothing is persisted unless every step up to
    /// settlement succeeds. `ProcessingTimeout` is returned *after* the
    /// ledger entry and the debit committed.
    #[tracing::instrument(
        skip(self, request),
        fields(
            card = %request.card,
            bank = %request.bank,
            amount = request.amount,
            idempotency_key = %request.idempotency_key,
        )
    )]
    pub async fn authorize(&self, request: PaymentRequest) -> Result<Authorization, PaymentError> {
        let started = Instant::now();

        request.validate()?;

        // 1. Idempotency check (fast path; `settle` is the authoritative guard)
        if self
            .repo
            .ledger_entry_exists(&request.idempotency_key)
            .await?
        {
            tracing::info!("Duplicate request rejected");
            return Err(PaymentError::DuplicateRequest {
                idempotency_key: request.idempotency_key,
            });
        }

        // 2. Balance check
        let balance = self.current_balance(&request.card).await?;
        ensure_funds(balance, request.amount, &request.bank)?;

        // 3. Routing
        let bank: Bank = request.bank.parse()?;
        let routing = RoutingDecision::route(bank, request.amount);
        tracing::debug!(size_class = %routing.size_class, "Routing decided");

        // 4. Bank confirmation
        if routing.requires_confirmation() {
            self.confirm_with_bank(routing.bank, &request.card, request.amount)
                .await?;
        }

        // 5 + 6. Ledger write and debit, atomically
        let entry = LedgerEntry::new(
            routing.bank,
            request.idempotency_key,
            request.card,
            request.amount,
            routing.size_class,
        );
        let new_balance = self.settle(&entry, balance, &request.bank).await?;

        // 7. Deadline (observational only, the payment is committed)
        let elapsed = started.elapsed();
        let elapsed_ms = elapsed.as_millis() as u64;
        if elapsed > self.config.max_processing_time {
            tracing::warn!(elapsed_ms, balance = new_balance, "Payment committed past deadline");
            return Err(PaymentError::ProcessingTimeout {
                elapsed_ms,
                balance: new_balance,
            });
        }

        tracing::info!(
            transaction_id = %entry.id,
            size_class = %entry.size_class,
            balance = new_balance,
            elapsed_ms,
            "Payment authorized"
        );

        Ok(Authorization {
            balance: new_balance,
            elapsed,
            entry,
        })
    }

    /// Looks up the ledger entry recorded for an idempotency key.
    ///
    /// The way to resolve a `ProcessingTimeout`: if an entry exists, the
    /// payment went through.
    #[tracing::instrument(skip(self))]
    pub async fn find_transaction(
        &self,
        idempotency_key: &str,
    ) -> Result<Option<LedgerEntry>, PaymentError> {
        self.repo
            .find_ledger_entry(idempotency_key)
            .await
            .map_err(Into::into)
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Steps
    // ─────────────────────────────────────────────────────────────────────────────

    async fn current_balance(&self, card: &CardNumber) -> Result<i64, PaymentError> {
        self.repo
            .get_balance(card)
            .await?
            .ok_or_else(|| PaymentError::AccountNotFound { card: card.clone() })
    }

    async fn confirm_with_bank(
        &self,
        bank: Bank,
        card: &CardNumber,
        amount: i64,
    ) -> Result<(), PaymentError> {
        let Some(client) = self.banks.get(bank) else {
            return Err(PaymentError::BankValidationFailed {
                bank: bank.name().to_string(),
                reason: UNSUPPORTED_BANK_REASON.to_string(),
            });
        };

        let outcome = retry_bank_call(&self.config.retry, || client.confirm(card, amount))
            .await
            .map_err(|e| match e {
                BankError::Unavailable { bank, .. } => PaymentError::BankUnavailable { bank },
                BankError::Protocol { bank, message } => PaymentError::BankValidationFailed {
                    bank: bank.name().to_string(),
                    reason: message,
                },
            })?;

        if !outcome.approved {
            let reason = outcome
                .reason
                .unwrap_or_else(|| "Transaction not approved.".to_string());
            tracing::info!(%reason, "Bank rejected payment");
            return Err(PaymentError::BankValidationFailed {
                bank: bank.name().to_string(),
                reason,
            });
        }

        Ok(())
    }

    /// Commits `entry` against the balance observed in step 2.
    ///
    /// A concurrent debit on the same card surfaces as `BalanceConflict`; the
    /// balance is then re-read and funds re-checked. The bank is not asked again.
    async fn settle(
        &self,
        entry: &LedgerEntry,
        observed_balance: i64,
        bank_label: &str,
    ) -> Result<i64, PaymentError> {
        let mut expected = observed_balance;

        for attempt in 1..=self.config.max_settle_attempts.max(1) {
            match self.repo.settle(entry, expected).await {
                Ok(new_balance) => return Ok(new_balance),
                Err(RepoError::DuplicateKey(key)) => {
                    tracing::info!("Duplicate request detected at settlement");
                    return Err(PaymentError::DuplicateRequest {
                        idempotency_key: key,
                    });
                }
                Err(RepoError::NotFound) => {
                    return Err(PaymentError::AccountNotFound {
                        card: entry.card.clone(),
                    });
                }
                Err(RepoError::BalanceConflict { .. }) => {
                    tracing::debug!(attempt, "Balance changed concurrently, re-reading");
                    expected = self.current_balance(&entry.card).await?;
                    ensure_funds(expected, entry.amount, bank_label)?;
                }
                Err(e) => return Err(e.into()),
            }
        }

        tracing::error!(
            attempts = self.config.max_settle_attempts,
            "Settlement kept conflicting, giving up"
        );
        Err(PaymentError::Store(RepoError::BalanceConflict {
            card: entry.card.masked(),
        }))
    }
}

fn ensure_funds(available: i64, requested: i64, bank: &str) -> Result<(), PaymentError> {
    if available < requested {
        tracing::info!(available, requested, "Insufficient funds");
        return Err(PaymentError::InsufficientFunds {
            available,
            requested,
            bank: bank.to_string(),
        });
    }
    Ok(())
}
