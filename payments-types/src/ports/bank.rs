//! Bank confirmation port.
//!
//! Each bank speaks its own protocol; the authorizer only sees this
//! capability and looks implementations up by [`Bank`].

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::{Bank, CardNumber, ConfirmationOutcome};
use crate::error::BankError;

/// Port trait for external bank confirmation services.
#[async_trait::async_trait]
pub trait BankConfirmation: Send + Sync {
    /// Asks the bank whether it approves debiting `amount` from `card`.
    ///
    /// A rejection is `Ok` with `approved == false`; `Err` is reserved for
    /// transport and protocol failures.
    async fn confirm(
        &self,
        card: &CardNumber,
        amount: i64,
    ) -> Result<ConfirmationOutcome, BankError>;
}

/// Confirmation clients keyed by bank.
#[derive(Clone, Default)]
pub struct BankRegistry {
    clients: HashMap<Bank, Arc<dyn BankConfirmation>>,
}

impl BankRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) the client for a bank.
    pub fn register(mut self, bank: Bank, client: Arc<dyn BankConfirmation>) -> Self {
        self.clients.insert(bank, client);
        self
    }

    pub fn get(&self, bank: Bank) -> Option<Arc<dyn BankConfirmation>> {
        self.clients.get(&bank).cloned()
    }

    /// Banks that have a client registered, in no particular order.
    pub fn banks(&self) -> impl Iterator<Item = Bank> + '_ {
        self.clients.keys().copied()
    }
}

impl std::fmt::Debug for BankRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BankRegistry")
            .field("banks", &self.banks().collect::<Vec<_>>())
            .finish()
    }
}
