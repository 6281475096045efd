//! Domain models for the payment authorizer.

pub mod bank;
pub mod card;
pub mod confirmation;
pub mod transaction;

pub use bank::{Bank, RoutingDecision, SizeClass};
pub use card::CardNumber;
pub use confirmation::ConfirmationOutcome;
pub use transaction::{Authorization, LedgerEntry, PaymentRequest, TransactionId};
