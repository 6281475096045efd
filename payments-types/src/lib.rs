//! # Payments Types
//!
//! Domain types and port traits for the card payment authorizer.
//! This crate has ZERO external IO dependencies - only data structures,
//! business rules, and trait definitions.
//!
//! ## Architecture
//!
//! This crate represents the **innermost core** of the hexagonal architecture:
//! - `domain/` - Pure domain types (CardNumber, Bank, LedgerEntry, RoutingDecision)
//! - `ports/` - Trait definitions that adapters must implement
//! - `dto/` - Data Transfer Objects for API boundaries
//! - `error/` - Payment, repository and bank error types

pub mod domain;
pub mod dto;
pub mod error;
pub mod ports;

// Re-export commonly used types
pub use domain::{
    Authorization, Bank, CardNumber, ConfirmationOutcome, LedgerEntry, PaymentRequest,
    RoutingDecision, SizeClass, TransactionId,
};
pub use dto::*;
pub use error::{BankError, PaymentError, RepoError};
pub use ports::{BankConfirmation, BankRegistry, PaymentRepository};
