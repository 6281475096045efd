//! # Payments Hex
//!
//! Application service layer and HTTP adapter for the payment authorizer.
//!
//! ## Architecture
//!
//! - `service/` - Payment authorizer (orchestrates the ports)
//! - `retry/` - Fixed-delay retry around bank confirmation calls
//! - `inbound/` - HTTP adapter (Axum server)
//!
//! The service is generic over `R: PaymentRepository`, allowing
//! different repository implementations to be injected.

pub mod inbound;
pub mod retry;
pub mod service;


pub use retry::RetryPolicy;
pub use service::{AuthorizerConfig, PaymentService};
