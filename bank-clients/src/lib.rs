//! # Bank Clients
//!
//! Outbound adapters implementing the [`BankConfirmation`] port, one per bank.
//! Every bank has its own wire contract:
//!
//! - `big_bank` - `GET /check/{amount}`, JSON `{"successful": bool}`
//! - `cashiers` - `GET /payment/{card}?amount=..`, approval by status class
//! - `loaners` - `POST /payment/check`, JSON response code + status label
//!
//! Transport failures and 5xx map to [`BankError::Unavailable`] so the
//! authorizer can retry them; other non-2xx statuses and anything unparseable
//! map to [`BankError::Protocol`].

mod big_bank;
mod cashiers;
mod loaners;

use std::sync::Arc;
use std::time::Duration;

use payments_types::{Bank, BankError, BankRegistry};

pub use big_bank::BigBankClient;
pub use cashiers::CashiersClient;
pub use loaners::LoanersClient;

/// Endpoints and timeouts for the bank clients.
#[derive(Debug, Clone)]
pub struct BankClientConfig {
    pub big_bank_url: String,
    pub cashiers_url: String,
    pub loaners_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for BankClientConfig {
    fn default() -> Self {
        Self {
            big_bank_url: "http://fake.bigbank.no".into(),
            cashiers_url: "http://fake.cashiers.no".into(),
            loaners_url: "http://fake.loaners.no".into(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// Builds the shared HTTP client with the configured timeouts.
pub fn build_http_client(config: &BankClientConfig) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .connect_timeout(config.connect_timeout)
        .timeout(config.request_timeout)
        .build()
}

/// Builds a registry with a client for every supported bank.
pub fn build_registry(config: &BankClientConfig) -> Result<BankRegistry, reqwest::Error> {
    let http = build_http_client(config)?;

    let registry = BankRegistry::new()
        .register(
            Bank::BigBank,
            Arc::new(BigBankClient::new(http.clone(), &config.big_bank_url)),
        )
        .register(
            Bank::Cashiers,
            Arc::new(CashiersClient::new(http.clone(), &config.cashiers_url)),
        )
        .register(
            Bank::Loaners,
            Arc::new(LoanersClient::new(http, &config.loaners_url)),
        );

    Ok(registry)
}

fn normalize_base_url(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}

/// Maps a reqwest failure to the bank error taxonomy.
///
/// Body decoding problems are protocol errors; everything else (timeouts,
/// refused connections, broken transfers) is the bank being unavailable.
fn map_transport_error(bank: Bank, err: reqwest::Error) -> BankError {
    if err.is_decode() {
        BankError::Protocol {
            bank,
            message: err.to_string(),
        }
    } else {
        BankError::Unavailable {
            bank,
            message: err.to_string(),
        }
    }
}

/// Maps a non-2xx status for the JSON protocols: 5xx is retryable, anything
/// else is a protocol error whose body is never trusted.
fn status_error(bank: Bank, status: reqwest::StatusCode) -> BankError {
    if status.is_server_error() {
        BankError::Unavailable {
            bank,
            message: format!("HTTP {}", status),
        }
    } else {
        BankError::Protocol {
            bank,
            message: format!("unexpected HTTP {}", status),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_has_every_bank() {
        let registry = build_registry(&BankClientConfig::default()).unwrap();
        for bank in Bank::ALL {
            assert!(registry.get(bank).is_some(), "missing client for {}", bank);
        }
        assert_eq!(registry.banks().count(), Bank::ALL.len());
    }

    #[test]
    fn test_normalize_base_url() {
        assert_eq!(
            normalize_base_url("http://fake.bigbank.no/"),
            "http://fake.bigbank.no"
        );
    }
}
