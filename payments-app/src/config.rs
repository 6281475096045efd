//! Configuration loading from environment.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use bank_clients::BankClientConfig;
use payments_hex::{AuthorizerConfig, RetryPolicy};
use payments_types::CardNumber;

/// `DATABASE_URL` value selecting the non-durable in-memory store.
pub const MEMORY_DATABASE_URL: &str = "memory://";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(anyhow::anyhow!("Unknown LOG_FORMAT: {}", other)),
        }
    }
}

/// Application configuration.
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub log_format: LogFormat,
    pub banks: BankClientConfig,
    pub authorizer: AuthorizerConfig,
    /// Balances provisioned at startup (local runs only).
    pub seed_balances: Vec<(CardNumber, i64)>,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        let port = env_or("PORT", 3000u16)?;

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let log_format = env_or("LOG_FORMAT", LogFormat::Pretty)?;

        let defaults = BankClientConfig::default();
        let banks = BankClientConfig {
            big_bank_url: env::var("BIG_BANK_URL").unwrap_or(defaults.big_bank_url),
            cashiers_url: env::var("CASHIERS_URL").unwrap_or(defaults.cashiers_url),
            loaners_url: env::var("LOANERS_URL").unwrap_or(defaults.loaners_url),
            connect_timeout: Duration::from_millis(env_or("BANK_CONNECT_TIMEOUT_MS", 10_000)?),
            request_timeout: Duration::from_millis(env_or("BANK_READ_TIMEOUT_MS", 10_000)?),
        };

        let authorizer = AuthorizerConfig {
            retry: RetryPolicy::new(
                env_or("BANK_RETRY_ATTEMPTS", 3)?,
                Duration::from_millis(env_or("BANK_RETRY_DELAY_MS", 2_000)?),
            ),
            max_processing_time: Duration::from_millis(env_or("MAX_PROCESSING_TIME_MS", 30_000)?),
            ..AuthorizerConfig::default()
        };

        let seed_balances = match env::var("SEED_BALANCES") {
            Ok(raw) => parse_seed_balances(&raw)?,
            Err(_) => Vec::new(),
        };

        Ok(Self {
            port,
            database_url,
            log_format,
            banks,
            authorizer,
            seed_balances,
        })
    }
}

fn env_or<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid {}={:?}: {}", name, raw, e)),
        Err(_) => Ok(default),
    }
}

/// Parses `card=amount,card=amount`. Blank items are skipped.
pub fn parse_seed_balances(raw: &str) -> anyhow::Result<Vec<(CardNumber, i64)>> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| -> anyhow::Result<(CardNumber, i64)> {
            let (card, amount) = item.split_once('=').ok_or_else(|| {
                anyhow::anyhow!("SEED_BALANCES item must be card=amount: {}", item)
            })?;
            let card = CardNumber::new(card)?;
            let amount: i64 = amount
                .trim()
                .parse()
                .map_err(|e| anyhow::anyhow!("Invalid seed amount in {}: {}", item, e))?;
            if amount < 0 {
                anyhow::bail!("Seed amount cannot be negative: {}", item);
            }
            Ok((card, amount))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_seed_balances() {
        let seeds = parse_seed_balances(" 1111=500, 2222=0 ,").unwrap();

        assert_eq!(seeds.len(), 2);
        assert_eq!(seeds[0].0.as_str(), "1111");
        assert_eq!(seeds[0].1, 500);
        assert_eq!(seeds[1].1, 0);
    }

    #[test]
    fn test_parse_seed_balances_rejects_garbage() {
        assert!(parse_seed_balances("1111").is_err());
        assert!(parse_seed_balances("1111=abc").is_err());
        assert!(parse_seed_balances("1111=-5").is_err());
        assert!(parse_seed_balances("=5").is_err());
    }

    #[test]
    fn test_log_format() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("pretty".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert!("xml".parse::<LogFormat>().is_err());
    }
}
