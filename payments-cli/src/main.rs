//! Payments CLI
//!
//! Command-line interface for the payment authorizer API.

use anyhow::Result;
use clap::{Parser, Subcommand};

use payments_client::PaymentsClient;
use payments_types::Bank;

#[derive(Parser)]
#[command(name = "payments")]
#[command(author, version, about = "Payment authorizer CLI client", long_about = None)]
struct Cli {
    /// Base URL of the Payments API
    #[arg(
        long,
        env = "PAYMENTS_API_URL",
        default_value = "http://localhost:3000"
    )]
    api_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Authorize a card payment
    Pay {
        /// Card number to debit
        #[arg(long)]
        card: String,
        /// Bank name or slug (big-bank, cashiers, loaners)
        #[arg(long)]
        bank: String,
        /// Amount in the smallest currency unit
        #[arg(long)]
        amount: i64,
        /// Idempotency key; a random one is generated when omitted
        #[arg(long)]
        idempotency_key: Option<String>,
    },
    /// Ledger lookups
    Transaction {
        #[command(subcommand)]
        action: TransactionCommands,
    },
    /// Check API health
    Health,
}

#[derive(Subcommand)]
enum TransactionCommands {
    /// Show the ledger entry recorded for an idempotency key
    Get {
        /// Idempotency key used for the payment
        idempotency_key: String,
    },
}

/// Resolves a slug to the bank's wire name; unknown names pass through untouched
/// so the server reports them.
fn bank_wire_name(bank: &str) -> String {
    bank.parse::<Bank>()
        .map(|b| b.name().to_string())
        .unwrap_or_else(|_| bank.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let client = PaymentsClient::new(&cli.api_url);

    match cli.command {
        Commands::Health => {
            let healthy = client.health().await?;
            if healthy {
                println!("✓ API is healthy");
            } else {
                println!("✗ API is not healthy");
                std::process::exit(1);
            }
        }
        Commands::Pay {
            card,
            bank,
            amount,
            idempotency_key,
        } => {
            let idempotency_key = match idempotency_key {
                Some(key) => key,
                None => {
                    let key = uuid::Uuid::new_v4().to_string();
                    // stderr, so stdout stays valid JSON
                    eprintln!("Idempotency key: {key} (pass --idempotency-key {key} to retry)");
                    key
                }
            };
            let payment = client
                .pay(&card, &bank_wire_name(&bank), amount, &idempotency_key)
                .await?;
            println!("{}", serde_json::to_string_pretty(&payment)?);
        }
        Commands::Transaction { action } => match action {
            TransactionCommands::Get { idempotency_key } => {
                let tx = client.get_transaction(&idempotency_key).await?;
                println!("{}", serde_json::to_string_pretty(&tx)?);
            }
        },
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_bank_wire_name() {
        assert_eq!(bank_wire_name("big-bank"), "The Big Bank");
        assert_eq!(bank_wire_name("The Cashiers"), "The Cashiers");
        assert_eq!(bank_wire_name("acme"), "acme");
    }

    #[test]
    fn test_parse_pay() {
        let cli = Cli::try_parse_from([
            "payments",
            "pay",
            "--card",
            "4000",
            "--bank",
            "loaners",
            "--amount",
            "150",
        ])
        .unwrap();

        match cli.command {
            Commands::Pay {
                amount,
                idempotency_key,
                ..
            } => {
                assert_eq!(amount, 150);
                assert!(idempotency_key.is_none());
            }
            _ => panic!("expected pay"),
        }
    }
}
