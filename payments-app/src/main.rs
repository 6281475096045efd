//! # Payments Application
//!
//! Binary that wires together all the components:
//! - Load configuration from environment
//! - Initialize tracing
//! - Build the bank clients and the repository adapter
//! - Create the payment authorizer
//! - Start the HTTP server

mod config;

use tracing_subscriber::{Layer, layer::SubscriberExt, util::SubscriberInitExt};

use payments_hex::{PaymentService, inbound::HttpServer};
use payments_repo::MemoryRepo;
use payments_types::{BankRegistry, PaymentRepository};

use config::{Config, LogFormat, MEMORY_DATABASE_URL};

fn init_tracing(format: LogFormat) {
    let fmt_layer = match format {
        LogFormat::Json => tracing_subscriber::fmt::layer().json().boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer().boxed(),
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,payments_app=debug,payments_hex=debug".into()),
        )
        .with(fmt_layer)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env()?;

    init_tracing(config.log_format);

    tracing::info!("Starting payments server on port {}", config.port);
    tracing::info!(
        big_bank = %config.banks.big_bank_url,
        cashiers = %config.banks.cashiers_url,
        loaners = %config.banks.loaners_url,
        "Bank endpoints"
    );

    let banks = bank_clients::build_registry(&config.banks)?;
    tracing::debug!(banks = ?banks.banks().collect::<Vec<_>>(), "Bank clients registered");

    if config.database_url == MEMORY_DATABASE_URL {
        tracing::warn!("Using in-memory store; balances and ledger are lost on exit");
        return serve(MemoryRepo::new(), banks, config).await;
    }

    tracing::info!("Using database: {}", config.database_url);
    serve_database(banks, config).await
}

#[cfg(any(feature = "postgres", feature = "sqlite"))]
async fn serve_database(banks: BankRegistry, config: Config) -> anyhow::Result<()> {
    // Build repository (handles connection and migration)
    let repo = payments_repo::build_repo(&config.database_url).await?;
    serve(repo, banks, config).await
}

#[cfg(not(any(feature = "postgres", feature = "sqlite")))]
async fn serve_database(_banks: BankRegistry, config: Config) -> anyhow::Result<()> {
    anyhow::bail!(
        "No database backend compiled in; rebuild with `sqlite` or `postgres`, or set DATABASE_URL={} (got {})",
        MEMORY_DATABASE_URL,
        config.database_url
    )
}

async fn serve<R: PaymentRepository>(
    repo: R,
    banks: BankRegistry,
    config: Config,
) -> anyhow::Result<()> {
    for (card, amount) in &config.seed_balances {
        repo.set_balance(card, *amount).await?;
        tracing::info!(card = %card, amount, "Seeded balance");
    }

    // Create the payment authorizer
    let service = PaymentService::with_config(repo, banks, config.authorizer);

    // Create and run the HTTP server
    let server = HttpServer::new(service);
    let addr = format!("0.0.0.0:{}", config.port);

    server.run(&addr).await
}
