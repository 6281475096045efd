//! Client example demonstrating the payment flow against a running server.
//!
//! Run with: cargo run -p payments-app --example client_example --features sqlite
//!
//! Only small payments are made, so no bank is contacted.

use payments_client::PaymentsClient;
use payments_hex::{PaymentService, inbound::HttpServer};
use payments_repo::build_repo;
use payments_types::{BankRegistry, CardNumber, PaymentRepository};
use std::net::SocketAddr;
use tempfile::tempdir;
use tokio::net::TcpListener;

const CARD: &str = "4000123412341234";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt().with_env_filter("info").init();

    // Find an available port
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr: SocketAddr = listener.local_addr()?;
    let port = addr.port();
    drop(listener);

    // Use a temp file-backed SQLite DB
    let tmp = tempdir()?;
    let db_path = tmp.path().join("payments.db");
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());

    println!("🚀 Starting server on port {port}...");
    println!("   Database: {db_url}");

    // Build repository (handles connection and migration) and provision a card
    let repo = build_repo(&db_url).await?;
    repo.set_balance(&CardNumber::new(CARD)?, 500).await?;

    // Start server in background
    let service = PaymentService::new(repo, BankRegistry::new());
    let server = HttpServer::new(service);
    let router = server.router();

    let server_listener = TcpListener::bind(format!("127.0.0.1:{port}")).await?;
    tokio::spawn(async move {
        if let Err(e) = axum::serve(server_listener, router.into_make_service()).await {
            eprintln!("server error: {e}");
        }
    });

    // Create client
    let base_url = format!("http://127.0.0.1:{port}");
    let client = PaymentsClient::new(&base_url);

    // ─────────────────────────────────────────────────────────────────────────
    // Demo: payment flow
    // ─────────────────────────────────────────────────────────────────────────

    // Health check
    let health = client.health().await?;
    println!("✅ Server health: {health}");

    // Small payment, no bank confirmation needed
    let paid = client.pay(CARD, "The Big Bank", 150, "order-1").await?;
    println!(
        "✅ Paid {} via {} ({}), balance now {}",
        paid.amount, paid.bank, paid.size_class, paid.current_account_balance
    );

    // Replay with the same key is refused
    let replay = client.pay(CARD, "The Big Bank", 150, "order-1").await;
    match replay {
        Err(e) => println!("✅ Replay refused: {e}"),
        Ok(_) => anyhow::bail!("replay should have been refused"),
    }

    // More than the card holds
    let too_much = client.pay(CARD, "Loaners", 400, "order-2").await;
    match too_much {
        Err(e) => println!("✅ Overdraft refused: {e}"),
        Ok(_) => anyhow::bail!("overdraft should have been refused"),
    }

    // Ledger lookup
    let tx = client.get_transaction("order-1").await?;
    println!(
        "📋 Ledger entry {}: {} {} at {}",
        tx.id, tx.amount, tx.size_class, tx.created_at
    );

    println!("\n🎉 Example completed successfully!");

    Ok(())
}
