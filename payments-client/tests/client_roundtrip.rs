//! Client SDK against a live in-process server.

use payments_client::{ClientError, PaymentsClient};
use payments_hex::{PaymentService, inbound::HttpServer};
use payments_repo::MemoryRepo;
use payments_types::{Bank, BankRegistry, CardNumber, SizeClass};
use tokio::net::TcpListener;

const CARD: &str = "4000123412341234";

async fn start_server(balance: i64) -> String {
    let repo = MemoryRepo::with_balances([(CardNumber::new(CARD).unwrap(), balance)]);
    let router = HttpServer::new(PaymentService::new(repo, BankRegistry::new())).router();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn test_pay_and_lookup() {
    let client = PaymentsClient::new(start_server(1000).await);

    assert!(client.health().await.unwrap());

    let payment = client
        .pay(CARD, "The Big Bank", 120, "order-42")
        .await
        .unwrap();
    assert_eq!(payment.current_account_balance, 880);
    assert_eq!(payment.bank, Bank::BigBank);
    assert_eq!(payment.size_class, SizeClass::Small);

    let tx = client.get_transaction("order-42").await.unwrap();
    assert_eq!(tx.id, payment.transaction_id);
    assert_eq!(tx.amount, 120);
    assert_eq!(tx.card_number, CARD);
}

#[tokio::test]
async fn test_replay_is_rejected() {
    let client = PaymentsClient::new(start_server(1000).await);

    client.pay(CARD, "Loaners", 50, "order-1").await.unwrap();
    let err = client.pay(CARD, "Loaners", 50, "order-1").await.unwrap_err();

    assert_eq!(err.status(), Some(409));
    assert!(err.to_string().contains("DUPLICATE_REQUEST"));
}

#[tokio::test]
async fn test_key_with_reserved_characters() {
    let client = PaymentsClient::new(start_server(1000).await);

    client
        .pay(CARD, "The Cashiers", 10, "order/7 #a")
        .await
        .unwrap();

    let tx = client.get_transaction("order/7 #a").await.unwrap();
    assert_eq!(tx.idempotency_key, "order/7 #a");
}

#[tokio::test]
async fn test_missing_transaction() {
    let client = PaymentsClient::new(start_server(1000).await);

    let err = client.get_transaction("nope").await.unwrap_err();

    assert!(matches!(err, ClientError::Api { status: 404, .. }));
}
