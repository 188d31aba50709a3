use actix_web::http::StatusCode;
use rust_decimal_macros::dec;
use serde_json::json;
use tixpay_engine::{
    chain::{Address, B256},
    db_types::{TransactionStatus, Usdt},
    tix_api::transaction_objects::{PaymentCheckOutcome, TransactionDetails},
    ConfirmedPayment,
};
use uuid::Uuid;

use super::helpers::{fixed_rates, no_monitoring, parse, tx_hash, TestServer, CHAIN_HEAD};
use crate::data_objects::CreateTransactionResponse;

async fn pending_transaction(server: &TestServer) -> CreateTransactionResponse {
    let event = server.create_event(10).await;
    server.register_addresses(1).await;
    let (status, body) = server.buy(event.id, 4).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    parse(&body)
}

#[actix_web::test]
async fn manual_confirmation() {
    let server = TestServer::new(fixed_rates(), no_monitoring()).await;
    let tx = pending_transaction(&server).await;
    let path = format!("/api/v1/transactions/{}/confirm", tx.transaction_id);

    let hash = tx_hash(0xab).to_uppercase().replacen("0X", "0x", 1);
    let (status, body) = server.post(&path, &json!({ "tx_hash": hash })).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let confirmed: ConfirmedPayment = parse(&body);
    assert_eq!(confirmed.transaction.status, TransactionStatus::Paid);
    assert!(confirmed.transaction.confirmed_at.is_some());
    assert_eq!(confirmed.evidence.tx_hash, tx_hash(0xab));
    assert_eq!(confirmed.evidence.amount, tx.settlement_amount);

    // Confirming twice is rejected, whatever the evidence
    let (status, _) = server.post(&path, &json!({ "tx_hash": tx_hash(0xcd), "amount": "67.47" })).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, body) = server.get(&format!("/api/v1/transactions/{}", tx.transaction_id)).await;
    let details: TransactionDetails = parse(&body);
    assert_eq!(details.evidence.map(|e| e.tx_hash), Some(tx_hash(0xab)));
    server.tear_down().await;
}

#[actix_web::test]
async fn manual_confirmation_validates_the_hash() {
    let server = TestServer::new(fixed_rates(), no_monitoring()).await;
    let tx = pending_transaction(&server).await;
    let path = format!("/api/v1/transactions/{}/confirm", tx.transaction_id);
    let (status, _) = server.post(&path, &json!({ "tx_hash": "0xabc" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let path = format!("/api/v1/transactions/{}/confirm", Uuid::new_v4());
    let (status, _) = server.post(&path, &json!({ "tx_hash": tx_hash(1) })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    server.tear_down().await;
}

#[actix_web::test]
async fn check_finds_the_transfer() {
    let server = TestServer::new(fixed_rates(), no_monitoring()).await;
    let tx = pending_transaction(&server).await;
    let token = server.services.settlement.config().token_contract;
    let recipient: Address = tx.payment_address.parse().unwrap();
    // 67.466667 USDT at 6 decimals
    server.chain.add_transfer(CHAIN_HEAD - 5, B256::repeat_byte(7), token, recipient, 67_466_667);

    let path = format!("/api/v1/transactions/{}/check", tx.transaction_id);
    let (status, body) = server.post(&path, &json!({})).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    match parse::<PaymentCheckOutcome>(&body) {
        PaymentCheckOutcome::Confirmed { payment } => {
            assert_eq!(payment.transaction.status, TransactionStatus::Paid);
            assert_eq!(payment.evidence.tx_hash, format!("{:#x}", B256::repeat_byte(7)));
            assert_eq!(payment.evidence.amount, Usdt::from(dec!(67.466667)));
        },
        other => panic!("Expected a confirmation, got {other:?}"),
    }

    let (_, body) = server.post(&path, &json!({})).await;
    assert!(matches!(parse::<PaymentCheckOutcome>(&body), PaymentCheckOutcome::AlreadyPaid { .. }));
    server.tear_down().await;
}

#[actix_web::test]
async fn check_reports_missing_payments() {
    let server = TestServer::new(fixed_rates(), no_monitoring()).await;
    let tx = pending_transaction(&server).await;
    let token = server.services.settlement.config().token_contract;
    let recipient: Address = tx.payment_address.parse().unwrap();
    // Too little, and outside the tolerance
    server.chain.add_transfer(CHAIN_HEAD, B256::repeat_byte(8), token, recipient, 67_000_000);

    let path = format!("/api/v1/transactions/{}/check", tx.transaction_id);
    let (status, body) = server.post(&path, &json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse::<PaymentCheckOutcome>(&body), PaymentCheckOutcome::NotFound {
        from_block: CHAIN_HEAD - 19,
        to_block: CHAIN_HEAD
    });

    server.chain.set_head_unavailable(true);
    let (status, body) = server.post(&path, &json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert!(matches!(parse::<PaymentCheckOutcome>(&body), PaymentCheckOutcome::ChainUnavailable { .. }));

    let (_, body) = server.get(&format!("/api/v1/transactions/{}", tx.transaction_id)).await;
    assert_eq!(parse::<TransactionDetails>(&body).transaction.status, TransactionStatus::Pending);

    let (status, _) = server.post(&format!("/api/v1/transactions/{}/check", Uuid::new_v4()), &json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    server.tear_down().await;
}
