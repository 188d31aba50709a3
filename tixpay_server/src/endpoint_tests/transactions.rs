use std::time::Duration;

use actix_web::http::StatusCode;
use chrono::Utc;
use rust_decimal_macros::dec;
use serde_json::json;
use tixpay_engine::{
    db_types::{Customer, Event, TransactionStatus, Usdt},
    tix_api::transaction_objects::TransactionDetails,
    MonitorConfig,
};
use uuid::Uuid;

use super::helpers::{address_for, fixed_rates, no_monitoring, parse, TestServer};
use crate::data_objects::CreateTransactionResponse;

#[actix_web::test]
async fn create_transaction() {
    let server = TestServer::new(fixed_rates(), no_monitoring()).await;
    let event = server.create_event(10).await;
    server.register_addresses(2).await;

    let (status, body) = server.buy(event.id, 4).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let res: CreateTransactionResponse = parse(&body);
    assert_eq!(res.event_id, event.id);
    assert_eq!(res.quantity, 4);
    // 1,000,000 IDR at 15,000 IDR/USDT plus 1.2%
    assert_eq!(res.settlement_amount, Usdt::from(dec!(67.466667)));
    assert_eq!(res.settlement_currency, "USDT");
    assert_eq!(res.status, TransactionStatus::Pending);
    assert!(res.payment_address.eq_ignore_ascii_case(&address_for(0)));
    assert_eq!(res.tickets.len(), 4);
    assert!(res.tickets.iter().all(|t| t.transaction_id == res.transaction_id));

    let (_, body) = server.get(&format!("/api/v1/events/{}", event.id)).await;
    assert_eq!(parse::<Event>(&body).available_quota, 6);

    let (status, body) = server.get(&format!("/api/v1/customers/{}", res.customer_id)).await;
    assert_eq!(status, StatusCode::OK);
    let customer: Customer = parse(&body);
    assert_eq!(customer.email, "sari@example.com");

    let (status, body) = server.get(&format!("/api/v1/transactions/{}", res.transaction_id)).await;
    assert_eq!(status, StatusCode::OK);
    let details: TransactionDetails = parse(&body);
    assert_eq!(details.transaction.status, TransactionStatus::Pending);
    assert_eq!(details.tickets, res.tickets);
    assert!(details.evidence.is_none());
    server.tear_down().await;
}

#[actix_web::test]
async fn returning_customers_are_reused() {
    let server = TestServer::new(fixed_rates(), no_monitoring()).await;
    let event = server.create_event(10).await;
    server.register_addresses(2).await;
    let (_, first) = server.buy(event.id, 1).await;
    let (_, second) = server.buy(event.id, 1).await;
    let first: CreateTransactionResponse = parse(&first);
    let second: CreateTransactionResponse = parse(&second);
    assert_eq!(first.customer_id, second.customer_id);
    assert_ne!(first.payment_address, second.payment_address);
    server.tear_down().await;
}

#[actix_web::test]
async fn insufficient_quota_is_a_conflict() {
    let server = TestServer::new(fixed_rates(), no_monitoring()).await;
    let event = server.create_event(3).await;
    server.register_addresses(1).await;
    let (status, body) = server.buy(event.id, 4).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body.contains("\"error\""), "{body}");
    server.tear_down().await;
}

#[actix_web::test]
async fn empty_address_pool_is_unavailable() {
    let server = TestServer::new(fixed_rates(), no_monitoring()).await;
    let event = server.create_event(10).await;
    let (status, _) = server.buy(event.id, 2).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    // The reservation was rolled back
    let (_, body) = server.get(&format!("/api/v1/events/{}", event.id)).await;
    assert_eq!(parse::<Event>(&body).available_quota, 10);
    server.tear_down().await;
}

#[actix_web::test]
async fn invalid_purchases_are_rejected() {
    let server = TestServer::new(fixed_rates(), no_monitoring()).await;
    let event = server.create_event(10).await;
    server.register_addresses(1).await;

    let (status, _) = server.buy(event.id, 0).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let bad_email = json!({
        "customer_email": "not-an-email",
        "customer_name": "Sari Dewi",
        "event_id": event.id,
        "quantity": 1,
    });
    let (status, _) = server.post("/api/v1/transactions", &bad_email).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let no_name = json!({
        "customer_email": "sari@example.com",
        "customer_name": "",
        "event_id": event.id,
        "quantity": 1,
    });
    let (status, _) = server.post("/api/v1/transactions", &no_name).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = server.buy(Uuid::new_v4(), 1).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = server.get(&format!("/api/v1/transactions/{}", Uuid::new_v4())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    server.tear_down().await;
}

#[actix_web::test]
async fn released_quota_is_clamped() {
    let server = TestServer::new(fixed_rates(), no_monitoring()).await;
    let event = server.create_event(10).await;
    server.register_addresses(1).await;
    let (status, _) = server.buy(event.id, 4).await;
    assert_eq!(status, StatusCode::CREATED);

    let path = format!("/api/v1/events/{}/release", event.id);
    let (status, body) = server.post(&path, &json!({ "quantity": 2 })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse::<Event>(&body).available_quota, 8);
    let (_, body) = server.post(&path, &json!({ "quantity": 10 })).await;
    assert_eq!(parse::<Event>(&body).available_quota, 10);

    let (status, _) = server.post(&path, &json!({ "quantity": 0 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    server.tear_down().await;
}

#[actix_web::test]
async fn new_transactions_are_monitored() {
    let monitor = MonitorConfig { poll_interval: Duration::from_secs(10), deadline: Duration::from_secs(1800) };
    let server = TestServer::new(fixed_rates(), monitor).await;
    let event = server.create_event(10).await;
    server.register_addresses(1).await;
    let (_, body) = server.buy(event.id, 1).await;
    let res: CreateTransactionResponse = parse(&body);
    let remaining = (res.payment_deadline - Utc::now()).num_seconds();
    assert!((1790..=1800).contains(&remaining), "{remaining}s left to pay");

    // The monitor is started by the event hook, so give it a moment
    let mut watching = false;
    for _ in 0..50 {
        if server.services.monitor.is_watching(&res.transaction_id) {
            watching = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(watching);
    server.tear_down().await;
}
