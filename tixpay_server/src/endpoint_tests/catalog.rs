use actix_web::http::StatusCode;
use serde_json::json;
use tixpay_engine::{
    db_types::{Event, FiatAmount, RateOrigin},
    RateQuote,
};
use uuid::Uuid;

use super::helpers::{address_for, failing_rates, fixed_rates, no_monitoring, parse, TestServer};
use crate::data_objects::AddressPoolStatus;

#[actix_web::test]
async fn health_check() {
    let server = TestServer::new(fixed_rates(), no_monitoring()).await;
    let (status, body) = server.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "👍️\n");
    server.tear_down().await;
}

#[actix_web::test]
async fn create_and_fetch_events() {
    let server = TestServer::new(fixed_rates(), no_monitoring()).await;
    let event = server.create_event(10).await;
    assert_eq!(event.quota, 10);
    assert_eq!(event.available_quota, 10);

    let (status, body) = server.get(&format!("/api/v1/events/{}", event.id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse::<Event>(&body), event);

    server.create_event(5).await;
    let (status, body) = server.get("/api/v1/events?limit=10").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse::<Vec<Event>>(&body).len(), 2);
    let (_, body) = server.get("/api/v1/events?limit=1&offset=1").await;
    assert_eq!(parse::<Vec<Event>>(&body).len(), 1);
    server.tear_down().await;
}

#[actix_web::test]
async fn invalid_events_are_rejected() {
    let server = TestServer::new(fixed_rates(), no_monitoring()).await;
    let free = json!({ "name": "Free gig", "schedule": "2030-08-17T19:00:00Z", "price": "0", "quota": 10 });
    let (status, body) = server.post("/api/v1/events", &free).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("\"error\""), "{body}");

    let nameless = json!({ "name": "  ", "schedule": "2030-08-17T19:00:00Z", "price": "1000", "quota": 10 });
    let (status, _) = server.post("/api/v1/events", &nameless).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let priceless = json!({ "name": "Gala", "schedule": "2030-08-17T19:00:00Z", "price": "1000000000001", "quota": 10 });
    let (status, _) = server.post("/api/v1/events", &priceless).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    server.tear_down().await;
}

#[actix_web::test]
async fn unknown_records_are_not_found() {
    let server = TestServer::new(fixed_rates(), no_monitoring()).await;
    let (status, _) = server.get(&format!("/api/v1/events/{}", Uuid::new_v4())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = server.get(&format!("/api/v1/customers/{}", Uuid::new_v4())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = server.get("/api/v1/events/not-a-uuid").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    server.tear_down().await;
}

#[actix_web::test]
async fn register_payment_addresses() {
    let server = TestServer::new(fixed_rates(), no_monitoring()).await;
    let body = json!({ "address": address_for(0), "secret": "key-0" });
    let (status, res) = server.post("/api/v1/payment-addresses", &body).await;
    assert_eq!(status, StatusCode::CREATED);
    let pool: AddressPoolStatus = parse(&res);
    assert_eq!(pool.unused_addresses, 1);
    assert!(pool.address.eq_ignore_ascii_case(&address_for(0)));
    assert!(!res.contains("key-0"), "The secret must never be returned");

    let (status, _) = server.post("/api/v1/payment-addresses", &body).await;
    assert_eq!(status, StatusCode::CONFLICT);
    // The same account spelled in upper case
    let shouting = json!({ "address": address_for(0).to_uppercase().replacen("0X", "0x", 1), "secret": "key-1" });
    let (status, _) = server.post("/api/v1/payment-addresses", &shouting).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let bad = json!({ "address": "0x1234", "secret": "key" });
    let (status, _) = server.post("/api/v1/payment-addresses", &bad).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    server.tear_down().await;
}

#[actix_web::test]
async fn current_rate_is_live_then_cached() {
    let server = TestServer::new(fixed_rates(), no_monitoring()).await;
    let (status, body) = server.get("/api/v1/rates/current").await;
    assert_eq!(status, StatusCode::OK);
    let quote: RateQuote = parse(&body);
    assert_eq!(quote.currency, "IDR");
    assert_eq!(quote.rate, FiatAmount::from(rust_decimal_macros::dec!(15000)));
    assert_eq!(quote.origin, RateOrigin::Live);

    let (_, body) = server.get("/api/v1/rates/current").await;
    assert_eq!(parse::<RateQuote>(&body).origin, RateOrigin::Cached);
    server.tear_down().await;
}

#[actix_web::test]
async fn current_rate_falls_back_when_the_source_fails() {
    let server = TestServer::new(failing_rates(), no_monitoring()).await;
    let (status, body) = server.get("/api/v1/rates/current").await;
    assert_eq!(status, StatusCode::OK);
    let quote: RateQuote = parse(&body);
    assert!(quote.is_fallback());
    assert_eq!(quote.rate, FiatAmount::from(rust_decimal_macros::dec!(15420.50)));
    server.tear_down().await;
}
