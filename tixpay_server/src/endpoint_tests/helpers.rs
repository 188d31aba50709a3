use std::{sync::Arc, time::Duration};

use actix_web::{http::StatusCode, test, test::TestRequest, App};
use log::*;
use rust_decimal_macros::dec;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::json;
use tixpay_engine::{
    db_types::{Event, FiatAmount},
    rates::RateError,
    test_utils::{
        fake_chain::FakeChain,
        prepare_env::{drop_database, prepare_test_env, random_db_path},
    },
    MonitorConfig,
    SettlementConfig,
    SqliteDatabase,
    TicketingDatabase,
};
use uuid::Uuid;

use super::mocks::MockRates;
use crate::{config::ServerConfig, server::TicketingServices};

pub const CHAIN_HEAD: u64 = 100;

/// A rate source that always quotes 15,000 IDR per USDT.
pub fn fixed_rates() -> MockRates {
    let mut rates = MockRates::new();
    rates.expect_fetch_rate().returning(|_| Ok(FiatAmount::from(dec!(15000))));
    rates
}

pub fn failing_rates() -> MockRates {
    let mut rates = MockRates::new();
    rates.expect_fetch_rate().returning(|_| Err(RateError::Unavailable("connection refused".into())));
    rates
}

/// Monitoring settings under which no background monitor is ever started, so tests control every scan.
pub fn no_monitoring() -> MonitorConfig {
    MonitorConfig { poll_interval: Duration::from_secs(10), deadline: Duration::ZERO }
}

/// The payment address registered by [`TestServer::register_addresses`] at position `i`.
pub fn address_for(i: u8) -> String {
    format!("0x{}", format!("{:02x}", 0xa0 + i).repeat(20))
}

pub fn tx_hash(i: u8) -> String {
    format!("0x{}", format!("{i:02x}").repeat(32))
}

pub struct TestServer {
    pub services: TicketingServices,
    pub db: SqliteDatabase,
    pub chain: Arc<FakeChain>,
}

impl TestServer {
    pub async fn new(rates: MockRates, monitor: MonitorConfig) -> Self {
        let url = random_db_path();
        prepare_test_env(&url).await;
        let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database");
        let chain = Arc::new(FakeChain::new(CHAIN_HEAD));
        let config = ServerConfig {
            monitor,
            settlement: SettlementConfig { scan_delay: Duration::ZERO, ..Default::default() },
            ..Default::default()
        };
        let services = TicketingServices::new(&config, db.clone(), chain.clone(), Arc::new(rates)).await;
        Self { services, db, chain }
    }

    pub async fn get(&self, path: &str) -> (StatusCode, String) {
        self.call(TestRequest::get().uri(path)).await
    }

    pub async fn post<T: Serialize>(&self, path: &str, body: &T) -> (StatusCode, String) {
        self.call(TestRequest::post().uri(path).set_json(body)).await
    }

    async fn call(&self, req: TestRequest) -> (StatusCode, String) {
        let app = test::init_service(App::new().configure(|cfg| self.services.configure(cfg))).await;
        let res = test::call_service(&app, req.to_request()).await;
        let status = res.status();
        let body = test::read_body(res).await;
        let body = String::from_utf8_lossy(&body).into_owned();
        debug!("🚀️ Response {status}: {body}");
        (status, body)
    }

    /// An event priced at 250,000 IDR per ticket.
    pub async fn create_event(&self, quota: i64) -> Event {
        let body = json!({
            "name": "Java Jazz Night",
            "location": "Jakarta",
            "schedule": "2030-08-17T19:00:00Z",
            "price": "250000",
            "quota": quota,
        });
        let (status, body) = self.post("/api/v1/events", &body).await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        parse(&body)
    }

    pub async fn register_addresses(&self, count: u8) {
        for i in 0..count {
            let body = json!({ "address": address_for(i), "secret": format!("key-{i}") });
            let (status, body) = self.post("/api/v1/payment-addresses", &body).await;
            assert_eq!(status, StatusCode::CREATED, "{body}");
        }
    }

    pub async fn buy(&self, event_id: Uuid, quantity: i64) -> (StatusCode, String) {
        let body = json!({
            "customer_email": "Sari@Example.com",
            "customer_name": "Sari Dewi",
            "customer_phone": "+6281234567",
            "event_id": event_id,
            "quantity": quantity,
        });
        self.post("/api/v1/transactions", &body).await
    }

    pub async fn tear_down(self) {
        self.services.monitor.stop_all();
        let mut db = self.db;
        let url = db.url().to_string();
        if let Err(e) = db.close().await {
            error!("🚀️ Failed to close database: {e}");
        }
        drop_database(&url).await;
    }
}

pub fn parse<T: DeserializeOwned>(body: &str) -> T {
    serde_json::from_str(body).unwrap_or_else(|e| panic!("Could not parse {body}: {e}"))
}
