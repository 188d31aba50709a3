#![allow(dead_code)]

use std::sync::Arc;

use alloy_primitives::{Address, B256};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use log::*;
use mockall::mock;
use rust_decimal_macros::dec;
use sqlx::{migrate::MigrateDatabase, Sqlite};
use tixpay_common::Secret;
use tixpay_engine::{
    db_types::{Event, FiatAmount, NewCustomer, NewEvent},
    events::EventProducers,
    rates::{RateError, RateSource},
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    AddressPool,
    CatalogManagement,
    RateApi,
    RateConfig,
    SqliteDatabase,
    TicketingDatabase,
    TransactionFlowApi,
};

mock! {
    pub Rates {}
    #[async_trait]
    impl RateSource for Rates {
        async fn fetch_rate(&self, currency: &str) -> Result<FiatAmount, RateError>;
    }
}

/// A rate source that always quotes 15,000 IDR per USDT.
pub fn fixed_rates() -> Arc<dyn RateSource> {
    let mut rates = MockRates::new();
    rates.expect_fetch_rate().returning(|_| Ok(FiatAmount::from(dec!(15000))));
    Arc::new(rates)
}

pub async fn setup_db() -> SqliteDatabase {
    let url = random_db_path();
    prepare_test_env(&url).await;
    SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database")
}

pub async fn tear_down(mut db: SqliteDatabase) {
    let url = db.url().to_string();
    if let Err(e) = db.close().await {
        error!("🚀️ Failed to close database: {e}");
    }
    Sqlite::drop_database(&url).await.unwrap();
}

pub fn flow_api(db: &SqliteDatabase, producers: EventProducers) -> TransactionFlowApi<SqliteDatabase> {
    let rates = RateApi::new(db.clone(), fixed_rates(), RateConfig::default());
    TransactionFlowApi::new(db.clone(), rates, dec!(1.2), producers)
}

/// An event priced at 250,000 IDR per ticket.
pub async fn seed_event(db: &SqliteDatabase, quota: i64) -> Event {
    let event = NewEvent {
        name: "Java Jazz Night".into(),
        description: "An evening of jazz".into(),
        location: "Jakarta".into(),
        schedule: Utc::now() + Duration::days(30),
        price: FiatAmount::from(dec!(250000)),
        quota,
    };
    db.create_event(event).await.unwrap()
}

pub fn address_for(i: u8) -> Address {
    Address::repeat_byte(0xa0 + i)
}

pub async fn seed_addresses(db: &SqliteDatabase, count: u8) -> Vec<Address> {
    let mut result = Vec::new();
    for i in 0..count {
        let address = address_for(i);
        let new_address =
            tixpay_engine::db_types::NewPaymentAddress::new(address.to_checksum(None), Secret::new(format!("key-{i}")));
        db.register_address(new_address).await.unwrap();
        result.push(address);
    }
    result
}

pub async fn seed_customer(db: &SqliteDatabase, email: &str) -> tixpay_engine::db_types::Customer {
    let customer = NewCustomer { email: email.into(), name: "Sari Dewi".into(), phone: Some("+6281234567".into()) };
    db.fetch_or_create_customer(customer).await.unwrap()
}

/// The number of payment evidence rows recorded for a transaction.
pub async fn evidence_rows(db: &SqliteDatabase, transaction_id: &uuid::Uuid) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM blockchain_transactions WHERE transaction_id = $1")
        .bind(transaction_id)
        .fetch_one(db.pool())
        .await
        .unwrap()
}

pub fn tx_hash(i: u8) -> B256 {
    B256::repeat_byte(i)
}
