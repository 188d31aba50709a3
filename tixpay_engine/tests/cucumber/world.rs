use std::{collections::HashMap, fmt::Debug, sync::Arc, sync::Mutex};

use async_trait::async_trait;
use chrono::Duration;
use cucumber::World;
use log::*;
use rust_decimal_macros::dec;
use tixpay_engine::{
    chain::BlockchainReader,
    db_types::{Event, FiatAmount, Transaction},
    events::EventProducers,
    rates::{RateError, RateSource},
    test_utils::{
        fake_chain::FakeChain,
        prepare_env::{create_database, random_db_path, run_migrations},
    },
    transaction_objects::PaymentCheckOutcome,
    RateApi,
    RateConfig,
    SettlementApi,
    SettlementConfig,
    SqliteDatabase,
    TicketingError,
    TransactionFlowApi,
};

#[derive(Default, Debug, World)]
pub struct TicketingWorld {
    pub system: Option<TicketingSystem>,
}

/// A rate source whose answer the scenario controls. `None` simulates an outage.
#[derive(Default)]
pub struct ScriptedRates {
    rate: Mutex<Option<FiatAmount>>,
}

impl ScriptedRates {
    pub fn set(&self, rate: Option<FiatAmount>) {
        *self.rate.lock().unwrap() = rate;
    }
}

#[async_trait]
impl RateSource for ScriptedRates {
    async fn fetch_rate(&self, _currency: &str) -> Result<FiatAmount, RateError> {
        self.rate.lock().unwrap().ok_or_else(|| RateError::Unavailable("rate service is down".into()))
    }
}

pub struct TicketingSystem {
    pub db_path: String,
    pub db: SqliteDatabase,
    pub chain: Arc<FakeChain>,
    pub rates: Arc<ScriptedRates>,
    pub events: HashMap<String, Event>,
    pub transaction: Option<Transaction>,
    pub last_error: Option<TicketingError>,
    pub last_check: Option<PaymentCheckOutcome>,
}

impl Debug for TicketingSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TicketingSystem({})", self.db_path)
    }
}

impl TicketingWorld {
    pub fn system(&self) -> &TicketingSystem {
        self.system.as_ref().expect("Ticketing system not initialised")
    }

    pub fn system_mut(&mut self) -> &mut TicketingSystem {
        self.system.as_mut().expect("Ticketing system not initialised")
    }
}

impl TicketingSystem {
    pub async fn new() -> Self {
        let db_path = random_db_path();
        create_database(&db_path).await;
        run_migrations(&db_path).await;
        let db = SqliteDatabase::new_with_url(&db_path, 5).await.expect("Error creating connection to database");
        debug!("🚀️ Created database: {db_path}");
        let rates = Arc::new(ScriptedRates::default());
        rates.set(Some(FiatAmount::from(dec!(15000))));
        Self {
            db_path,
            db,
            chain: Arc::new(FakeChain::new(0)),
            rates,
            events: HashMap::new(),
            transaction: None,
            last_error: None,
            last_check: None,
        }
    }

    pub fn flow_api(&self) -> TransactionFlowApi<SqliteDatabase> {
        let config = RateConfig { freshness: Duration::zero(), ..Default::default() };
        let rates = RateApi::new(self.db.clone(), self.rates.clone(), config);
        TransactionFlowApi::new(self.db.clone(), rates, dec!(1.2), EventProducers::default())
    }

    pub fn settlement_api(&self) -> SettlementApi<SqliteDatabase> {
        let config = SettlementConfig { scan_delay: std::time::Duration::ZERO, ..Default::default() };
        let chain = self.chain.clone() as Arc<dyn BlockchainReader>;
        SettlementApi::new(self.db.clone(), chain, config, EventProducers::default())
    }

    pub fn event(&self, name: &str) -> &Event {
        self.events.get(name).unwrap_or_else(|| panic!("No event called '{name}'"))
    }

    pub fn transaction(&self) -> &Transaction {
        self.transaction.as_ref().expect("No transaction has been created")
    }
}
