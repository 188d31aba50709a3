use std::{sync::Arc, time::Duration};

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::*;
use tixpay_engine::{
    chain::{BlockchainReader, JsonRpcChain},
    events::{EventHandlers, EventHooks, EventProducers},
    rates::{HttpRateSource, RateSource},
    CatalogApi,
    MonitorConfig,
    PaymentMonitor,
    RateApi,
    SettlementApi,
    SqliteDatabase,
    TransactionFlowApi,
};

use crate::{
    config::{ServerConfig, UPSTREAM_TIMEOUT},
    errors::ServerError,
    routes::{
        health,
        CheckPaymentRoute,
        ConfirmPaymentRoute,
        CreateEventRoute,
        CreateTransactionRoute,
        CurrentRateRoute,
        CustomerByIdRoute,
        EventByIdRoute,
        ListEventsRoute,
        RegisterAddressRoute,
        ReleaseQuotaRoute,
        TransactionByIdRoute,
    },
};

const EVENT_BUFFER_SIZE: usize = 25;

/// The engine APIs shared by every server worker.
#[derive(Clone)]
pub struct TicketingServices {
    pub flow: web::Data<TransactionFlowApi<SqliteDatabase>>,
    pub settlement: web::Data<SettlementApi<SqliteDatabase>>,
    pub catalog: web::Data<CatalogApi<SqliteDatabase>>,
    pub rates: web::Data<RateApi<SqliteDatabase>>,
    pub monitor_config: web::Data<MonitorConfig>,
    pub monitor: PaymentMonitor,
}

impl TicketingServices {
    /// Wires the engine together and starts the event handlers.
    ///
    /// Every created transaction is handed to the payment monitor, and every confirmed payment is logged. The
    /// settlement engine publishes confirmations, and the monitor drives the settlement engine, so the two sets of
    /// hooks are built in two stages.
    pub async fn new(
        config: &ServerConfig,
        db: SqliteDatabase,
        chain: Arc<dyn BlockchainReader>,
        rate_source: Arc<dyn RateSource>,
    ) -> Self {
        let mut confirmed_hooks = EventHooks::default();
        confirmed_hooks.on_payment_confirmed(|ev| {
            Box::pin(async move {
                info!(
                    "📬️ Transaction {} was paid with {} ({})",
                    ev.transaction.id, ev.evidence.tx_hash, ev.evidence.amount
                );
            })
        });
        let confirmed_handlers = EventHandlers::new(EVENT_BUFFER_SIZE, confirmed_hooks);
        let confirmed_producers = confirmed_handlers.producers();

        let settlement =
            Arc::new(SettlementApi::new(db.clone(), chain, config.settlement.clone(), confirmed_producers.clone()));
        let monitor = PaymentMonitor::new(Arc::clone(&settlement), config.monitor);

        let mut created_hooks = EventHooks::default();
        let watcher = monitor.clone();
        created_hooks.on_transaction_created(move |ev| {
            let watcher = watcher.clone();
            Box::pin(async move {
                if watcher.watch(&ev.transaction) {
                    debug!("📬️ Payment monitor started for transaction {}", ev.transaction.id);
                }
            })
        });
        let created_handlers = EventHandlers::new(EVENT_BUFFER_SIZE, created_hooks);
        let producers = EventProducers {
            transaction_created_producer: created_handlers.producers().transaction_created_producer,
            payment_confirmed_producer: confirmed_producers.payment_confirmed_producer,
        };

        let rates = RateApi::new(db.clone(), rate_source, config.rates.clone());
        let flow = TransactionFlowApi::new(db.clone(), rates.clone(), config.fee_percent, producers);
        let catalog = CatalogApi::new(db);

        confirmed_handlers.start_handlers().await;
        created_handlers.start_handlers().await;

        Self {
            flow: web::Data::new(flow),
            settlement: web::Data::from(settlement),
            catalog: web::Data::new(catalog),
            rates: web::Data::new(rates),
            monitor_config: web::Data::new(config.monitor),
            monitor,
        }
    }

    /// Registers the shared state and the `/api/v1` routes on an app.
    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        let api = web::scope("/api/v1")
            .service(CreateEventRoute::<SqliteDatabase>::new())
            .service(ListEventsRoute::<SqliteDatabase>::new())
            .service(EventByIdRoute::<SqliteDatabase>::new())
            .service(ReleaseQuotaRoute::<SqliteDatabase>::new())
            .service(CustomerByIdRoute::<SqliteDatabase>::new())
            .service(CreateTransactionRoute::<SqliteDatabase>::new())
            .service(TransactionByIdRoute::<SqliteDatabase>::new())
            .service(ConfirmPaymentRoute::<SqliteDatabase>::new())
            .service(CheckPaymentRoute::<SqliteDatabase>::new())
            .service(CurrentRateRoute::<SqliteDatabase>::new())
            .service(RegisterAddressRoute::<SqliteDatabase>::new());
        cfg.app_data(self.flow.clone())
            .app_data(self.settlement.clone())
            .app_data(self.catalog.clone())
            .app_data(self.rates.clone())
            .app_data(self.monitor_config.clone())
            .service(health)
            .service(api);
    }
}

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    if config.run_migrations {
        info!("🚀️ Running database migrations");
        db.run_migrations().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    }
    let chain = JsonRpcChain::new(&config.rpc_url, UPSTREAM_TIMEOUT)
        .map_err(|e| ServerError::InitializeError(format!("Could not create the chain client. {e}")))?;
    let rate_source = HttpRateSource::new(&config.rate_url, UPSTREAM_TIMEOUT)
        .map_err(|e| ServerError::InitializeError(format!("Could not create the rate client. {e}")))?;
    let services = TicketingServices::new(&config, db, Arc::new(chain), Arc::new(rate_source)).await;
    match services.monitor.resume_pending().await {
        Ok(n) => info!("🚀️ {n} pending transactions are being monitored"),
        Err(e) => warn!("🚀️ Could not resume monitoring of pending transactions. {e}"),
    }
    let monitor = services.monitor.clone();
    let srv = create_server_instance(&config, services)?;
    let result = srv.await.map_err(|e| ServerError::Unspecified(e.to_string()));
    info!("🚀️ Server stopped. Cancelling {} payment monitors", monitor.active_count());
    monitor.stop_all();
    result
}

pub fn create_server_instance(config: &ServerConfig, services: TicketingServices) -> Result<Server, ServerError> {
    let srv = HttpServer::new(move || {
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("tixpay::access_log"))
            .configure(|cfg| services.configure(cfg))
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
