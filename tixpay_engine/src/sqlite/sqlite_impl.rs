//! `SqliteDatabase` is a concrete implementation of a ticketing engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::traits`]
//! module.
use std::fmt::Debug;

use log::*;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::db::{
    blockchain_transactions,
    customers,
    db_url,
    events,
    new_pool,
    payment_addresses,
    rate_snapshots,
    tickets,
    transactions,
};
use crate::{
    db_types::{
        BlockchainTransaction,
        Customer,
        Event,
        NewCustomer,
        NewEvent,
        NewPaymentAddress,
        NewRateSnapshot,
        NewTransaction,
        PaymentAddress,
        PaymentEvidence,
        RateSnapshot,
        Ticket,
        Transaction,
    },
    traits::{
        AddressPool,
        CatalogManagement,
        ConfirmedPayment,
        IssuedTransaction,
        QuotaManagement,
        RateSnapshots,
        TicketingDatabase,
        TicketingError,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl TicketingDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn create_transaction(&self, transaction: NewTransaction) -> Result<IssuedTransaction, TicketingError> {
        let mut tx = self.pool.begin().await?;
        let event = events::reserve_quota(&transaction.event_id, transaction.quantity, &mut tx).await?;
        trace!("🗃️ Reserved {} units of event {}. {} remain", transaction.quantity, event.id, event.available_quota);
        let address = payment_addresses::allocate_address(&mut tx).await?;
        trace!("🗃️ Allocated payment address {}", address.address);
        let transaction = transactions::insert_transaction(transaction, &address.address, &mut tx).await?;
        let tickets = tickets::issue_tickets(&transaction, &mut tx).await?;
        tx.commit().await?;
        debug!(
            "🗃️ Transaction {} for {} tickets to event {} has been saved. Awaiting {} at {}",
            transaction.id,
            tickets.len(),
            transaction.event_id,
            transaction.settlement_amount,
            transaction.payment_address
        );
        Ok(IssuedTransaction { transaction, tickets })
    }

    async fn confirm_payment(
        &self,
        transaction_id: &Uuid,
        evidence: PaymentEvidence,
    ) -> Result<ConfirmedPayment, TicketingError> {
        let mut tx = self.pool.begin().await?;
        let transaction = match transactions::mark_paid(transaction_id, &mut tx).await? {
            Some(t) => t,
            None => {
                return match transactions::fetch_transaction(transaction_id, &mut tx).await? {
                    Some(_) => Err(TicketingError::AlreadyProcessed(*transaction_id)),
                    None => Err(TicketingError::TransactionNotFound(*transaction_id)),
                };
            },
        };
        let existing = blockchain_transactions::fetch_evidence(transaction_id, &evidence.tx_hash, &mut tx).await?;
        let evidence = match existing {
            Some(e) => {
                debug!("🗃️ Evidence {} for transaction {transaction_id} was already recorded", e.tx_hash);
                e
            },
            None => blockchain_transactions::insert_evidence(transaction_id, evidence, &mut tx).await?,
        };
        tx.commit().await?;
        debug!("🗃️ Transaction {transaction_id} is paid by {} ({})", evidence.tx_hash, evidence.amount);
        Ok(ConfirmedPayment { transaction, evidence })
    }

    async fn fetch_transaction(&self, transaction_id: &Uuid) -> Result<Option<Transaction>, TicketingError> {
        let mut conn = self.pool.acquire().await?;
        transactions::fetch_transaction(transaction_id, &mut conn).await
    }

    async fn fetch_pending_transactions(&self) -> Result<Vec<Transaction>, TicketingError> {
        let mut conn = self.pool.acquire().await?;
        transactions::fetch_pending_transactions(&mut conn).await
    }

    async fn fetch_tickets_for_transaction(&self, transaction_id: &Uuid) -> Result<Vec<Ticket>, TicketingError> {
        let mut conn = self.pool.acquire().await?;
        tickets::fetch_tickets_for_transaction(transaction_id, &mut conn).await
    }

    async fn fetch_evidence_for_transaction(
        &self,
        transaction_id: &Uuid,
    ) -> Result<Option<BlockchainTransaction>, TicketingError> {
        let mut conn = self.pool.acquire().await?;
        blockchain_transactions::fetch_evidence_for_transaction(transaction_id, &mut conn).await
    }

    async fn close(&mut self) -> Result<(), TicketingError> {
        self.pool.close().await;
        Ok(())
    }
}

impl QuotaManagement for SqliteDatabase {
    async fn reserve_quota(&self, event_id: &Uuid, quantity: i64) -> Result<Event, TicketingError> {
        let mut tx = self.pool.begin().await?;
        let event = events::reserve_quota(event_id, quantity, &mut tx).await?;
        tx.commit().await?;
        Ok(event)
    }

    async fn release_quota(&self, event_id: &Uuid, quantity: i64) -> Result<Event, TicketingError> {
        let mut tx = self.pool.begin().await?;
        let event = events::release_quota(event_id, quantity, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Released {quantity} units of event {event_id}. {} now available", event.available_quota);
        Ok(event)
    }
}

impl AddressPool for SqliteDatabase {
    async fn register_address(&self, address: NewPaymentAddress) -> Result<PaymentAddress, TicketingError> {
        let mut conn = self.pool.acquire().await?;
        let address = payment_addresses::insert_address(address, &mut conn).await?;
        debug!("🗃️ Payment address {} added to the pool", address.address);
        Ok(address)
    }

    async fn allocate_address(&self) -> Result<PaymentAddress, TicketingError> {
        let mut tx = self.pool.begin().await?;
        let address = payment_addresses::allocate_address(&mut tx).await?;
        tx.commit().await?;
        Ok(address)
    }

    async fn unused_address_count(&self) -> Result<i64, TicketingError> {
        let mut conn = self.pool.acquire().await?;
        payment_addresses::unused_count(&mut conn).await
    }
}

impl CatalogManagement for SqliteDatabase {
    async fn create_event(&self, event: NewEvent) -> Result<Event, TicketingError> {
        let mut conn = self.pool.acquire().await?;
        let event = events::insert_event(event, &mut conn).await?;
        debug!("🗃️ Event '{}' created with id {} and quota {}", event.name, event.id, event.quota);
        Ok(event)
    }

    async fn fetch_event(&self, event_id: &Uuid) -> Result<Option<Event>, TicketingError> {
        let mut conn = self.pool.acquire().await?;
        events::fetch_event(event_id, &mut conn).await
    }

    async fn list_events(&self, limit: i64, offset: i64) -> Result<Vec<Event>, TicketingError> {
        let mut conn = self.pool.acquire().await?;
        events::list_events(limit, offset, &mut conn).await
    }

    async fn fetch_customer(&self, customer_id: &Uuid) -> Result<Option<Customer>, TicketingError> {
        let mut conn = self.pool.acquire().await?;
        customers::fetch_customer(customer_id, &mut conn).await
    }

    async fn fetch_or_create_customer(&self, customer: NewCustomer) -> Result<Customer, TicketingError> {
        let mut conn = self.pool.acquire().await?;
        customers::fetch_or_create_customer(customer, &mut conn).await
    }
}

impl RateSnapshots for SqliteDatabase {
    async fn fetch_latest_live_rate(&self, currency: &str) -> Result<Option<RateSnapshot>, TicketingError> {
        let mut conn = self.pool.acquire().await?;
        rate_snapshots::fetch_latest_live_rate(currency, &mut conn).await
    }

    async fn save_rate_snapshot(&self, snapshot: NewRateSnapshot) -> Result<RateSnapshot, TicketingError> {
        let mut conn = self.pool.acquire().await?;
        rate_snapshots::insert_snapshot(snapshot, &mut conn).await
    }
}

impl SqliteDatabase {
    /// Creates a new database API object using the URL in `TIXPAY_DATABASE_URL`, or the default location.
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(&url, max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    /// Applies the embedded schema migrations.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    /// Returns a reference to the database connection pool. This is only used in tests.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
