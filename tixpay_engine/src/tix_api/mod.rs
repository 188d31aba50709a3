//! # Ticketing engine public API
//!
//! The `tix_api` module exposes the programmatic API for the ticketing engine. An API instance is created by
//! supplying a storage backend that implements the backend traits the API needs, plus any external collaborators.
//!
//! * [`transaction_flow_api`] creates transactions (reserve, price, allocate, issue) and confirms payments manually.
//! * [`settlement_api`] scans the chain for the transfer that pays a transaction, and confirms it.
//! * [`payment_monitor`] runs settlement scans in the background until a transaction is paid or its deadline passes.
//! * [`rate_api`] supplies exchange rates, with caching and a fallback when the rate source is down.
//! * [`catalog_api`] covers events, customers and the payment address pool.
//!
//! ```rust,ignore
//! let db = SqliteDatabase::new_with_url(url, 5).await?;
//! let rates = RateApi::new(db.clone(), source, RateConfig::default());
//! let api = TransactionFlowApi::new(db, rates, dec!(1.2), producers);
//! let issued = api.create_transaction(customer.id, event.id, 2).await?;
//! ```
pub mod catalog_api;
#[cfg(feature = "sqlite")]
pub mod payment_monitor;
pub mod rate_api;
pub mod settlement_api;
pub mod transaction_flow_api;
pub mod transaction_objects;
