//! Tixpay Engine
//!
//! The Tixpay engine sells event tickets priced in a fiat currency and settled in a USD stablecoin on an EVM chain.
//! This library contains the core logic: inventory, pricing, payment address allocation, ticket issuance and on-chain
//! settlement. It has no HTTP surface of its own.
//!
//! The library is divided into these sections:
//! 1. Storage ([`mod@traits`] and [`mod@sqlite`]). The traits define what a backend must guarantee, in particular the
//!    atomicity of transaction creation and the exclusivity of quota reservations and address allocation. SQLite is
//!    the shipped backend. The data types stored by backends live in [`mod@db_types`].
//! 2. External collaborators. [`mod@chain`] reads blocks and receipts from an EVM chain over JSON-RPC, and
//!    [`mod@rates`] fetches live exchange rates.
//! 3. The public API ([`mod@tix_api`]): transaction creation, settlement checks, the background payment monitor, rates
//!    and the catalog.
//!
//! The engine emits events when a transaction is created and when it is paid. Handlers can be attached to these
//! with [`events::EventHooks`].
pub mod chain;
pub mod db_types;
pub mod events;
pub mod helpers;
pub mod rates;
#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod tix_api;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
#[cfg(feature = "sqlite")]
pub use tix_api::payment_monitor::{MonitorConfig, PaymentMonitor};
pub use tix_api::{
    catalog_api::CatalogApi,
    rate_api::{RateApi, RateConfig, RateQuote},
    settlement_api::{SettlementApi, SettlementConfig},
    transaction_flow_api::TransactionFlowApi,
    transaction_objects,
};
pub use traits::{
    AddressPool,
    CatalogManagement,
    ConfirmedPayment,
    IssuedTransaction,
    QuotaManagement,
    RateSnapshots,
    TicketingDatabase,
    TicketingError,
};
