//! # Storage backend contracts
//!
//! This module defines the behaviour that a storage backend must expose in order to support the ticketing engine.
//! Every method that mutates more than one row runs as a single atomic storage transaction, and all exclusivity
//! guarantees (quota reservations, address allocation, the pending to paid transition) are enforced by the storage
//! layer rather than by in-process locks. This keeps multiple instances of the service correct against one database.
//!
//! * [`TicketingDatabase`] is the highest level of behaviour: atomic transaction creation and payment confirmation.
//! * [`QuotaManagement`] reserves and releases event inventory.
//! * [`AddressPool`] manages the pool of single-use payment addresses.
//! * [`CatalogManagement`] covers events and customers.
//! * [`RateSnapshots`] stores the history of exchange rates used for pricing.
mod address_pool;
mod catalog_management;
mod data_objects;
mod quota_management;
mod rate_snapshots;
mod ticketing_database;

pub use address_pool::AddressPool;
pub use catalog_management::CatalogManagement;
pub use data_objects::{ConfirmedPayment, IssuedTransaction};
pub use quota_management::QuotaManagement;
pub use rate_snapshots::RateSnapshots;
pub use ticketing_database::{TicketingDatabase, TicketingError};
