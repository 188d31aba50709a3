use thiserror::Error;
use uuid::Uuid;

use crate::{
    db_types::{BlockchainTransaction, NewTransaction, PaymentEvidence, Ticket, Transaction},
    traits::{AddressPool, CatalogManagement, ConfirmedPayment, IssuedTransaction, QuotaManagement},
};

/// This trait defines the highest level of behaviour for backends supporting the ticketing engine.
///
/// This behaviour includes:
/// * Atomically reserving inventory, allocating a payment address, storing a transaction and issuing its tickets.
/// * Idempotently confirming payment for a transaction and recording the on-chain evidence.
/// * Fetching transactions and their tickets and evidence.
#[allow(async_fn_in_trait)]
pub trait TicketingDatabase: Clone + QuotaManagement + AddressPool + CatalogManagement {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Takes a priced transaction, and in a single atomic storage transaction:
    /// * reserves `quantity` units of the event's quota,
    /// * allocates an unused payment address,
    /// * stores the transaction with `pending` status and `locked_at` set to now,
    /// * issues one ticket per unit, with codes derived from the new transaction id.
    ///
    /// If any step fails, none of the steps take effect.
    async fn create_transaction(&self, transaction: NewTransaction) -> Result<IssuedTransaction, TicketingError>;

    /// Moves a `pending` transaction to `paid` and records the evidence, as one atomic unit.
    ///
    /// * If the transaction is not pending, [`TicketingError::AlreadyProcessed`] is returned and nothing changes.
    /// * If evidence with the same hash is already recorded for this transaction, it is reused instead of inserted.
    /// * If the hash is already recorded against a different transaction, [`TicketingError::DuplicateEvidence`] is
    ///   returned and the status change is rolled back.
    async fn confirm_payment(
        &self,
        transaction_id: &Uuid,
        evidence: PaymentEvidence,
    ) -> Result<ConfirmedPayment, TicketingError>;

    async fn fetch_transaction(&self, transaction_id: &Uuid) -> Result<Option<Transaction>, TicketingError>;

    /// All transactions still awaiting payment, oldest first.
    async fn fetch_pending_transactions(&self) -> Result<Vec<Transaction>, TicketingError>;

    async fn fetch_tickets_for_transaction(&self, transaction_id: &Uuid) -> Result<Vec<Ticket>, TicketingError>;

    async fn fetch_evidence_for_transaction(
        &self,
        transaction_id: &Uuid,
    ) -> Result<Option<BlockchainTransaction>, TicketingError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), TicketingError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TicketingError {
    #[error("We have an internal database engine (configuration/uptime etc.) : {0}")]
    DatabaseError(String),
    #[error("Invalid request: {0}")]
    ValidationError(String),
    #[error("The requested event {0} does not exist")]
    EventNotFound(Uuid),
    #[error("The requested customer {0} does not exist")]
    CustomerNotFound(Uuid),
    #[error("The requested transaction {0} does not exist")]
    TransactionNotFound(Uuid),
    #[error("Insufficient quota for event {event_id}. Requested {requested}, but only {available} are available")]
    InsufficientQuota { event_id: Uuid, requested: i64, available: i64 },
    #[error("There are no unused payment addresses left in the pool")]
    NoAddressAvailable,
    #[error("The payment address {0} is already registered")]
    AddressAlreadyRegistered(String),
    #[error("Transaction {0} has already been processed")]
    AlreadyProcessed(Uuid),
    #[error("The on-chain transfer {0} has already been recorded against another transaction")]
    DuplicateEvidence(String),
    #[error("Ticket code {0} is already in use")]
    TicketCodeCollision(String),
    #[error("No exchange rate is available: {0}")]
    RateUnavailable(String),
}

impl From<sqlx::Error> for TicketingError {
    fn from(e: sqlx::Error) -> Self {
        TicketingError::DatabaseError(e.to_string())
    }
}
