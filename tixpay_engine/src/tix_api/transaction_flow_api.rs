use std::fmt::Debug;

use log::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    db_types::{Customer, NewCustomer, NewTransaction, PaymentEvidence, Usdt},
    events::{EventProducers, PaymentConfirmedEvent, TransactionCreatedEvent},
    helpers::{is_valid_email, is_valid_tx_hash, settlement_quote},
    tix_api::{rate_api::RateApi, transaction_objects::TransactionDetails},
    traits::{ConfirmedPayment, IssuedTransaction, RateSnapshots, TicketingDatabase, TicketingError},
};

/// A freshly generated transaction id can collide with an existing ticket code prefix. The whole atomic unit is
/// retried with a new id this many times before giving up.
const MAX_CREATE_ATTEMPTS: usize = 3;

/// `TransactionFlowApi` is the primary API for creating ticket transactions and recording their payment.
pub struct TransactionFlowApi<B> {
    db: B,
    rates: RateApi<B>,
    fee_percent: Decimal,
    producers: EventProducers,
}

impl<B> Debug for TransactionFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TransactionFlowApi (fee: {}%)", self.fee_percent)
    }
}

impl<B> TransactionFlowApi<B> {
    pub fn new(db: B, rates: RateApi<B>, fee_percent: Decimal, producers: EventProducers) -> Self {
        Self { db, rates, fee_percent, producers }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn rates(&self) -> &RateApi<B> {
        &self.rates
    }

    pub fn fee_percent(&self) -> Decimal {
        self.fee_percent
    }
}

impl<B> TransactionFlowApi<B>
where B: TicketingDatabase + RateSnapshots
{
    /// Creates a pending transaction for `quantity` tickets to an event.
    ///
    /// The event is read first so that obviously impossible requests fail fast. The exchange rate is then obtained
    /// (before any storage transaction is opened), the settlement amount is computed, and the storage backend
    /// reserves the quota, allocates the payment address, stores the transaction and issues the tickets as one atomic
    /// unit. The reservation in that unit is authoritative: a purchase that drains the quota concurrently still
    /// causes this call to fail with [`TicketingError::InsufficientQuota`], with nothing changed.
    pub async fn create_transaction(
        &self,
        customer_id: Uuid,
        event_id: Uuid,
        quantity: i64,
    ) -> Result<IssuedTransaction, TicketingError> {
        if quantity < 1 {
            return Err(TicketingError::ValidationError(format!("Quantity must be at least 1, but was {quantity}")));
        }
        self.db.fetch_customer(&customer_id).await?.ok_or(TicketingError::CustomerNotFound(customer_id))?;
        let event = self.db.fetch_event(&event_id).await?.ok_or(TicketingError::EventNotFound(event_id))?;
        if quantity > event.available_quota {
            debug!("🎟️ {quantity} tickets requested for event {event_id}, but only {} remain", event.available_quota);
            return Err(TicketingError::InsufficientQuota {
                event_id,
                requested: quantity,
                available: event.available_quota,
            });
        }
        let total_fiat = event
            .price
            .times(quantity)
            .map_err(|e| TicketingError::ValidationError(format!("The order total is too large. {e}")))?;
        let rate = self.rates.current_rate().await?;
        let quote = settlement_quote(total_fiat, rate.rate, self.fee_percent)
            .map_err(|e| TicketingError::RateUnavailable(e.to_string()))?;
        debug!(
            "🎟️ {quantity} x {} = {total_fiat} at {} ({}) => base {}, fee {}, total {}",
            event.price, rate.rate, rate.origin, quote.base, quote.fee, quote.total
        );
        let new_transaction = NewTransaction {
            customer_id,
            event_id,
            quantity,
            total_fiat,
            rate_snapshot: rate.rate,
            settlement_amount: quote.total,
        };
        let issued = self.insert_with_retries(new_transaction).await?;
        info!(
            "🎟️ Transaction {} created: {quantity} tickets for '{}'. Awaiting {} at {}",
            issued.transaction.id, event.name, issued.transaction.settlement_amount, issued.transaction.payment_address
        );
        let event = TransactionCreatedEvent::new(issued.transaction.clone(), issued.tickets.clone());
        self.producers.publish_transaction_created(event).await;
        Ok(issued)
    }

    async fn insert_with_retries(&self, transaction: NewTransaction) -> Result<IssuedTransaction, TicketingError> {
        let mut attempt = 1;
        loop {
            match self.db.create_transaction(transaction.clone()).await {
                Err(TicketingError::TicketCodeCollision(code)) if attempt < MAX_CREATE_ATTEMPTS => {
                    warn!("🎟️ Ticket code {code} is already taken. Retrying with a new transaction id.");
                    attempt += 1;
                },
                result => return result,
            }
        }
    }

    /// Looks up the customer by email (creating them on their first purchase) and creates a transaction for them.
    pub async fn purchase(
        &self,
        customer: NewCustomer,
        event_id: Uuid,
        quantity: i64,
    ) -> Result<(Customer, IssuedTransaction), TicketingError> {
        if !is_valid_email(&customer.email) {
            return Err(TicketingError::ValidationError(format!("'{}' is not a valid email address", customer.email)));
        }
        if customer.name.trim().is_empty() {
            return Err(TicketingError::ValidationError("Customer name cannot be empty".into()));
        }
        let customer = self.db.fetch_or_create_customer(customer).await?;
        let issued = self.create_transaction(customer.id, event_id, quantity).await?;
        Ok((customer, issued))
    }

    pub async fn transaction(&self, transaction_id: &Uuid) -> Result<TransactionDetails, TicketingError> {
        let transaction = self
            .db
            .fetch_transaction(transaction_id)
            .await?
            .ok_or(TicketingError::TransactionNotFound(*transaction_id))?;
        let tickets = self.db.fetch_tickets_for_transaction(transaction_id).await?;
        let evidence = self.db.fetch_evidence_for_transaction(transaction_id).await?;
        Ok(TransactionDetails { transaction, tickets, evidence })
    }

    /// Confirms payment for a transaction by hand, e.g. when a customer supplies the hash of their transfer.
    ///
    /// If `amount` is not given, the transaction's settlement amount is recorded as the amount paid.
    /// Returns [`TicketingError::AlreadyProcessed`] if the transaction is not pending.
    pub async fn confirm_payment(
        &self,
        transaction_id: &Uuid,
        tx_hash: &str,
        amount: Option<Usdt>,
    ) -> Result<ConfirmedPayment, TicketingError> {
        if !is_valid_tx_hash(tx_hash) {
            return Err(TicketingError::ValidationError(format!("'{tx_hash}' is not a valid transaction hash")));
        }
        let transaction = self
            .db
            .fetch_transaction(transaction_id)
            .await?
            .ok_or(TicketingError::TransactionNotFound(*transaction_id))?;
        let evidence = PaymentEvidence {
            tx_hash: tx_hash.to_lowercase(),
            to_address: transaction.payment_address.clone(),
            amount: amount.unwrap_or(transaction.settlement_amount),
        };
        trace!("🔄️✅️ Transaction {transaction_id} is being confirmed manually with {}", evidence.tx_hash);
        let confirmed = self.db.confirm_payment(transaction_id, evidence).await?;
        info!("🔄️✅️ Transaction {transaction_id} has been manually marked as paid");
        let event = PaymentConfirmedEvent::new(confirmed.transaction.clone(), confirmed.evidence.clone());
        self.producers.publish_payment_confirmed(event).await;
        Ok(confirmed)
    }
}
