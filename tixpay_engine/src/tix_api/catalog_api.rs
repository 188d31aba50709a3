use std::fmt::Debug;

use log::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tixpay_common::Secret;
use uuid::Uuid;

use crate::{
    db_types::{Customer, Event, NewEvent, NewPaymentAddress, PaymentAddress},
    helpers::canonical_evm_address,
    traits::{AddressPool, CatalogManagement, QuotaManagement, TicketingError},
};

pub const MAX_PAGE_SIZE: i64 = 100;
/// The most a single ticket can cost, in the pricing currency.
pub const MAX_TICKET_PRICE: Decimal = dec!(1000000000000);

/// Administration of events, customers and the payment address pool.
pub struct CatalogApi<B> {
    db: B,
}

impl<B> Debug for CatalogApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CatalogApi")
    }
}

impl<B> CatalogApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> CatalogApi<B>
where B: CatalogManagement + AddressPool + QuotaManagement
{
    pub async fn create_event(&self, event: NewEvent) -> Result<Event, TicketingError> {
        if event.name.trim().is_empty() {
            return Err(TicketingError::ValidationError("Event name cannot be empty".into()));
        }
        if event.quota < 0 {
            return Err(TicketingError::ValidationError(format!("Quota cannot be negative ({})", event.quota)));
        }
        if !event.price.is_positive() {
            return Err(TicketingError::ValidationError(format!("Ticket price must be positive ({})", event.price)));
        }
        if event.price.value() > MAX_TICKET_PRICE {
            return Err(TicketingError::ValidationError(format!(
                "Ticket price {} is above the maximum of {MAX_TICKET_PRICE}",
                event.price
            )));
        }
        let event = self.db.create_event(event).await?;
        info!("🎟️ New event '{}' ({}) with {} tickets at {}", event.name, event.id, event.quota, event.price);
        Ok(event)
    }

    pub async fn event(&self, event_id: &Uuid) -> Result<Event, TicketingError> {
        self.db.fetch_event(event_id).await?.ok_or(TicketingError::EventNotFound(*event_id))
    }

    /// Events ordered by schedule. `limit` is clamped to `1..=MAX_PAGE_SIZE`.
    pub async fn list_events(&self, limit: i64, offset: i64) -> Result<Vec<Event>, TicketingError> {
        self.db.list_events(limit.clamp(1, MAX_PAGE_SIZE), offset.max(0)).await
    }

    pub async fn customer(&self, customer_id: &Uuid) -> Result<Customer, TicketingError> {
        self.db.fetch_customer(customer_id).await?.ok_or(TicketingError::CustomerNotFound(*customer_id))
    }

    /// Adds an externally generated address to the payment address pool. Addresses are stored checksummed, so
    /// registering a different spelling of a pooled address fails with `AddressAlreadyRegistered`.
    pub async fn register_address(&self, address: &str, secret: Secret<String>) -> Result<PaymentAddress, TicketingError> {
        let Some(address) = canonical_evm_address(address) else {
            return Err(TicketingError::ValidationError(format!("'{address}' is not a valid EVM address")));
        };
        let address = self.db.register_address(NewPaymentAddress::new(address, secret)).await?;
        info!("🎟️ Payment address {} registered", address.address);
        Ok(address)
    }

    pub async fn unused_address_count(&self) -> Result<i64, TicketingError> {
        self.db.unused_address_count().await
    }

    /// Returns units to an event's available quota, e.g. after an operator cancels an unpaid transaction.
    pub async fn release_quota(&self, event_id: &Uuid, quantity: i64) -> Result<Event, TicketingError> {
        if quantity < 1 {
            return Err(TicketingError::ValidationError(format!("Cannot release a quantity of {quantity}")));
        }
        let event = self.db.release_quota(event_id, quantity).await?;
        info!("🎟️ {quantity} units returned to event {event_id}. {} now available", event.available_quota);
        Ok(event)
    }
}
