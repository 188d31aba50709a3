use uuid::Uuid;

use crate::{
    db_types::{Customer, Event, NewCustomer, NewEvent},
    traits::TicketingError,
};

/// Plain storage for events and customers.
#[allow(async_fn_in_trait)]
pub trait CatalogManagement {
    /// Stores a new event. The available quota starts out equal to the quota.
    async fn create_event(&self, event: NewEvent) -> Result<Event, TicketingError>;

    async fn fetch_event(&self, event_id: &Uuid) -> Result<Option<Event>, TicketingError>;

    /// Events ordered by schedule, earliest first.
    async fn list_events(&self, limit: i64, offset: i64) -> Result<Vec<Event>, TicketingError>;

    async fn fetch_customer(&self, customer_id: &Uuid) -> Result<Option<Customer>, TicketingError>;

    /// Returns the customer with the given email, creating one from `customer` if none exists yet. Existing customer
    /// details are not overwritten.
    async fn fetch_or_create_customer(&self, customer: NewCustomer) -> Result<Customer, TicketingError>;
}
