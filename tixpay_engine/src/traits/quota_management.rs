use uuid::Uuid;

use crate::{db_types::Event, traits::TicketingError};

/// Exclusive, storage-enforced reservation of event inventory.
#[allow(async_fn_in_trait)]
pub trait QuotaManagement {
    /// Removes `quantity` units from the event's available quota, in its own atomic transaction.
    ///
    /// Fails with [`TicketingError::InsufficientQuota`] if fewer than `quantity` units remain. Concurrent callers can
    /// never reserve more than the event's quota between them.
    async fn reserve_quota(&self, event_id: &Uuid, quantity: i64) -> Result<Event, TicketingError>;

    /// Returns `quantity` units to the event's available quota. The available quota is clamped so that it never
    /// exceeds the event's total quota, which makes a double release harmless.
    async fn release_quota(&self, event_id: &Uuid, quantity: i64) -> Result<Event, TicketingError>;
}
