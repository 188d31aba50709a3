use crate::{
    db_types::{NewRateSnapshot, RateSnapshot},
    traits::TicketingError,
};

#[allow(async_fn_in_trait)]
pub trait RateSnapshots {
    /// The most recent snapshot for `currency` that came from the live rate source. Fallback snapshots are ignored.
    async fn fetch_latest_live_rate(&self, currency: &str) -> Result<Option<RateSnapshot>, TicketingError>;

    /// Appends a snapshot to the rate history.
    async fn save_rate_snapshot(&self, snapshot: NewRateSnapshot) -> Result<RateSnapshot, TicketingError>;
}
