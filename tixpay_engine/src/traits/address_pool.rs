use crate::{
    db_types::{NewPaymentAddress, PaymentAddress},
    traits::TicketingError,
};

#[allow(async_fn_in_trait)]
pub trait AddressPool {
    /// Imports a freshly generated address into the pool. Duplicate addresses are rejected with
    /// [`TicketingError::AddressAlreadyRegistered`].
    async fn register_address(&self, address: NewPaymentAddress) -> Result<PaymentAddress, TicketingError>;

    /// Claims one unused address and marks it as used, in its own atomic transaction. Two concurrent callers never
    /// receive the same address. Fails with [`TicketingError::NoAddressAvailable`] when the pool is empty.
    async fn allocate_address(&self) -> Result<PaymentAddress, TicketingError>;

    /// The number of addresses that have not been allocated yet.
    async fn unused_address_count(&self) -> Result<i64, TicketingError>;
}
