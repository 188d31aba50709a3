//! Request handler definitions
//!
//! Define each route and its handler here. Handlers only translate between HTTP and the engine APIs; anything more
//! than a few lines belongs in the engine.
//!
//! All storage and chain access is asynchronous, so a slow settlement check never blocks an actix worker thread.
use actix_web::{get, web, HttpResponse, Responder};
use log::*;
use tixpay_common::Secret;
use tixpay_engine::{
    db_types::NewEvent,
    traits::{AddressPool, CatalogManagement, QuotaManagement, RateSnapshots, TicketingDatabase},
    CatalogApi,
    MonitorConfig,
    RateApi,
    SettlementApi,
    TransactionFlowApi,
};
use uuid::Uuid;

use crate::{
    data_objects::{
        AddressPoolStatus,
        ConfirmPaymentRequest,
        CreateTransactionRequest,
        CreateTransactionResponse,
        Pagination,
        RegisterAddressRequest,
        ReleaseQuotaRequest,
    },
    errors::ServerError,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]<A>(core::marker::PhantomData<fn() -> A>);}
        paste::paste! { impl<A> [<$name:camel Route>]<A> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> A>)
            }
        }}
        paste::paste! { impl<A> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<A>
        where
            A: $($bounds +)+ 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<A>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Events  ----------------------------------------------------
route!(create_event => Post "/events" impl CatalogManagement, AddressPool, QuotaManagement);
pub async fn create_event<B>(
    body: web::Json<NewEvent>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: CatalogManagement + AddressPool + QuotaManagement,
{
    let event = body.into_inner();
    debug!("💻️ POST create event '{}'", event.name);
    let event = api.create_event(event).await?;
    Ok(HttpResponse::Created().json(event))
}

route!(list_events => Get "/events" impl CatalogManagement, AddressPool, QuotaManagement);
pub async fn list_events<B>(
    query: web::Query<Pagination>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: CatalogManagement + AddressPool + QuotaManagement,
{
    let Pagination { limit, offset } = query.into_inner();
    trace!("💻️ GET events (limit {limit}, offset {offset})");
    let events = api.list_events(limit, offset).await?;
    Ok(HttpResponse::Ok().json(events))
}

route!(event_by_id => Get "/events/{id}" impl CatalogManagement, AddressPool, QuotaManagement);
pub async fn event_by_id<B>(
    path: web::Path<Uuid>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: CatalogManagement + AddressPool + QuotaManagement,
{
    let id = path.into_inner();
    trace!("💻️ GET event {id}");
    let event = api.event(&id).await?;
    Ok(HttpResponse::Ok().json(event))
}

route!(release_quota => Post "/events/{id}/release" impl CatalogManagement, AddressPool, QuotaManagement);
/// Route handler for returning reserved units to an event, e.g. after an unpaid transaction is abandoned.
pub async fn release_quota<B>(
    path: web::Path<Uuid>,
    body: web::Json<ReleaseQuotaRequest>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: CatalogManagement + AddressPool + QuotaManagement,
{
    let id = path.into_inner();
    let quantity = body.into_inner().quantity;
    info!("💻️ POST release {quantity} units of event {id}");
    let event = api.release_quota(&id, quantity).await?;
    Ok(HttpResponse::Ok().json(event))
}

//----------------------------------------------   Customers  ----------------------------------------------------
route!(customer_by_id => Get "/customers/{id}" impl CatalogManagement, AddressPool, QuotaManagement);
pub async fn customer_by_id<B>(
    path: web::Path<Uuid>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: CatalogManagement + AddressPool + QuotaManagement,
{
    let id = path.into_inner();
    trace!("💻️ GET customer {id}");
    let customer = api.customer(&id).await?;
    Ok(HttpResponse::Ok().json(customer))
}

//----------------------------------------------   Transactions  ----------------------------------------------------
route!(create_transaction => Post "/transactions" impl TicketingDatabase, RateSnapshots);
/// Route handler for creating a ticket transaction
///
/// The customer is identified by email and created on their first purchase. On success, the response carries the
/// payment instructions: the address to pay, the exact stablecoin amount, and the deadline after which payments are
/// no longer detected automatically. A background payment monitor is started for the new transaction.
pub async fn create_transaction<B>(
    body: web::Json<CreateTransactionRequest>,
    api: web::Data<TransactionFlowApi<B>>,
    monitor: web::Data<MonitorConfig>,
) -> Result<HttpResponse, ServerError>
where
    B: TicketingDatabase + RateSnapshots,
{
    let request = body.into_inner();
    debug!("💻️ POST transaction for {} x{} of event {}", request.customer_email, request.quantity, request.event_id);
    let (customer, issued) = api.purchase(request.customer(), request.event_id, request.quantity).await.map_err(|e| {
        debug!("💻️ Could not create transaction. {e}");
        e
    })?;
    let response = CreateTransactionResponse::new(&customer, issued, monitor.get_ref());
    Ok(HttpResponse::Created().json(response))
}

route!(transaction_by_id => Get "/transactions/{id}" impl TicketingDatabase, RateSnapshots);
pub async fn transaction_by_id<B>(
    path: web::Path<Uuid>,
    api: web::Data<TransactionFlowApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: TicketingDatabase + RateSnapshots,
{
    let id = path.into_inner();
    trace!("💻️ GET transaction {id}");
    let details = api.transaction(&id).await?;
    Ok(HttpResponse::Ok().json(details))
}

route!(confirm_payment => Post "/transactions/{id}/confirm" impl TicketingDatabase, RateSnapshots);
/// Route handler for confirming a payment by hand
///
/// The body carries the hash of the on-chain transfer and, optionally, the amount received. A transaction can only be
/// confirmed once; later attempts get a `409 Conflict`.
pub async fn confirm_payment<B>(
    path: web::Path<Uuid>,
    body: web::Json<ConfirmPaymentRequest>,
    api: web::Data<TransactionFlowApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: TicketingDatabase + RateSnapshots,
{
    let id = path.into_inner();
    let ConfirmPaymentRequest { tx_hash, amount } = body.into_inner();
    info!("💻️ POST manual confirmation of transaction {id} with {tx_hash}");
    let confirmed = api.confirm_payment(&id, &tx_hash, amount).await?;
    Ok(HttpResponse::Ok().json(confirmed))
}

route!(check_payment => Post "/transactions/{id}/check" impl TicketingDatabase);
/// Route handler for a one-shot settlement check
///
/// Scans the recent blocks for the transaction's payment and returns the outcome. Chain outages are reported in the
/// outcome rather than as an error.
pub async fn check_payment<B>(
    path: web::Path<Uuid>,
    api: web::Data<SettlementApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: TicketingDatabase,
{
    let id = path.into_inner();
    debug!("💻️ POST payment check for transaction {id}");
    let outcome = api.check_payment_for(&id).await?;
    Ok(HttpResponse::Ok().json(outcome))
}

//----------------------------------------------   Rates  ----------------------------------------------------
route!(current_rate => Get "/rates/current" impl RateSnapshots);
pub async fn current_rate<B>(api: web::Data<RateApi<B>>) -> Result<HttpResponse, ServerError>
where B: RateSnapshots {
    trace!("💻️ GET current rate");
    let quote = api.current_rate().await?;
    Ok(HttpResponse::Ok().json(quote))
}

//----------------------------------------------   Payment addresses  ----------------------------------------------
route!(register_address => Post "/payment-addresses" impl CatalogManagement, AddressPool, QuotaManagement);
pub async fn register_address<B>(
    body: web::Json<RegisterAddressRequest>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: CatalogManagement + AddressPool + QuotaManagement,
{
    let RegisterAddressRequest { address, secret } = body.into_inner();
    debug!("💻️ POST register payment address {address}");
    let address = api.register_address(&address, Secret::new(secret)).await?;
    let unused_addresses = api.unused_address_count().await?;
    Ok(HttpResponse::Created().json(AddressPoolStatus { address: address.address, unused_addresses }))
}
