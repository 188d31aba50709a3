use std::str::FromStr;

use cucumber::{then, when};
use rust_decimal::{prelude::ToPrimitive, Decimal};
use rust_decimal_macros::dec;
use tixpay_engine::{
    chain::{Address, B256},
    db_types::{NewCustomer, TransactionStatus, Usdt},
    transaction_objects::PaymentCheckOutcome,
    AddressPool,
    CatalogManagement,
    SettlementConfig,
    TicketingDatabase,
    TicketingError,
};

use crate::cucumber::TicketingWorld;

#[when(expr = "'{word}' buys {int} tickets to '{word}'")]
async fn buys_tickets(world: &mut TicketingWorld, email: String, quantity: i64, event: String) {
    let event_id = world.system().event(&event).id;
    let customer = NewCustomer { email, name: "Cucumber Customer".into(), phone: None };
    let result = world.system().flow_api().purchase(customer, event_id, quantity).await;
    let system = world.system_mut();
    match result {
        Ok((_, issued)) => {
            system.transaction = Some(issued.transaction);
            system.last_error = None;
        },
        Err(e) => system.last_error = Some(e),
    }
}

#[when(expr = "a transfer of {word} USDT to the payment address is mined in block {int}")]
async fn transfer_mined(world: &mut TicketingWorld, amount: String, block: u64) {
    let amount = Decimal::from_str(&amount).expect("Not a valid amount");
    let raw = (amount * dec!(1_000_000)).to_u128().expect("Amount out of range");
    let system = world.system();
    let recipient = Address::from_str(&system.transaction().payment_address).expect("Invalid payment address");
    let hash = B256::with_last_byte((block % 256) as u8);
    system.chain.add_transfer(block, hash, SettlementConfig::default().token_contract, recipient, raw);
}

#[when("the payment is checked")]
async fn payment_checked(world: &mut TicketingWorld) {
    let id = world.system().transaction().id;
    let outcome = world.system().settlement_api().check_payment_for(&id).await.expect("Error checking payment");
    world.system_mut().last_check = Some(outcome);
}

#[when(expr = "the payment is confirmed manually with hash {word}")]
async fn confirm_manually(world: &mut TicketingWorld, hash: String) {
    let id = world.system().transaction().id;
    let result = world.system().flow_api().confirm_payment(&id, &hash, None).await;
    world.system_mut().last_error = result.err();
}

#[then(expr = "the purchase succeeds with a settlement amount of {word} USDT")]
async fn purchase_succeeds(world: &mut TicketingWorld, amount: String) {
    let system = world.system();
    assert!(system.last_error.is_none(), "Purchase failed: {:?}", system.last_error);
    let expected = Usdt::from_str(&amount).expect("Not a valid amount");
    assert_eq!(system.transaction().settlement_amount, expected);
    assert_eq!(system.transaction().status, TransactionStatus::Pending);
}

#[then(expr = "{int} tickets are issued")]
async fn tickets_issued(world: &mut TicketingWorld, count: usize) {
    let system = world.system();
    let tickets = system.db.fetch_tickets_for_transaction(&system.transaction().id).await.unwrap();
    assert_eq!(tickets.len(), count);
    let prefix = format!("TIX-{}-", &system.transaction().id.to_string()[..8]);
    assert!(tickets.iter().all(|t| t.code.starts_with(&prefix)));
}

#[then(expr = "event '{word}' has {int} tickets available")]
async fn tickets_available(world: &mut TicketingWorld, event: String, available: i64) {
    let system = world.system();
    let event = system.db.fetch_event(&system.event(&event).id).await.unwrap().expect("Event is missing");
    assert_eq!(event.available_quota, available);
}

#[then(expr = "{int} payment addresses are unused")]
async fn addresses_unused(world: &mut TicketingWorld, count: i64) {
    assert_eq!(world.system().db.unused_address_count().await.unwrap(), count);
}

#[then("the purchase fails with insufficient quota")]
async fn fails_insufficient_quota(world: &mut TicketingWorld) {
    let err = world.system().last_error.clone();
    assert!(matches!(err, Some(TicketingError::InsufficientQuota { .. })), "Unexpected result: {err:?}");
}

#[then("the purchase fails because no payment address is available")]
async fn fails_no_address(world: &mut TicketingWorld) {
    assert_eq!(world.system().last_error, Some(TicketingError::NoAddressAvailable));
}

#[then(expr = "the transaction was priced at the fallback rate of {word} IDR")]
async fn priced_at_fallback(world: &mut TicketingWorld, rate: String) {
    let system = world.system();
    assert!(system.last_error.is_none(), "Purchase failed: {:?}", system.last_error);
    assert_eq!(system.transaction().rate_snapshot.to_string(), rate);
}

#[then("the transaction is paid")]
async fn transaction_is_paid(world: &mut TicketingWorld) {
    let system = world.system();
    let txn = system.db.fetch_transaction(&system.transaction().id).await.unwrap().unwrap();
    assert_eq!(txn.status, TransactionStatus::Paid);
    let evidence = system.db.fetch_evidence_for_transaction(&txn.id).await.unwrap();
    assert!(evidence.is_some(), "Payment evidence was not recorded");
}

#[then("the transaction is still pending")]
async fn transaction_is_pending(world: &mut TicketingWorld) {
    let system = world.system();
    let txn = system.db.fetch_transaction(&system.transaction().id).await.unwrap().unwrap();
    assert_eq!(txn.status, TransactionStatus::Pending);
    assert!(matches!(system.last_check, Some(PaymentCheckOutcome::NotFound { .. })));
}

#[then("the last confirmation was rejected as already processed")]
async fn rejected_as_processed(world: &mut TicketingWorld) {
    let system = world.system();
    assert_eq!(system.last_error, Some(TicketingError::AlreadyProcessed(system.transaction().id)));
}
