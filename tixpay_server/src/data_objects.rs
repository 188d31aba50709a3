use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tixpay_common::USDT_CURRENCY_CODE;
use tixpay_engine::{
    db_types::{Customer, FiatAmount, NewCustomer, Ticket, TransactionStatus, Usdt},
    IssuedTransaction,
    MonitorConfig,
};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    20
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTransactionRequest {
    pub customer_email: String,
    pub customer_name: String,
    #[serde(default)]
    pub customer_phone: Option<String>,
    pub event_id: Uuid,
    pub quantity: i64,
}

impl CreateTransactionRequest {
    pub fn customer(&self) -> NewCustomer {
        NewCustomer {
            email: self.customer_email.trim().to_lowercase(),
            name: self.customer_name.trim().to_string(),
            phone: self.customer_phone.clone(),
        }
    }
}

/// The payment instructions returned to a buyer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTransactionResponse {
    pub transaction_id: Uuid,
    pub customer_id: Uuid,
    pub event_id: Uuid,
    pub quantity: i64,
    pub total_fiat: FiatAmount,
    pub exchange_rate: FiatAmount,
    pub settlement_amount: Usdt,
    pub settlement_currency: String,
    pub payment_address: String,
    pub status: TransactionStatus,
    /// Payments arriving after this time are not picked up automatically
    pub payment_deadline: DateTime<Utc>,
    pub tickets: Vec<Ticket>,
}

impl CreateTransactionResponse {
    pub fn new(customer: &Customer, issued: IssuedTransaction, monitor: &MonitorConfig) -> Self {
        let IssuedTransaction { transaction, tickets } = issued;
        let deadline = chrono::Duration::from_std(monitor.deadline).unwrap_or(chrono::Duration::zero());
        Self {
            transaction_id: transaction.id,
            customer_id: customer.id,
            event_id: transaction.event_id,
            quantity: transaction.quantity,
            total_fiat: transaction.total_fiat,
            exchange_rate: transaction.rate_snapshot,
            settlement_amount: transaction.settlement_amount,
            settlement_currency: USDT_CURRENCY_CODE.to_string(),
            payment_address: transaction.payment_address,
            status: transaction.status,
            payment_deadline: transaction.locked_at + deadline,
            tickets,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmPaymentRequest {
    pub tx_hash: String,
    /// The amount actually received. Defaults to the settlement amount.
    #[serde(default)]
    pub amount: Option<Usdt>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseQuotaRequest {
    pub quantity: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterAddressRequest {
    pub address: String,
    /// The key material for the address. It is stored, but never returned.
    pub secret: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddressPoolStatus {
    pub address: String,
    pub unused_addresses: i64,
}
