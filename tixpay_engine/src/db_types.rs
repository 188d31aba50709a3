use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;
pub use tixpay_common::{FiatAmount, Usdt};
use tixpay_common::Secret;
use uuid::Uuid;

#[derive(Debug, Clone, Error)]
#[error("Invalid status: {0}")]
pub struct ConversionError(String);

//--------------------------------------        Event         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub location: String,
    pub schedule: DateTime<Utc>,
    /// Unit ticket price in the fiat pricing currency
    pub price: FiatAmount,
    /// Total capacity. Never changes after the event is created.
    pub quota: i64,
    /// Remaining capacity. Always in `0..=quota`.
    pub available_quota: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEvent {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,
    pub schedule: DateTime<Utc>,
    pub price: FiatAmount,
    pub quota: i64,
}

//--------------------------------------       Customer       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Customer {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCustomer {
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
}

//--------------------------------------  TransactionStatus   ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    /// Waiting for the stablecoin transfer to arrive at the payment address.
    Pending,
    /// Payment has been matched on chain (or confirmed manually). Terminal.
    Paid,
}

impl Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionStatus::Pending => write!(f, "pending"),
            TransactionStatus::Paid => write!(f, "paid"),
        }
    }
}

impl FromStr for TransactionStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            s => Err(ConversionError(format!("Invalid transaction status: {s}"))),
        }
    }
}

//--------------------------------------     Transaction      ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub event_id: Uuid,
    pub quantity: i64,
    pub total_fiat: FiatAmount,
    /// The fiat-per-stablecoin rate that was used to price this transaction.
    pub rate_snapshot: FiatAmount,
    /// The amount of stablecoin the customer must transfer. Fixed at creation.
    pub settlement_amount: Usdt,
    pub payment_address: String,
    pub status: TransactionStatus,
    pub locked_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    pub fn is_paid(&self) -> bool {
        self.status == TransactionStatus::Paid
    }
}

/// A fully priced transaction, ready to be stored. The payment address and identity are assigned by the storage
/// backend as part of the same atomic unit that reserves the quota.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransaction {
    pub customer_id: Uuid,
    pub event_id: Uuid,
    pub quantity: i64,
    pub total_fiat: FiatAmount,
    pub rate_snapshot: FiatAmount,
    pub settlement_amount: Usdt,
}

//--------------------------------------    PaymentAddress    ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct PaymentAddress {
    pub id: i64,
    pub address: String,
    #[serde(skip)]
    #[sqlx(try_from = "String")]
    pub secret: Secret<String>,
    pub is_used: bool,
    pub allocated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPaymentAddress {
    pub address: String,
    pub secret: Secret<String>,
}

impl NewPaymentAddress {
    pub fn new<S: Into<String>>(address: S, secret: Secret<String>) -> Self {
        Self { address: address.into(), secret }
    }
}

//--------------------------------------        Ticket        ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    Active,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Ticket {
    pub id: i64,
    pub code: String,
    pub transaction_id: Uuid,
    pub event_id: Uuid,
    pub customer_id: Uuid,
    pub status: TicketStatus,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------  BlockchainTransaction ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EvidenceStatus {
    Confirmed,
}

/// The on-chain transfer that settled a transaction.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct BlockchainTransaction {
    pub id: i64,
    pub transaction_id: Uuid,
    pub tx_hash: String,
    pub to_address: String,
    pub amount: Usdt,
    pub status: EvidenceStatus,
    pub created_at: DateTime<Utc>,
}

/// What a confirmation records about the transfer that paid for a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentEvidence {
    pub tx_hash: String,
    pub to_address: String,
    pub amount: Usdt,
}

//--------------------------------------     RateSnapshot     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum RateOrigin {
    /// Freshly fetched from the rate source.
    Live,
    /// A live rate from storage that is still inside the freshness window.
    Cached,
    /// The configured default, used because the rate source failed.
    Fallback,
}

impl Display for RateOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RateOrigin::Live => write!(f, "Live"),
            RateOrigin::Cached => write!(f, "Cached"),
            RateOrigin::Fallback => write!(f, "Fallback"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct RateSnapshot {
    pub id: i64,
    pub currency: String,
    /// Fiat units per one stablecoin unit
    pub rate: FiatAmount,
    pub origin: RateOrigin,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRateSnapshot {
    pub currency: String,
    pub rate: FiatAmount,
    pub origin: RateOrigin,
}
