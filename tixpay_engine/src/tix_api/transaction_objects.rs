use serde::{Deserialize, Serialize};

use crate::{
    db_types::{BlockchainTransaction, Ticket, Transaction},
    traits::ConfirmedPayment,
};

/// A transaction with everything that hangs off it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionDetails {
    pub transaction: Transaction,
    pub tickets: Vec<Ticket>,
    pub evidence: Option<BlockchainTransaction>,
}

/// The result of one settlement scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PaymentCheckOutcome {
    /// The transaction was already paid before this check (or a concurrent check confirmed it first).
    AlreadyPaid { transaction: Transaction },
    /// This check found the transfer and confirmed the transaction.
    Confirmed { payment: ConfirmedPayment },
    /// No matching transfer was found in the scanned block window.
    NotFound { from_block: u64, to_block: u64 },
    /// The chain head could not be read. Nothing was scanned.
    ChainUnavailable { reason: String },
}

impl PaymentCheckOutcome {
    /// True if the transaction is paid after this check.
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::AlreadyPaid { .. } | Self::Confirmed { .. })
    }
}
