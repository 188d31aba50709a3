use serde::{Deserialize, Serialize};

use crate::db_types::{BlockchainTransaction, Transaction, Ticket};

/// The result of atomically creating a transaction: the stored transaction and the tickets issued for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedTransaction {
    pub transaction: Transaction,
    pub tickets: Vec<Ticket>,
}

/// The result of confirming payment for a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmedPayment {
    pub transaction: Transaction,
    pub evidence: BlockchainTransaction,
}
