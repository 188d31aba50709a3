use serde::{Deserialize, Serialize};

use crate::db_types::{BlockchainTransaction, Ticket, Transaction};

/// Emitted after a transaction has been stored, with its tickets, and is awaiting payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionCreatedEvent {
    pub transaction: Transaction,
    pub tickets: Vec<Ticket>,
}

impl TransactionCreatedEvent {
    pub fn new(transaction: Transaction, tickets: Vec<Ticket>) -> Self {
        Self { transaction, tickets }
    }
}

/// Emitted once per transaction, when it moves from pending to paid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentConfirmedEvent {
    pub transaction: Transaction,
    pub evidence: BlockchainTransaction,
}

impl PaymentConfirmedEvent {
    pub fn new(transaction: Transaction, evidence: BlockchainTransaction) -> Self {
        Self { transaction, evidence }
    }
}
