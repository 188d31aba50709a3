use alloy_primitives::{Address, Bytes, B256};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChainError {
    #[error("Could not reach the chain node: {0}")]
    Transport(String),
    #[error("The chain node returned an error ({code}): {message}")]
    Rpc { code: i64, message: String },
    #[error("Could not decode the chain node's response: {0}")]
    Decode(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainTransaction {
    pub hash: B256,
    /// The destination of the transaction. `None` for contract creation.
    pub to: Option<Address>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainBlock {
    pub number: u64,
    pub transactions: Vec<ChainTransaction>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// The contract that emitted the log
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
    pub transaction_hash: B256,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionReceipt {
    pub transaction_hash: B256,
    pub logs: Vec<LogEntry>,
}

/// Read-only access to an EVM chain.
#[async_trait]
pub trait BlockchainReader: Send + Sync {
    /// The height of the current chain head.
    async fn latest_block_number(&self) -> Result<u64, ChainError>;

    /// The block at the given height, including its transactions. `None` if the node does not know the block.
    async fn block_by_number(&self, number: u64) -> Result<Option<ChainBlock>, ChainError>;

    /// The execution receipt for a transaction, including its event logs. `None` if the transaction is unknown or
    /// still pending.
    async fn transaction_receipt(&self, tx_hash: B256) -> Result<Option<TransactionReceipt>, ChainError>;
}
