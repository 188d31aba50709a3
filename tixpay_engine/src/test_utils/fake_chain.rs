//! A scriptable in-memory chain for settlement tests.
use std::{
    collections::{HashMap, HashSet},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
};

use alloy_primitives::{Address, Bytes, B256, U256};
use async_trait::async_trait;

use crate::chain::{
    transfer_event_topic,
    BlockchainReader,
    ChainBlock,
    ChainError,
    ChainTransaction,
    LogEntry,
    TransactionReceipt,
};

#[derive(Default)]
struct ChainState {
    head: u64,
    blocks: HashMap<u64, ChainBlock>,
    receipts: HashMap<B256, TransactionReceipt>,
    head_unavailable: bool,
    broken_blocks: HashSet<u64>,
    broken_receipts: HashSet<B256>,
}

#[derive(Default)]
pub struct FakeChain {
    state: Mutex<ChainState>,
    block_requests: AtomicUsize,
}

impl FakeChain {
    pub fn new(head: u64) -> Self {
        let chain = Self::default();
        chain.set_head(head);
        chain
    }

    pub fn set_head(&self, head: u64) {
        self.state.lock().unwrap().head = head;
    }

    /// Makes `eth_blockNumber` fail until switched back.
    pub fn set_head_unavailable(&self, unavailable: bool) {
        self.state.lock().unwrap().head_unavailable = unavailable;
    }

    pub fn break_block(&self, number: u64) {
        self.state.lock().unwrap().broken_blocks.insert(number);
    }

    pub fn break_receipt(&self, tx_hash: B256) {
        self.state.lock().unwrap().broken_receipts.insert(tx_hash);
    }

    /// The number of block fetches made so far.
    pub fn block_requests(&self) -> usize {
        self.block_requests.load(Ordering::SeqCst)
    }

    /// Adds a transaction to `block`, sent to `to`, with the given receipt logs.
    pub fn add_transaction(&self, block: u64, tx_hash: B256, to: Option<Address>, logs: Vec<LogEntry>) {
        let mut state = self.state.lock().unwrap();
        state
            .blocks
            .entry(block)
            .or_insert_with(|| ChainBlock { number: block, transactions: vec![] })
            .transactions
            .push(ChainTransaction { hash: tx_hash, to });
        state.receipts.insert(tx_hash, TransactionReceipt { transaction_hash: tx_hash, logs });
    }

    /// Adds a token transfer of `raw_amount` base units to `recipient` in `block`.
    pub fn add_transfer(&self, block: u64, tx_hash: B256, token: Address, recipient: Address, raw_amount: u128) {
        let log = transfer_log(token, recipient, raw_amount, tx_hash);
        self.add_transaction(block, tx_hash, Some(token), vec![log]);
    }
}

pub fn transfer_log(token: Address, recipient: Address, raw_amount: u128, tx_hash: B256) -> LogEntry {
    let sender = Address::repeat_byte(0x11);
    LogEntry {
        address: token,
        topics: vec![transfer_event_topic(), sender.into_word(), recipient.into_word()],
        data: Bytes::from(U256::from(raw_amount).to_be_bytes::<32>().to_vec()),
        transaction_hash: tx_hash,
    }
}

#[async_trait]
impl BlockchainReader for FakeChain {
    async fn latest_block_number(&self) -> Result<u64, ChainError> {
        let state = self.state.lock().unwrap();
        if state.head_unavailable {
            return Err(ChainError::Transport("connection refused".into()));
        }
        Ok(state.head)
    }

    async fn block_by_number(&self, number: u64) -> Result<Option<ChainBlock>, ChainError> {
        self.block_requests.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock().unwrap();
        if state.broken_blocks.contains(&number) {
            return Err(ChainError::Rpc { code: -32000, message: "header not found".into() });
        }
        if number > state.head {
            return Ok(None);
        }
        let block = state.blocks.get(&number).cloned().unwrap_or(ChainBlock { number, transactions: vec![] });
        Ok(Some(block))
    }

    async fn transaction_receipt(&self, tx_hash: B256) -> Result<Option<TransactionReceipt>, ChainError> {
        let state = self.state.lock().unwrap();
        if state.broken_receipts.contains(&tx_hash) {
            return Err(ChainError::Transport("timed out".into()));
        }
        Ok(state.receipts.get(&tx_hash).cloned())
    }
}
