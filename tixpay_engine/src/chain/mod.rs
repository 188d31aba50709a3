//! # Blockchain read interface
//!
//! The settlement engine only ever reads from the chain. [`BlockchainReader`] is the seam: the service uses
//! [`JsonRpcChain`], which talks to any Ethereum-compatible JSON-RPC node, and tests substitute a scripted chain.
//!
//! [`transfer_log`] decodes ERC-20 `Transfer` event log entries into [`TokenTransfer`]s.
mod json_rpc;
mod reader;
pub mod transfer_log;

pub use alloy_primitives::{Address, Bytes, B256};
pub use json_rpc::JsonRpcChain;
pub use reader::{BlockchainReader, ChainBlock, ChainError, ChainTransaction, LogEntry, TransactionReceipt};
pub use transfer_log::{decode_transfer, transfer_event_topic, TokenTransfer};
