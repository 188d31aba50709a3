use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use alloy_primitives::{Address, Bytes, B256, U64};
use async_trait::async_trait;
use log::*;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::json;

use crate::chain::{BlockchainReader, ChainBlock, ChainError, ChainTransaction, LogEntry, TransactionReceipt};

/// A [`BlockchainReader`] backed by an Ethereum-compatible JSON-RPC endpoint.
pub struct JsonRpcChain {
    client: Client,
    url: String,
    request_id: AtomicU64,
}

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcError>,
    #[allow(dead_code)]
    id: u64,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct RpcBlock {
    number: U64,
    #[serde(default)]
    transactions: Vec<RpcTransaction>,
}

#[derive(Debug, Deserialize)]
struct RpcTransaction {
    hash: B256,
    to: Option<Address>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcReceipt {
    transaction_hash: B256,
    #[serde(default)]
    logs: Vec<RpcLog>,
}

#[derive(Debug, Deserialize)]
struct RpcLog {
    address: Address,
    topics: Vec<B256>,
    data: Bytes,
}

impl JsonRpcChain {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, ChainError> {
        let client = Client::builder().timeout(timeout).build().map_err(|e| ChainError::Transport(e.to_string()))?;
        Ok(Self { client, url: url.to_string(), request_id: AtomicU64::new(1) })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Make an RPC call. A `null` result is returned as `None`.
    async fn call<T: DeserializeOwned>(&self, method: &str, params: serde_json::Value) -> Result<Option<T>, ChainError> {
        let id = self.request_id.fetch_add(1, Ordering::SeqCst);
        let request = RpcRequest { jsonrpc: "2.0", id, method, params };
        trace!("⛓️ RPC call: {method} id={id}");
        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ChainError::Transport(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChainError::Transport(format!("HTTP {status} - {body}")));
        }
        let rpc_response: RpcResponse<T> = response.json().await.map_err(|e| ChainError::Decode(e.to_string()))?;
        if let Some(error) = rpc_response.error {
            return Err(ChainError::Rpc { code: error.code, message: error.message });
        }
        Ok(rpc_response.result)
    }
}

#[async_trait]
impl BlockchainReader for JsonRpcChain {
    async fn latest_block_number(&self) -> Result<u64, ChainError> {
        let height: U64 = self
            .call("eth_blockNumber", json!([]))
            .await?
            .ok_or_else(|| ChainError::Decode("eth_blockNumber returned no result".into()))?;
        Ok(height.to::<u64>())
    }

    async fn block_by_number(&self, number: u64) -> Result<Option<ChainBlock>, ChainError> {
        let block: Option<RpcBlock> = self.call("eth_getBlockByNumber", json!([format!("{number:#x}"), true])).await?;
        Ok(block.map(|b| ChainBlock {
            number: b.number.to::<u64>(),
            transactions: b.transactions.into_iter().map(|t| ChainTransaction { hash: t.hash, to: t.to }).collect(),
        }))
    }

    async fn transaction_receipt(&self, tx_hash: B256) -> Result<Option<TransactionReceipt>, ChainError> {
        let receipt: Option<RpcReceipt> =
            self.call("eth_getTransactionReceipt", json!([format!("{tx_hash:#x}")])).await?;
        Ok(receipt.map(|r| {
            let transaction_hash = r.transaction_hash;
            let logs = r
                .logs
                .into_iter()
                .map(|l| LogEntry { address: l.address, topics: l.topics, data: l.data, transaction_hash })
                .collect();
            TransactionReceipt { transaction_hash, logs }
        }))
    }
}
