//! On-chain settlement of pending transactions.
//!
//! A check reads the chain head and walks back through a fixed window of recent blocks, newest first. Every
//! transaction sent to the token contract has its receipt inspected for a `Transfer` log that pays the transaction's
//! payment address. The first transfer whose amount is within tolerance of the settlement amount, and that does not
//! already pay another transaction, confirms the transaction.
//!
//! Checks keep no state between calls, so the same blocks may be scanned many times. Idempotency is provided by the
//! confirmation step in storage.
use std::{fmt::Debug, sync::Arc, time::Duration};

use log::*;
use uuid::Uuid;

use crate::{
    chain::{decode_transfer, Address, BlockchainReader, B256},
    db_types::{PaymentEvidence, Transaction},
    events::{EventProducers, PaymentConfirmedEvent},
    helpers::{amount_matches, match_tolerance},
    tix_api::transaction_objects::PaymentCheckOutcome,
    traits::{TicketingDatabase, TicketingError},
};

pub const DEFAULT_TOKEN_CONTRACT: &str = "0xCD60747D9Bbb1da2AfB2F834391f0FF6ccb15f1a";
pub const DEFAULT_TOKEN_DECIMALS: u32 = 6;
pub const DEFAULT_LOOKBACK_BLOCKS: u64 = 20;

#[derive(Debug, Clone)]
pub struct SettlementConfig {
    /// The stablecoin contract that payments must be made with
    pub token_contract: Address,
    pub token_decimals: u32,
    /// How many blocks, counting back from the chain head, a check inspects
    pub lookback_blocks: u64,
    /// Pause between consecutive block fetches, to go easy on public RPC endpoints
    pub scan_delay: Duration,
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self {
            token_contract: DEFAULT_TOKEN_CONTRACT.parse().unwrap_or_default(),
            token_decimals: DEFAULT_TOKEN_DECIMALS,
            lookback_blocks: DEFAULT_LOOKBACK_BLOCKS,
            scan_delay: Duration::from_millis(100),
        }
    }
}

impl SettlementConfig {
    /// The inclusive block range a check inspects when the chain head is at `head`. The genesis block is never
    /// scanned, so the range is empty (`from > to`) while the head is at block 0.
    pub fn scan_range(&self, head: u64) -> (u64, u64) {
        let depth = self.lookback_blocks.max(1).min(head);
        (head + 1 - depth, head)
    }
}

pub struct SettlementApi<B> {
    db: B,
    chain: Arc<dyn BlockchainReader>,
    config: SettlementConfig,
    producers: EventProducers,
}

impl<B> Debug for SettlementApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SettlementApi({:?})", self.config)
    }
}

impl<B> SettlementApi<B> {
    pub fn new(db: B, chain: Arc<dyn BlockchainReader>, config: SettlementConfig, producers: EventProducers) -> Self {
        Self { db, chain, config, producers }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn config(&self) -> &SettlementConfig {
        &self.config
    }
}

impl<B> SettlementApi<B>
where B: TicketingDatabase
{
    /// Runs one settlement check for the transaction.
    ///
    /// Chain failures never surface as errors. An unreadable chain head yields
    /// [`PaymentCheckOutcome::ChainUnavailable`], and blocks or receipts that cannot be fetched are skipped.
    /// Errors are only returned for storage failures.
    pub async fn check_payment(&self, transaction: &Transaction) -> Result<PaymentCheckOutcome, TicketingError> {
        if transaction.is_paid() {
            return Ok(PaymentCheckOutcome::AlreadyPaid { transaction: transaction.clone() });
        }
        let payment_address: Address = transaction.payment_address.parse().map_err(|e| {
            TicketingError::DatabaseError(format!(
                "Transaction {} has an invalid payment address '{}'. {e}",
                transaction.id, transaction.payment_address
            ))
        })?;
        let head = match self.chain.latest_block_number().await {
            Ok(h) => h,
            Err(e) => {
                warn!("⛓️ Could not read the chain head while checking transaction {}. {e}", transaction.id);
                return Ok(PaymentCheckOutcome::ChainUnavailable { reason: e.to_string() });
            },
        };
        let (from_block, to_block) = self.config.scan_range(head);
        trace!("⛓️ Scanning blocks {from_block}..={to_block} for a payment to {payment_address}");
        for number in (from_block..=to_block).rev() {
            for evidence in self.scan_block(number, &payment_address, transaction).await {
                match self.confirm(transaction, evidence).await {
                    Err(TicketingError::DuplicateEvidence(hash)) => {
                        warn!("⛓️ Transfer {hash} already pays another transaction. Continuing the scan.");
                    },
                    result => return result,
                }
            }
            if !self.config.scan_delay.is_zero() && number > from_block {
                tokio::time::sleep(self.config.scan_delay).await;
            }
        }
        debug!(
            "⛓️ No payment of {} to {payment_address} in blocks {from_block}..={to_block} for transaction {}",
            transaction.settlement_amount, transaction.id
        );
        Ok(PaymentCheckOutcome::NotFound { from_block, to_block })
    }

    /// Looks up the transaction and runs one settlement check for it.
    pub async fn check_payment_for(&self, transaction_id: &Uuid) -> Result<PaymentCheckOutcome, TicketingError> {
        let transaction = self
            .db
            .fetch_transaction(transaction_id)
            .await?
            .ok_or(TicketingError::TransactionNotFound(*transaction_id))?;
        self.check_payment(&transaction).await
    }

    /// Every qualifying transfer in the block, in block order.
    async fn scan_block(&self, number: u64, payment_address: &Address, txn: &Transaction) -> Vec<PaymentEvidence> {
        let block = match self.chain.block_by_number(number).await {
            Ok(Some(b)) => b,
            Ok(None) => {
                trace!("⛓️ Block {number} is not available. Skipping it.");
                return Vec::new();
            },
            Err(e) => {
                warn!("⛓️ Could not fetch block {number}. Skipping it. {e}");
                return Vec::new();
            },
        };
        let token = &self.config.token_contract;
        let mut candidates = Vec::new();
        for chain_tx in block.transactions.iter().filter(|t| t.to.as_ref() == Some(token)) {
            candidates.extend(self.scan_receipt(chain_tx.hash, payment_address, txn).await);
        }
        candidates
    }

    async fn scan_receipt(&self, hash: B256, payment_address: &Address, txn: &Transaction) -> Vec<PaymentEvidence> {
        let receipt = match self.chain.transaction_receipt(hash).await {
            Ok(Some(r)) => r,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!("⛓️ Could not fetch the receipt for {hash}. Skipping it. {e}");
                return Vec::new();
            },
        };
        let expected = txn.settlement_amount;
        receipt
            .logs
            .iter()
            .filter_map(|log| decode_transfer(log, &self.config.token_contract, self.config.token_decimals))
            .filter(|transfer| &transfer.to == payment_address)
            .filter(|transfer| {
                let matched = amount_matches(expected, transfer.amount);
                if !matched {
                    debug!(
                        "⛓️ Transfer {} to {payment_address} is for {}, but {expected} ± {} was expected",
                        transfer.tx_hash,
                        transfer.amount,
                        match_tolerance(expected)
                    );
                }
                matched
            })
            .map(|transfer| PaymentEvidence {
                tx_hash: format!("{:#x}", transfer.tx_hash),
                to_address: txn.payment_address.clone(),
                amount: transfer.amount,
            })
            .collect()
    }

    async fn confirm(
        &self,
        transaction: &Transaction,
        evidence: PaymentEvidence,
    ) -> Result<PaymentCheckOutcome, TicketingError> {
        info!("⛓️ Found transfer {} of {} for transaction {}", evidence.tx_hash, evidence.amount, transaction.id);
        match self.db.confirm_payment(&transaction.id, evidence).await {
            Ok(payment) => {
                let event = PaymentConfirmedEvent::new(payment.transaction.clone(), payment.evidence.clone());
                self.producers.publish_payment_confirmed(event).await;
                Ok(PaymentCheckOutcome::Confirmed { payment })
            },
            Err(TicketingError::AlreadyProcessed(id)) => {
                debug!("⛓️ Transaction {id} was confirmed by another check");
                let transaction =
                    self.db.fetch_transaction(&id).await?.ok_or(TicketingError::TransactionNotFound(id))?;
                Ok(PaymentCheckOutcome::AlreadyPaid { transaction })
            },
            Err(e) => Err(e),
        }
    }
}
