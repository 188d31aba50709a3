use alloy_primitives::{keccak256, Address, B256};
use log::*;
use tixpay_common::Usdt;

use crate::chain::LogEntry;

pub const TRANSFER_EVENT_SIGNATURE: &str = "Transfer(address,address,uint256)";

/// `keccak256("Transfer(address,address,uint256)")`, the first topic of every ERC-20 transfer log.
pub fn transfer_event_topic() -> B256 {
    keccak256(TRANSFER_EVENT_SIGNATURE.as_bytes())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenTransfer {
    pub tx_hash: B256,
    pub from: Address,
    pub to: Address,
    /// Amount in whole-token units
    pub amount: Usdt,
}

/// Decodes `log` as an ERC-20 transfer emitted by `token`.
///
/// Returns `None` if the log was emitted by another contract, is not a `Transfer` event, or carries an amount that
/// cannot be decoded. The amount is read from the last 32 bytes of the data payload as a big-endian unsigned integer
/// and scaled by `decimals`.
pub fn decode_transfer(log: &LogEntry, token: &Address, decimals: u32) -> Option<TokenTransfer> {
    if &log.address != token || log.topics.len() < 3 || log.topics[0] != transfer_event_topic() {
        return None;
    }
    let from = Address::from_word(log.topics[1]);
    let to = Address::from_word(log.topics[2]);
    let data = log.data.as_ref();
    if data.len() < 32 {
        trace!("⛓️ Transfer log in {} has a short data payload ({} bytes)", log.transaction_hash, data.len());
        return None;
    }
    let word = &data[data.len() - 32..];
    let (high, low) = word.split_at(16);
    if high.iter().any(|b| *b != 0) {
        warn!("⛓️ Transfer amount in {} does not fit in 128 bits. Ignoring it.", log.transaction_hash);
        return None;
    }
    let mut raw = [0u8; 16];
    raw.copy_from_slice(low);
    let amount = match Usdt::from_token_units(u128::from_be_bytes(raw), decimals) {
        Ok(a) => a,
        Err(e) => {
            warn!("⛓️ Transfer amount in {} could not be scaled. {e}", log.transaction_hash);
            return None;
        },
    };
    Some(TokenTransfer { tx_hash: log.transaction_hash, from, to, amount })
}
