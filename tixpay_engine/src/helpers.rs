use std::{str::FromStr, sync::LazyLock};

use regex::Regex;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tixpay_common::{FiatAmount, MoneyConversionError, Usdt};
use uuid::Uuid;

use crate::chain::Address;

/// Relative tolerance when matching an observed transfer against the expected settlement amount (0.1%).
pub const MATCH_TOLERANCE_RATIO: Decimal = dec!(0.001);
/// Lower bound on the matching tolerance, so that tiny amounts are not impossible to match.
pub const MATCH_TOLERANCE_FLOOR: Decimal = dec!(0.000001);

static EMAIL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex is valid"));
static EVM_ADDRESS_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^0x[0-9a-fA-F]{40}$").expect("address regex is valid"));
static TX_HASH_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^0x[0-9a-fA-F]{64}$").expect("tx hash regex is valid"));

/// The ticket code for the `index`th (1-based) ticket issued for a transaction.
pub fn ticket_code(transaction_id: &Uuid, index: i64) -> String {
    let id = transaction_id.to_string();
    format!("TIX-{}-{index}", &id[..8])
}

/// The breakdown of a settlement amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettlementQuote {
    pub base: Usdt,
    pub fee: Usdt,
    /// `base + fee`, rounded to 6 decimal places
    pub total: Usdt,
}

/// Converts a fiat total into the stablecoin amount the customer must pay, including the platform fee.
///
/// `base = total / rate`, `fee = base * fee_percent / 100`, and the settlement amount is `base + fee` rounded to six
/// decimal places (half away from zero). The base and fee are kept unrounded.
pub fn settlement_quote(
    total: FiatAmount,
    rate: FiatAmount,
    fee_percent: Decimal,
) -> Result<SettlementQuote, MoneyConversionError> {
    let base = total.to_usdt(rate)?;
    let out_of_range = || MoneyConversionError::OutOfRange(format!("{base} plus a {fee_percent}% fee"));
    let fee = base.value().checked_mul(fee_percent).map(|f| f / dec!(100)).ok_or_else(out_of_range)?;
    let total = base.value().checked_add(fee).ok_or_else(out_of_range)?;
    Ok(SettlementQuote { base, fee: Usdt::from(fee), total: Usdt::rounded(total) })
}

/// The amount by which an observed transfer may differ from `expected` and still count as payment.
pub fn match_tolerance(expected: Usdt) -> Usdt {
    let relative = (expected.value() * MATCH_TOLERANCE_RATIO).abs();
    Usdt::from(relative.max(MATCH_TOLERANCE_FLOOR))
}

pub fn amount_matches(expected: Usdt, observed: Usdt) -> bool {
    expected.abs_diff(&observed) <= match_tolerance(expected)
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email)
}

pub fn is_valid_evm_address(address: &str) -> bool {
    EVM_ADDRESS_REGEX.is_match(address)
}

/// The EIP-55 checksummed spelling of an address. Every case variant of one account maps to the same string.
pub fn canonical_evm_address(address: &str) -> Option<String> {
    if !is_valid_evm_address(address) {
        return None;
    }
    Address::from_str(address).ok().map(|a| a.to_checksum(None))
}

pub fn is_valid_tx_hash(hash: &str) -> bool {
    TX_HASH_REGEX.is_match(hash)
}
