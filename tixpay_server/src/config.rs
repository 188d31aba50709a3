use std::{env, fmt::Display, ops::RangeInclusive, str::FromStr, time::Duration};

use log::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tixpay_common::helpers::{parse_boolean_flag, parse_value};
use tixpay_engine::{
    rates::DEFAULT_RATE_URL,
    tix_api::rate_api::DEFAULT_FIAT_CURRENCY,
    MonitorConfig,
    RateConfig,
    SettlementConfig,
};

const DEFAULT_TIXPAY_HOST: &str = "127.0.0.1";
const DEFAULT_TIXPAY_PORT: u16 = 8080;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/tixpay.db";
const DEFAULT_RPC_URL: &str = "https://data-seed-prebsc-1-s1.binance.org:8545";
const DEFAULT_FEE_PERCENT: Decimal = dec!(1.2);
/// Timeout for calls to the chain node and the rate service
pub const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(10);
/// Amounts carry at most 28 fractional digits, so tokens with more decimals cannot be read.
const TOKEN_DECIMALS: RangeInclusive<u32> = 0..=28;
const MONITOR_INTERVAL_SECS: RangeInclusive<u64> = 1..=3600;
const MONITOR_DEADLINE_MINS: RangeInclusive<u64> = 1..=7 * 24 * 60;
const RATE_FRESHNESS_SECS: RangeInclusive<i64> = 0..=24 * 60 * 60;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// If true, the embedded database migrations are applied on start up.
    pub run_migrations: bool,
    /// Platform fee, in percent, added on top of the converted ticket price.
    pub fee_percent: Decimal,
    /// The EVM JSON-RPC endpoint to read blocks and receipts from.
    pub rpc_url: String,
    /// The URL of the exchange rate document.
    pub rate_url: String,
    pub settlement: SettlementConfig,
    pub monitor: MonitorConfig,
    pub rates: RateConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_TIXPAY_HOST.to_string(),
            port: DEFAULT_TIXPAY_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            run_migrations: true,
            fee_percent: DEFAULT_FEE_PERCENT,
            rpc_url: DEFAULT_RPC_URL.to_string(),
            rate_url: DEFAULT_RATE_URL.to_string(),
            settlement: SettlementConfig::default(),
            monitor: MonitorConfig::default(),
            rates: RateConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let defaults = Self::default();
        let host = env::var("TIXPAY_HOST").ok().unwrap_or(defaults.host);
        let port = env_or("TIXPAY_PORT", defaults.port);
        let database_url = env::var("TIXPAY_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ TIXPAY_DATABASE_URL is not set. Using the default, {DEFAULT_DATABASE_URL}.");
            defaults.database_url
        });
        let run_migrations = parse_boolean_flag(env::var("TIXPAY_RUN_MIGRATIONS").ok(), true);
        let fee_percent = env_or("TIXPAY_PLATFORM_FEE_PERCENT", defaults.fee_percent);
        if fee_percent.is_sign_negative() {
            warn!("🪛️ TIXPAY_PLATFORM_FEE_PERCENT is negative ({fee_percent}). Buyers will receive a discount.");
        }
        let rpc_url = env::var("TIXPAY_RPC_URL").ok().unwrap_or(defaults.rpc_url);
        let rate_url = env::var("TIXPAY_RATE_URL").ok().unwrap_or(defaults.rate_url);
        let settlement = SettlementConfig {
            token_contract: env_or("TIXPAY_TOKEN_CONTRACT", defaults.settlement.token_contract),
            token_decimals: in_range_or("TIXPAY_TOKEN_DECIMALS", defaults.settlement.token_decimals, TOKEN_DECIMALS),
            lookback_blocks: positive_or("TIXPAY_LOOKBACK_BLOCKS", defaults.settlement.lookback_blocks),
            ..defaults.settlement
        };
        let monitor = MonitorConfig {
            poll_interval: Duration::from_secs(in_range_or(
                "TIXPAY_MONITOR_INTERVAL_SECS",
                defaults.monitor.poll_interval.as_secs(),
                MONITOR_INTERVAL_SECS,
            )),
            deadline: Duration::from_secs(
                60 * in_range_or(
                    "TIXPAY_MONITOR_DEADLINE_MINS",
                    defaults.monitor.deadline.as_secs() / 60,
                    MONITOR_DEADLINE_MINS,
                ),
            ),
        };
        let freshness_secs =
            in_range_or("TIXPAY_RATE_FRESHNESS_SECS", defaults.rates.freshness.num_seconds(), RATE_FRESHNESS_SECS);
        let mut fallback_rate = env_or("TIXPAY_FALLBACK_RATE", defaults.rates.fallback_rate);
        if !fallback_rate.is_positive() {
            error!(
                "🪛️ TIXPAY_FALLBACK_RATE must be greater than zero. Using the default, {}, instead.",
                defaults.rates.fallback_rate
            );
            fallback_rate = defaults.rates.fallback_rate;
        }
        let rates = RateConfig {
            currency: env::var("TIXPAY_FIAT_CURRENCY").ok().unwrap_or_else(|| DEFAULT_FIAT_CURRENCY.to_string()),
            freshness: chrono::Duration::seconds(freshness_secs),
            fallback_rate,
        };
        Self {
            host,
            port,
            database_url,
            run_migrations,
            fee_percent,
            rpc_url,
            rate_url,
            settlement,
            monitor,
            rates,
        }
    }
}

/// Reads `name` from the environment, falling back to `default` if it is missing or cannot be parsed.
fn env_or<T>(name: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match parse_value::<T>(env::var(name).ok()) {
        Some(Ok(v)) => v,
        Some(Err(e)) => {
            error!("🪛️ {e} is not a valid value for {name}. Using the default, {default}, instead.");
            default
        },
        None => default,
    }
}

/// Reads `name` like [`env_or`], but falls back to `default` if the value lies outside `range`.
fn in_range_or<T>(name: &str, default: T, range: RangeInclusive<T>) -> T
where
    T: FromStr + Display + PartialOrd + Copy,
    T::Err: Display,
{
    let value = env_or(name, default);
    if range.contains(&value) {
        return value;
    }
    error!(
        "🪛️ {name} must be between {} and {}, but was {value}. Using the default, {default}, instead.",
        range.start(),
        range.end()
    );
    default
}

fn positive_or(name: &str, default: u64) -> u64 {
    match env_or(name, default) {
        0 => {
            error!("🪛️ {name} must be greater than zero. Using the default, {default}, instead.");
            default
        },
        v => v,
    }
}
