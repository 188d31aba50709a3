//! # Exchange rate sources
//!
//! A [`RateSource`] supplies the live fiat-per-stablecoin rate. Caching, persistence and the fallback policy live in
//! [`crate::tix_api::rate_api::RateApi`], so sources only need to fetch.
mod http_source;

use async_trait::async_trait;
pub use http_source::{HttpRateSource, DEFAULT_RATE_URL};
use thiserror::Error;
use tixpay_common::FiatAmount;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RateError {
    #[error("Could not fetch the exchange rate: {0}")]
    Unavailable(String),
    #[error("The rate source does not quote {0}")]
    MissingCurrency(String),
    #[error("The rate source returned an invalid rate: {0}")]
    InvalidRate(String),
}

#[async_trait]
pub trait RateSource: Send + Sync {
    /// The number of units of `currency` that one stablecoin unit buys.
    async fn fetch_rate(&self, currency: &str) -> Result<FiatAmount, RateError>;
}
