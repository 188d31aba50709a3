//! Exchange rates for pricing transactions.
//!
//! The live rate is cached in storage for a freshness window. When the rate source fails, a configured fallback rate
//! is used instead, and the quote says so, so callers can tell a degraded answer from a fresh one.
use std::{fmt::Debug, sync::Arc};

use chrono::{DateTime, Duration, Utc};
use log::*;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tixpay_common::FiatAmount;

use crate::{
    db_types::{NewRateSnapshot, RateOrigin},
    rates::RateSource,
    traits::{RateSnapshots, TicketingError},
};

pub const DEFAULT_FIAT_CURRENCY: &str = "IDR";

#[derive(Debug, Clone)]
pub struct RateConfig {
    /// The fiat currency code to read from the rate source
    pub currency: String,
    /// How long a live rate may be reused before the source is asked again
    pub freshness: Duration,
    /// Fiat per stablecoin, used when the rate source fails
    pub fallback_rate: FiatAmount,
}

impl Default for RateConfig {
    fn default() -> Self {
        Self {
            currency: DEFAULT_FIAT_CURRENCY.to_string(),
            freshness: Duration::minutes(5),
            fallback_rate: FiatAmount::from(dec!(15420.50)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateQuote {
    pub currency: String,
    /// Fiat units per one stablecoin unit
    pub rate: FiatAmount,
    /// When the rate was obtained
    pub timestamp: DateTime<Utc>,
    pub origin: RateOrigin,
}

impl RateQuote {
    pub fn is_fallback(&self) -> bool {
        self.origin == RateOrigin::Fallback
    }
}

pub struct RateApi<B> {
    db: B,
    source: Arc<dyn RateSource>,
    config: RateConfig,
}

impl<B> Debug for RateApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RateApi({:?})", self.config)
    }
}

impl<B: Clone> Clone for RateApi<B> {
    fn clone(&self) -> Self {
        Self { db: self.db.clone(), source: Arc::clone(&self.source), config: self.config.clone() }
    }
}

impl<B> RateApi<B> {
    pub fn new(db: B, source: Arc<dyn RateSource>, config: RateConfig) -> Self {
        Self { db, source, config }
    }

    pub fn config(&self) -> &RateConfig {
        &self.config
    }
}

impl<B> RateApi<B>
where B: RateSnapshots
{
    /// The current fiat-per-stablecoin rate.
    ///
    /// 1. A live rate stored less than `freshness` ago is returned as [`RateOrigin::Cached`].
    /// 2. Otherwise the rate source is asked. A successful answer is stored and returned as [`RateOrigin::Live`].
    /// 3. If the source fails, the fallback rate is stored and returned as [`RateOrigin::Fallback`]. Fallback
    ///    snapshots are never served from the cache, so the source is retried on the next call.
    pub async fn current_rate(&self) -> Result<RateQuote, TicketingError> {
        let currency = self.config.currency.as_str();
        if let Some(snapshot) = self.db.fetch_latest_live_rate(currency).await? {
            let age = Utc::now() - snapshot.created_at;
            if age < self.config.freshness {
                trace!("💱 Using cached {currency} rate {} ({}s old)", snapshot.rate, age.num_seconds());
                return Ok(RateQuote {
                    currency: snapshot.currency,
                    rate: snapshot.rate,
                    timestamp: snapshot.created_at,
                    origin: RateOrigin::Cached,
                });
            }
        }
        let (rate, origin) = match self.source.fetch_rate(currency).await {
            Ok(rate) => {
                debug!("💱 Fetched live {currency} rate: {rate}");
                (rate, RateOrigin::Live)
            },
            Err(e) => {
                warn!("💱 Could not fetch the {currency} rate. {e}. Using the fallback rate {}", self.config.fallback_rate);
                (self.config.fallback_rate, RateOrigin::Fallback)
            },
        };
        let snapshot =
            self.db.save_rate_snapshot(NewRateSnapshot { currency: currency.to_string(), rate, origin }).await?;
        Ok(RateQuote { currency: snapshot.currency, rate: snapshot.rate, timestamp: snapshot.created_at, origin })
    }
}
