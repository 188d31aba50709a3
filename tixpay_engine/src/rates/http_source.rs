use std::{collections::HashMap, time::Duration};

use async_trait::async_trait;
use log::*;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use tixpay_common::FiatAmount;

use crate::rates::{RateError, RateSource};

pub const DEFAULT_RATE_URL: &str = "https://api.exchangerate-api.com/v4/latest/USD";

/// Fetches a JSON document of USD-based rates, of the form `{"base": "USD", "rates": {"IDR": 15420.5, ...}}`, and
/// treats the stablecoin as pegged to USD.
pub struct HttpRateSource {
    client: Client,
    url: String,
}

#[derive(Debug, Deserialize)]
struct RatesDocument {
    rates: HashMap<String, Decimal>,
}

impl HttpRateSource {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, RateError> {
        let client = Client::builder().timeout(timeout).build().map_err(|e| RateError::Unavailable(e.to_string()))?;
        Ok(Self { client, url: url.to_string() })
    }
}

#[async_trait]
impl RateSource for HttpRateSource {
    async fn fetch_rate(&self, currency: &str) -> Result<FiatAmount, RateError> {
        trace!("💱 Fetching rates from {}", self.url);
        let response = self.client.get(&self.url).send().await.map_err(|e| RateError::Unavailable(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(RateError::Unavailable(format!("HTTP {status} from {}", self.url)));
        }
        let doc: RatesDocument = response.json().await.map_err(|e| RateError::Unavailable(e.to_string()))?;
        rate_from_document(&doc, currency)
    }
}

fn rate_from_document(doc: &RatesDocument, currency: &str) -> Result<FiatAmount, RateError> {
    let rate = doc.rates.get(currency).copied().ok_or_else(|| RateError::MissingCurrency(currency.to_string()))?;
    if rate <= Decimal::ZERO {
        return Err(RateError::InvalidRate(rate.to_string()));
    }
    Ok(FiatAmount::from(rate))
}
