use async_trait::async_trait;
use mockall::mock;
use tixpay_engine::{
    db_types::FiatAmount,
    rates::{RateError, RateSource},
};

mock! {
    pub Rates {}
    #[async_trait]
    impl RateSource for Rates {
        async fn fetch_rate(&self, currency: &str) -> Result<FiatAmount, RateError>;
    }
}
