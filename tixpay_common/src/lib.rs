//! Value types shared by the tixpay engine and server.
//!
//! * [`Usdt`] and [`FiatAmount`] are exact decimal money types. They are stored in SQLite as canonical decimal text,
//!   so no binary floating point is involved in pricing or payment matching.
//! * [`Secret`] wraps sensitive material (e.g. payment address keys) so that it is never printed in logs.
mod money;
mod secret;

pub mod helpers;

pub use money::{FiatAmount, MoneyConversionError, Usdt, USDT_CURRENCY_CODE, USDT_SETTLEMENT_DP};
pub use secret::Secret;
