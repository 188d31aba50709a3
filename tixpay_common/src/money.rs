use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, Sub},
    str::FromStr,
};

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use sqlx::{
    encode::IsNull,
    error::BoxDynError,
    sqlite::{SqliteArgumentValue, SqliteTypeInfo, SqliteValueRef},
    Decode,
    Encode,
    Sqlite,
    Type,
};
use thiserror::Error;

pub const USDT_CURRENCY_CODE: &str = "USDT";
/// Number of fractional digits a settlement amount is quoted to.
pub const USDT_SETTLEMENT_DP: u32 = 6;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MoneyConversionError {
    #[error("Value cannot be represented as a decimal amount: {0}")]
    OutOfRange(String),
    #[error("Exchange rate must be positive, but was {0}")]
    InvalidRate(Decimal),
    #[error("Invalid decimal amount: {0}")]
    ParseError(String),
}

// Both money types are persisted as TEXT. The sqlx SQLite driver has no native decimal support, so encoding goes via
// the canonical string form of the value.
macro_rules! decimal_text_column {
    ($ty:ident) => {
        impl Type<Sqlite> for $ty {
            fn type_info() -> SqliteTypeInfo {
                <String as Type<Sqlite>>::type_info()
            }

            fn compatible(ty: &SqliteTypeInfo) -> bool {
                <String as Type<Sqlite>>::compatible(ty)
            }
        }

        impl<'q> Encode<'q, Sqlite> for $ty {
            fn encode_by_ref(&self, buf: &mut Vec<SqliteArgumentValue<'q>>) -> IsNull {
                <String as Encode<'q, Sqlite>>::encode(self.0.to_string(), buf)
            }
        }

        impl<'r> Decode<'r, Sqlite> for $ty {
            fn decode(value: SqliteValueRef<'r>) -> Result<Self, BoxDynError> {
                let s = <&str as Decode<'r, Sqlite>>::decode(value)?;
                let d = Decimal::from_str(s)?;
                Ok(Self(d))
            }
        }

        impl FromStr for $ty {
            type Err = MoneyConversionError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Decimal::from_str(s.trim()).map(Self).map_err(|e| MoneyConversionError::ParseError(format!("{s}: {e}")))
            }
        }

        impl From<Decimal> for $ty {
            fn from(value: Decimal) -> Self {
                Self(value)
            }
        }

        impl Add for $ty {
            type Output = Self;

            fn add(self, rhs: Self) -> Self::Output {
                Self(self.0 + rhs.0)
            }
        }

        impl Sub for $ty {
            type Output = Self;

            fn sub(self, rhs: Self) -> Self::Output {
                Self(self.0 - rhs.0)
            }
        }

        impl Sum for $ty {
            fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
                iter.fold(Self::default(), Add::add)
            }
        }

        impl $ty {
            pub fn value(&self) -> Decimal {
                self.0
            }

            pub fn is_positive(&self) -> bool {
                self.0 > Decimal::ZERO
            }
        }
    };
}

//--------------------------------------        Usdt         ---------------------------------------------------------
/// An amount of the settlement stablecoin, in whole-token units (i.e. already scaled by the token's decimals).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Usdt(Decimal);

decimal_text_column!(Usdt);

impl Usdt {
    /// Rounds to [`USDT_SETTLEMENT_DP`] places, with midpoints rounded away from zero.
    pub fn rounded(value: Decimal) -> Self {
        Self(value.round_dp_with_strategy(USDT_SETTLEMENT_DP, RoundingStrategy::MidpointAwayFromZero))
    }

    /// Converts a raw on-chain integer token amount into whole-token units by scaling it by `decimals`.
    pub fn from_token_units(raw: u128, decimals: u32) -> Result<Self, MoneyConversionError> {
        let raw = i128::try_from(raw).map_err(|_| MoneyConversionError::OutOfRange(raw.to_string()))?;
        Decimal::try_from_i128_with_scale(raw, decimals)
            .map(|d| Self(d.normalize()))
            .map_err(|e| MoneyConversionError::OutOfRange(format!("{raw} x 10^-{decimals}: {e}")))
    }

    /// Absolute difference between two amounts.
    pub fn abs_diff(&self, other: &Usdt) -> Usdt {
        Self((self.0 - other.0).abs())
    }
}

impl Display for Usdt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {USDT_CURRENCY_CODE}", self.0.normalize())
    }
}

//--------------------------------------     FiatAmount      ---------------------------------------------------------
/// An amount in the fiat pricing currency. Exchange rates are also expressed in this type, as fiat units per one
/// stablecoin unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FiatAmount(Decimal);

decimal_text_column!(FiatAmount);

impl FiatAmount {
    /// Converts this fiat amount into the stablecoin at the given rate (fiat per stablecoin). The result is not
    /// rounded.
    pub fn to_usdt(&self, rate: FiatAmount) -> Result<Usdt, MoneyConversionError> {
        if !rate.is_positive() {
            return Err(MoneyConversionError::InvalidRate(rate.0));
        }
        self.0.checked_div(rate.0).map(Usdt).ok_or_else(|| MoneyConversionError::OutOfRange(format!("{self} / {rate}")))
    }

    /// The price of `quantity` units at this unit price.
    pub fn times(&self, quantity: i64) -> Result<Self, MoneyConversionError> {
        self.0
            .checked_mul(Decimal::from(quantity))
            .map(Self)
            .ok_or_else(|| MoneyConversionError::OutOfRange(format!("{self} x {quantity}")))
    }
}


impl Display for FiatAmount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}
