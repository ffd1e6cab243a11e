//! Reward-rate type and the arithmetic that turns spend into points.
//!
//! Prices and totals are plain `Decimal` amounts in the marketplace's single
//! currency; there is no multi-currency support.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Invalid reward rate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RewardRateError {
    #[error("reward rate must be non-negative")]
    Negative,

    #[error("reward rate must be at most {}", RewardRate::MAX)]
    TooLarge,
}

/// Largest price or order total the `NUMERIC(12,2)` columns hold.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(0xD4A5_0FFF, 0xE8, 0, false, 2);

/// Points earned per unit of currency spent at a shop.
///
/// `0.1` means one point for every 10 units spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct RewardRate(Decimal);

impl RewardRate {
    /// Rate applied when a shop is set up without one.
    pub const DEFAULT: Self = Self(Decimal::from_parts(1, 0, 0, false, 1));

    /// Largest rate the `NUMERIC(8,4)` column holds.
    pub const MAX: Self = Self(Decimal::from_parts(99_999_999, 0, 0, false, 4));

    /// Rates are kept to four decimal places.
    ///
    /// # Errors
    ///
    /// Returns `RewardRateError::Negative` for rates below zero and
    /// `TooLarge` above [`RewardRate::MAX`].
    pub fn new(rate: Decimal) -> Result<Self, RewardRateError> {
        if rate.is_sign_negative() && !rate.is_zero() {
            return Err(RewardRateError::Negative);
        }
        let rate = rate.round_dp(4);
        if rate > Self::MAX.0 {
            return Err(RewardRateError::TooLarge);
        }
        Ok(Self(rate))
    }

    #[must_use]
    pub const fn as_decimal(&self) -> Decimal {
        self.0
    }
}

impl Default for RewardRate {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<Decimal> for RewardRate {
    type Error = RewardRateError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RewardRate> for Decimal {
    fn from(rate: RewardRate) -> Self {
        rate.0
    }
}

impl std::fmt::Display for RewardRate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Price of one order line: unit price times quantity.
#[must_use]
pub fn line_total(unit_price: Decimal, quantity: u32) -> Decimal {
    unit_price * Decimal::from(quantity)
}

/// Points earned for an order: `floor(total × rate)`.
///
/// Totals are bounded by the `NUMERIC(12,2)` column, so the product always
/// fits; a value that cannot be represented saturates at `i64::MAX`.
#[must_use]
pub fn reward_points_for(total: Decimal, rate: RewardRate) -> i64 {
    total
        .checked_mul(rate.0)
        .and_then(|points| points.floor().to_i64())
        .unwrap_or(i64::MAX)
        .max(0)
}
