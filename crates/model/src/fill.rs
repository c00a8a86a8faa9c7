//! Amounts exchanged by filling or matching orders.

use {
    alloy_primitives::U256,
    number::{MathError, u256_ext::SafeMath},
    serde::{Deserialize, Serialize},
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FillResults {
    pub maker_asset_filled_amount: U256,
    pub taker_asset_filled_amount: U256,
    pub maker_fee_paid: U256,
    pub taker_fee_paid: U256,
}

impl FillResults {
    /// Adds two fill results field by field, failing on overflow like the
    /// contract's `addFillResults`.
    pub fn checked_add(&self, other: &Self) -> Result<Self, MathError> {
        Ok(Self {
            maker_asset_filled_amount: self
                .maker_asset_filled_amount
                .safe_add(other.maker_asset_filled_amount)?,
            taker_asset_filled_amount: self
                .taker_asset_filled_amount
                .safe_add(other.taker_asset_filled_amount)?,
            maker_fee_paid: self.maker_fee_paid.safe_add(other.maker_fee_paid)?,
            taker_fee_paid: self.taker_fee_paid.safe_add(other.taker_fee_paid)?,
        })
    }
}

/// The result of matching a left and a right order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchedFillResults {
    pub left: FillResults,
    pub right: FillResults,
    /// Left maker asset kept by the matcher.
    pub left_maker_asset_spread_amount: U256,
    /// Left taker asset (the right maker asset) kept by the matcher.
    pub left_taker_asset_spread_amount: U256,
}

impl MatchedFillResults {
    /// Total fill results of both orders.
    pub fn total(&self) -> Result<FillResults, MathError> {
        self.left.checked_add(&self.right)
    }
}
