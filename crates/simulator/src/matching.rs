//! Matching of two orders whose prices cross. The taker of a match (the
//! matcher) pays nothing but the taker fees and keeps the spread.

use {
    crate::{MatchMode, SimulationError, SimulationResult, Simulator, transfer::Transfer},
    alloy_primitives::{Address, U256},
    model::{FillEvent, FillResults, MatchedFillResults, Order},
    number::{
        MathError,
        safe_get_partial_amount_ceil,
        safe_get_partial_amount_floor,
        u256_ext::SafeMath,
    },
};

/// Amounts that are still available on one order of a match.
#[derive(Clone, Copy, Debug)]
struct Remaining {
    maker: U256,
    taker: U256,
}

impl Remaining {
    fn new(order: &Order, taker_asset_filled_amount: U256) -> Result<Self, MathError> {
        let taker = order
            .taker_asset_amount
            .safe_sub(taker_asset_filled_amount)?;
        let maker =
            safe_get_partial_amount_floor(order.maker_asset_amount, order.taker_asset_amount, taker)?;
        Ok(Self { maker, taker })
    }
}

/// Computes how much of `left` and `right` gets filled by matching them,
/// given the taker amounts they were already filled by.
pub fn calculate_matched_fill_results(
    left: &Order,
    right: &Order,
    left_filled: U256,
    right_filled: U256,
    mode: MatchMode,
) -> Result<MatchedFillResults, MathError> {
    let left_remaining = Remaining::new(left, left_filled)?;
    let right_remaining = Remaining::new(right, right_filled)?;

    let (left_fill, right_fill) = match mode {
        MatchMode::Standard => standard_fill(left, right, left_remaining, right_remaining)?,
        MatchMode::MaximalFill => maximal_fill(left, right, left_remaining, right_remaining)?,
    };

    Ok(MatchedFillResults {
        left: with_fees(left, left_fill)?,
        right: with_fees(right, right_fill)?,
        left_maker_asset_spread_amount: left_fill.maker.safe_sub(right_fill.taker)?,
        left_taker_asset_spread_amount: right_fill.maker.safe_sub(left_fill.taker)?,
    })
}

/// Fills the right order as much as the left order allows. The left maker
/// amount rounds down and the right taker amount rounds up, both in favor of
/// the makers.
fn standard_fill(
    left: &Order,
    right: &Order,
    left_remaining: Remaining,
    right_remaining: Remaining,
) -> Result<(Remaining, Remaining), MathError> {
    if left_remaining.taker >= right_remaining.maker {
        // Also covers both orders being filled exactly.
        let left_taker = right_remaining.maker;
        let left_maker = safe_get_partial_amount_floor(
            left.maker_asset_amount,
            left.taker_asset_amount,
            left_taker,
        )?;
        Ok((
            Remaining {
                maker: left_maker,
                taker: left_taker,
            },
            right_remaining,
        ))
    } else {
        let right_maker = left_remaining.taker;
        let right_taker = safe_get_partial_amount_ceil(
            right.taker_asset_amount,
            right.maker_asset_amount,
            right_maker,
        )?;
        Ok((
            left_remaining,
            Remaining {
                maker: right_maker,
                taker: right_taker,
            },
        ))
    }
}

/// Fills both orders as much as possible, letting the matcher keep a spread
/// in whichever asset a surplus arises.
fn maximal_fill(
    left: &Order,
    right: &Order,
    left_remaining: Remaining,
    right_remaining: Remaining,
) -> Result<(Remaining, Remaining), MathError> {
    if left_remaining.maker >= right_remaining.taker
        && right_remaining.maker >= left_remaining.taker
    {
        return Ok((left_remaining, right_remaining));
    }
    if left_remaining.maker > right_remaining.taker {
        // The right order completes and the surplus of left maker asset goes
        // to the matcher.
        let left_taker = right_remaining.maker;
        let left_maker = safe_get_partial_amount_floor(
            left.maker_asset_amount,
            left.taker_asset_amount,
            left_taker,
        )?;
        return Ok((
            Remaining {
                maker: left_maker,
                taker: left_taker,
            },
            right_remaining,
        ));
    }
    if right_remaining.maker > left_remaining.taker {
        // The left order completes and the surplus of right maker asset goes
        // to the matcher.
        let right_taker = left_remaining.maker;
        let right_maker = safe_get_partial_amount_floor(
            right.maker_asset_amount,
            right.taker_asset_amount,
            right_taker,
        )?;
        return Ok((
            left_remaining,
            Remaining {
                maker: right_maker,
                taker: right_taker,
            },
        ));
    }
    let right_maker = left_remaining.taker;
    let right_taker = safe_get_partial_amount_floor(
        right.taker_asset_amount,
        right.maker_asset_amount,
        right_maker,
    )?;
    Ok((
        left_remaining,
        Remaining {
            maker: right_maker,
            taker: right_taker,
        },
    ))
}

fn with_fees(order: &Order, fill: Remaining) -> Result<FillResults, MathError> {
    Ok(FillResults {
        maker_asset_filled_amount: fill.maker,
        taker_asset_filled_amount: fill.taker,
        maker_fee_paid: safe_get_partial_amount_floor(
            fill.maker,
            order.maker_asset_amount,
            order.maker_fee,
        )?,
        taker_fee_paid: safe_get_partial_amount_floor(
            fill.taker,
            order.taker_asset_amount,
            order.taker_fee,
        )?,
    })
}

impl Simulator {
    /// Simulates `taker` matching `left` against `right` with the configured
    /// match mode.
    #[tracing::instrument(skip_all, fields(%taker))]
    pub async fn simulate_match(
        &mut self,
        left: &Order,
        right: &Order,
        taker: Address,
    ) -> Result<SimulationResult<MatchedFillResults>, SimulationError> {
        let rollback = self.begin();
        let mut events = Vec::new();
        let outcome = self.match_orders(left, right, taker, &mut events).await;
        let outcome = outcome.map(|results| (results, events));
        self.finish(rollback, outcome)
    }

    async fn match_orders(
        &mut self,
        left: &Order,
        right: &Order,
        taker: Address,
        events: &mut Vec<FillEvent>,
    ) -> Result<MatchedFillResults, SimulationError> {
        if left.maker_asset != right.taker_asset || left.taker_asset != right.maker_asset {
            return Err(SimulationError::AssetMismatch);
        }
        let left_info = self.assert_fillable(left, taker)?;
        let right_info = self.assert_fillable(right, taker)?;
        let makers_give = left
            .maker_asset_amount
            .safe_mul(right.maker_asset_amount)?;
        let makers_want = left
            .taker_asset_amount
            .safe_mul(right.taker_asset_amount)?;
        if makers_give < makers_want {
            return Err(SimulationError::NegativeSpreadRequired);
        }

        let matched = calculate_matched_fill_results(
            left,
            right,
            left_info.taker_asset_filled_amount,
            right_info.taker_asset_filled_amount,
            self.config.match_mode,
        )?;
        self.settle_match(left, right, taker, &matched).await?;

        events.push(self.record_fill(left, &left_info, taker, matched.left)?);
        events.push(self.record_fill(right, &right_info, taker, matched.right)?);
        tracing::debug!(
            total = ?matched.total()?,
            left_maker_spread = %matched.left_maker_asset_spread_amount,
            left_taker_spread = %matched.left_taker_asset_spread_amount,
            "matched orders"
        );
        Ok(matched)
    }

    /// Runs the match transfers in the exchange's order: the two maker
    /// trades (left first), the left then right spread to the taker, the
    /// left then right maker fee, and finally the taker fees. When several
    /// transfers would fail, the error of the earliest one surfaces.
    async fn settle_match(
        &mut self,
        left: &Order,
        right: &Order,
        taker: Address,
        matched: &MatchedFillResults,
    ) -> Result<(), SimulationError> {
        let mut transfers = vec![
            Transfer::maker_trade(
                left,
                right.maker_address,
                matched.right.taker_asset_filled_amount,
            ),
            Transfer::maker_trade(
                right,
                left.maker_address,
                matched.left.taker_asset_filled_amount,
            ),
            Transfer::maker_trade(left, taker, matched.left_maker_asset_spread_amount),
            Transfer::maker_trade(right, taker, matched.left_taker_asset_spread_amount),
            Transfer::maker_fee(left, matched.left.maker_fee_paid),
            Transfer::maker_fee(right, matched.right.maker_fee_paid),
        ];
        if left.fee_recipient_address == right.fee_recipient_address
            && left.taker_fee_asset == right.taker_fee_asset
        {
            let combined = matched
                .left
                .taker_fee_paid
                .safe_add(matched.right.taker_fee_paid)?;
            transfers.push(Transfer::taker_fee(left, taker, combined));
        } else {
            transfers.push(Transfer::taker_fee(left, taker, matched.left.taker_fee_paid));
            transfers.push(Transfer::taker_fee(right, taker, matched.right.taker_fee_paid));
        }
        self.transfer_all(&transfers).await?;
        Ok(())
    }
}
