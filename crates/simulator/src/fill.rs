use {
    crate::{SimulationError, SimulationResult, Simulator, transfer::Transfer},
    alloy_primitives::{Address, U256},
    model::{FillEvent, FillResults, Order},
    number::{MathError, get_partial_amount_ceil, get_partial_amount_floor, u256_ext::SafeMath},
};

/// Computes the amounts exchanged when `taker_asset_filled_amount` of the
/// order's taker asset gets filled. Maker amount and fees are rounded down
/// without a rounding error check.
pub fn calculate_fill_results(
    order: &Order,
    taker_asset_filled_amount: U256,
) -> Result<FillResults, MathError> {
    let partial = |target| {
        get_partial_amount_floor(taker_asset_filled_amount, order.taker_asset_amount, target)
    };
    Ok(FillResults {
        maker_asset_filled_amount: partial(order.maker_asset_amount)?,
        taker_asset_filled_amount,
        maker_fee_paid: partial(order.maker_fee)?,
        taker_fee_paid: partial(order.taker_fee)?,
    })
}

impl Simulator {
    /// Simulates `taker` filling up to `taker_asset_fill_amount` of `order`.
    #[tracing::instrument(skip_all, fields(%taker, amount = %taker_asset_fill_amount))]
    pub async fn simulate_fill(
        &mut self,
        order: &Order,
        taker: Address,
        taker_asset_fill_amount: U256,
    ) -> Result<SimulationResult, SimulationError> {
        let rollback = self.begin();
        let mut events = Vec::new();
        let outcome = self.fill_order(order, taker, taker_asset_fill_amount, &mut events).await;
        let outcome = outcome.map(|results| (results, events));
        self.finish(rollback, outcome)
    }

    /// Like [`Self::simulate_fill`] but fails unless exactly
    /// `taker_asset_fill_amount` gets filled.
    #[tracing::instrument(skip_all, fields(%taker, amount = %taker_asset_fill_amount))]
    pub async fn simulate_fill_or_kill(
        &mut self,
        order: &Order,
        taker: Address,
        taker_asset_fill_amount: U256,
    ) -> Result<SimulationResult, SimulationError> {
        let rollback = self.begin();
        let mut events = Vec::new();
        let outcome = self
            .fill_order(order, taker, taker_asset_fill_amount, &mut events)
            .await;
        let outcome = match outcome {
            Ok(results) if results.taker_asset_filled_amount != taker_asset_fill_amount => {
                Err(SimulationError::IncompleteFill {
                    requested: taker_asset_fill_amount,
                    filled: results.taker_asset_filled_amount,
                })
            }
            outcome => outcome.map(|results| (results, events)),
        };
        self.finish(rollback, outcome)
    }

    /// Fills `orders` in sequence until `taker_asset_fill_amount` of taker
    /// asset has been sold. Either all fills succeed or none is applied.
    #[tracing::instrument(skip_all, fields(%taker, orders = orders.len(), amount = %taker_asset_fill_amount))]
    pub async fn simulate_market_sell(
        &mut self,
        orders: &[Order],
        taker: Address,
        taker_asset_fill_amount: U256,
    ) -> Result<SimulationResult, SimulationError> {
        let rollback = self.begin();
        let mut events = Vec::new();
        let outcome = self.market_sell(orders, taker, taker_asset_fill_amount, &mut events).await;
        let outcome = outcome.map(|results| (results, events));
        self.finish(rollback, outcome)
    }

    /// Fills `orders` in sequence until `maker_asset_fill_amount` of maker
    /// asset has been bought. Either all fills succeed or none is applied.
    #[tracing::instrument(skip_all, fields(%taker, orders = orders.len(), amount = %maker_asset_fill_amount))]
    pub async fn simulate_market_buy(
        &mut self,
        orders: &[Order],
        taker: Address,
        maker_asset_fill_amount: U256,
    ) -> Result<SimulationResult, SimulationError> {
        let rollback = self.begin();
        let mut events = Vec::new();
        let outcome = self.market_buy(orders, taker, maker_asset_fill_amount, &mut events).await;
        let outcome = outcome.map(|results| (results, events));
        self.finish(rollback, outcome)
    }

    async fn market_sell(
        &mut self,
        orders: &[Order],
        taker: Address,
        taker_asset_fill_amount: U256,
        events: &mut Vec<FillEvent>,
    ) -> Result<FillResults, SimulationError> {
        let mut total = FillResults::default();
        for order in orders {
            let remaining = taker_asset_fill_amount.saturating_sub(total.taker_asset_filled_amount);
            if remaining.is_zero() {
                break;
            }
            let results = self.fill_order(order, taker, remaining, events).await?;
            total = total.checked_add(&results)?;
        }
        Ok(total)
    }

    async fn market_buy(
        &mut self,
        orders: &[Order],
        taker: Address,
        maker_asset_fill_amount: U256,
        events: &mut Vec<FillEvent>,
    ) -> Result<FillResults, SimulationError> {
        let mut total = FillResults::default();
        for order in orders {
            let remaining = maker_asset_fill_amount.saturating_sub(total.maker_asset_filled_amount);
            if remaining.is_zero() {
                break;
            }
            // Rounding the taker amount up makes every order but the last one
            // deliver at least the maker amount still wanted. The result may
            // exceed the target by the rounding of a single fill.
            let taker_asset_fill_amount = get_partial_amount_ceil(
                order.taker_asset_amount,
                order.maker_asset_amount,
                remaining,
            )?;
            let results = self
                .fill_order(order, taker, taker_asset_fill_amount, events)
                .await?;
            total = total.checked_add(&results)?;
        }
        Ok(total)
    }

    /// Fills a single order without rolling back on failure.
    async fn fill_order(
        &mut self,
        order: &Order,
        taker: Address,
        taker_asset_fill_amount: U256,
        events: &mut Vec<FillEvent>,
    ) -> Result<FillResults, SimulationError> {
        let info = self.assert_fillable(order, taker)?;
        if taker_asset_fill_amount.is_zero() {
            return Err(SimulationError::InvalidTakerAssetFillAmount);
        }
        let remaining = order
            .taker_asset_amount
            .safe_sub(info.taker_asset_filled_amount)?;
        let results = calculate_fill_results(order, taker_asset_fill_amount.min(remaining))?;

        self.transfer_all(&[
            Transfer::maker_trade(order, taker, results.maker_asset_filled_amount),
            Transfer::maker_fee(order, results.maker_fee_paid),
            Transfer::taker_trade(order, taker, results.taker_asset_filled_amount),
            Transfer::taker_fee(order, taker, results.taker_fee_paid),
        ])
        .await?;

        events.push(self.record_fill(order, &info, taker, results)?);
        tracing::debug!(hash = %info.hash, ?results, "filled order");
        Ok(results)
    }
}
