//! Off-chain simulation of the exchange's order settlement.
//!
//! A [`Simulator`] owns a private copy of the balances and allowances it
//! touches, lazily populated from a [`BalanceFetching`] implementation, and
//! replays fills and matches against it exactly like the exchange contract
//! would. Nothing is ever written back to the source of the balances.
//!
//! Every simulation is atomic: if any step fails, the ledger and the
//! per-order fill state are restored to what they were before the call.

pub mod config;
pub mod error;
mod fill;
mod matching;
pub mod transfer;

pub use {
    config::{Config, MatchMode},
    error::{SimulationError, TradeSide, TransferError, TransferType},
    fill::calculate_fill_results,
    matching::calculate_matched_fill_results,
};
use {
    account_balances::{BalanceAndAllowanceStore, BalanceFetching, Checkpoint, LedgerSnapshot},
    alloy_primitives::{Address, B256, U256},
    model::{Asset, DomainSeparator, FillEvent, FillResults, Order, OrderInfo, OrderStatus},
    number::u256_ext::SafeMath,
    serde::Serialize,
    std::{
        collections::{HashMap, HashSet},
        sync::Arc,
    },
    transfer::Transfer,
};

/// Outcome of a successful simulation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResult<R = FillResults> {
    pub results: R,
    /// One event per filled order in the order the exchange emits them.
    pub events: Vec<FillEvent>,
    /// The simulator's ledger after the simulation.
    pub ledger: LedgerSnapshot,
}

pub struct Simulator {
    store: BalanceAndAllowanceStore,
    config: Config,
    domain: DomainSeparator,
    /// Taker asset amounts filled so far, by order hash.
    filled: HashMap<B256, U256>,
    cancelled: HashSet<B256>,
}

/// Everything needed to undo a failed simulation.
struct Rollback {
    checkpoint: Checkpoint,
    filled: HashMap<B256, U256>,
}

impl Simulator {
    pub fn new(config: Config, fetcher: Arc<dyn BalanceFetching>) -> Self {
        let domain = DomainSeparator::new(config.chain_id, config.exchange_address);
        Self {
            store: BalanceAndAllowanceStore::new(fetcher),
            config,
            domain,
            filled: Default::default(),
            cancelled: Default::default(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn set_block_timestamp(&mut self, timestamp: u64) {
        self.config.block_timestamp = timestamp;
    }

    /// Direct access to the ledger, e.g. to seed or invalidate cached state
    /// between simulations.
    pub fn store(&mut self) -> &mut BalanceAndAllowanceStore {
        &mut self.store
    }

    pub fn ledger(&self) -> LedgerSnapshot {
        self.store.snapshot()
    }

    pub fn order_hash(&self, order: &Order) -> B256 {
        order.hash(&self.domain)
    }

    /// Status and fill state of `order` at the configured block timestamp.
    pub fn order_info(&self, order: &Order) -> OrderInfo {
        let hash = self.order_hash(order);
        let filled = self.filled.get(&hash).copied().unwrap_or_default();
        OrderInfo {
            status: order.status(
                filled,
                self.cancelled.contains(&hash),
                self.config.block_timestamp,
            ),
            hash,
            taker_asset_filled_amount: filled,
        }
    }

    /// Overrides the taker asset amount the exchange has already filled.
    pub fn set_filled(&mut self, order: &Order, taker_asset_filled_amount: U256) {
        self.filled
            .insert(self.order_hash(order), taker_asset_filled_amount);
    }

    /// Cancels `order` if it is still fillable, otherwise does nothing.
    pub fn cancel_order(&mut self, order: &Order) {
        let info = self.order_info(order);
        if info.status == OrderStatus::Fillable {
            tracing::debug!(hash = %info.hash, "cancelled order");
            self.cancelled.insert(info.hash);
        }
    }

    /// Moves the asset encoded in `asset_data` like the matching asset proxy
    /// would.
    #[tracing::instrument(skip_all, fields(%from, %to, %amount))]
    pub async fn transfer(
        &mut self,
        asset_data: &[u8],
        from: Address,
        to: Address,
        amount: U256,
        side: TradeSide,
        kind: TransferType,
    ) -> Result<LedgerSnapshot, TransferError> {
        let asset = Asset::decode(asset_data)?;
        let checkpoint = self.store.checkpoint();
        let transfer = Transfer {
            asset: &asset,
            from,
            to,
            amount,
            side,
            kind,
        };
        match transfer::transfer(&mut self.store, transfer).await {
            Ok(()) => {
                self.store.commit(checkpoint);
                Ok(self.store.snapshot())
            }
            Err(err) => {
                self.store.revert_to(checkpoint);
                Err(err)
            }
        }
    }

    fn begin(&self) -> Rollback {
        Rollback {
            checkpoint: self.store.checkpoint(),
            filled: self.filled.clone(),
        }
    }

    fn finish<R>(
        &mut self,
        rollback: Rollback,
        outcome: Result<(R, Vec<FillEvent>), SimulationError>,
    ) -> Result<SimulationResult<R>, SimulationError> {
        match outcome {
            Ok((results, events)) => {
                self.store.commit(rollback.checkpoint);
                Ok(SimulationResult {
                    results,
                    events,
                    ledger: self.store.snapshot(),
                })
            }
            Err(err) => {
                tracing::debug!(?err, "simulation failed, reverting");
                self.store.revert_to(rollback.checkpoint);
                self.filled = rollback.filled;
                Err(err)
            }
        }
    }

    /// Checks that `taker` may fill `order` right now.
    fn assert_fillable(&self, order: &Order, taker: Address) -> Result<OrderInfo, SimulationError> {
        let info = self.order_info(order);
        match info.status {
            OrderStatus::Fillable => (),
            // Nothing is left to sell.
            OrderStatus::FullyFilled => {
                return Err(SimulationError::insufficient_balance(
                    TradeSide::Maker,
                    TransferType::Trade,
                ));
            }
            status => return Err(SimulationError::OrderNotFillable(status)),
        }
        if !order.taker_address.is_zero() && order.taker_address != taker {
            return Err(SimulationError::InvalidTaker);
        }
        // The taker submits the transaction, so it is the sender as well.
        if !order.sender_address.is_zero() && order.sender_address != taker {
            return Err(SimulationError::InvalidSender);
        }
        Ok(info)
    }

    fn record_fill(
        &mut self,
        order: &Order,
        info: &OrderInfo,
        taker: Address,
        results: FillResults,
    ) -> Result<FillEvent, SimulationError> {
        let filled = info
            .taker_asset_filled_amount
            .safe_add(results.taker_asset_filled_amount)?;
        self.filled.insert(info.hash, filled);
        Ok(FillEvent {
            maker_address: order.maker_address,
            fee_recipient_address: order.fee_recipient_address,
            taker_address: taker,
            sender_address: taker,
            fill_results: results,
            order_hash: info.hash,
            maker_asset: order.maker_asset.clone(),
            taker_asset: order.taker_asset.clone(),
        })
    }

    async fn transfer_all(&mut self, transfers: &[Transfer<'_>]) -> Result<(), TransferError> {
        for transfer in transfers {
            transfer::transfer(&mut self.store, *transfer).await?;
        }
        Ok(())
    }
}
