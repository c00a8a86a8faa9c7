//! Moves assets between ledger accounts the way the exchange's asset proxies
//! would, including their balance and allowance checks.

use {
    crate::error::{TradeSide, TransferError, TransferType},
    account_balances::{Allowance, Balance, BalanceAndAllowanceStore},
    alloy_primitives::{Address, U256},
    futures::{FutureExt, future::BoxFuture},
    model::{Asset, AssetKey, Order},
    number::u256_ext::SafeMath,
};

/// A single asset movement requested by a fill or a match.
#[derive(Clone, Copy, Debug)]
pub struct Transfer<'a> {
    pub asset: &'a Asset,
    pub from: Address,
    pub to: Address,
    pub amount: U256,
    pub side: TradeSide,
    pub kind: TransferType,
}

impl<'a> Transfer<'a> {
    /// The maker of `order` selling its maker asset to `to`.
    pub fn maker_trade(order: &'a Order, to: Address, amount: U256) -> Self {
        Self {
            asset: &order.maker_asset,
            from: order.maker_address,
            to,
            amount,
            side: TradeSide::Maker,
            kind: TransferType::Trade,
        }
    }

    pub fn maker_fee(order: &'a Order, amount: U256) -> Self {
        Self {
            asset: &order.maker_fee_asset,
            from: order.maker_address,
            to: order.fee_recipient_address,
            amount,
            side: TradeSide::Maker,
            kind: TransferType::Fee,
        }
    }

    /// The taker paying the maker of `order` in the order's taker asset.
    pub fn taker_trade(order: &'a Order, taker: Address, amount: U256) -> Self {
        Self {
            asset: &order.taker_asset,
            from: taker,
            to: order.maker_address,
            amount,
            side: TradeSide::Taker,
            kind: TransferType::Trade,
        }
    }

    pub fn taker_fee(order: &'a Order, taker: Address, amount: U256) -> Self {
        Self {
            asset: &order.taker_fee_asset,
            from: taker,
            to: order.fee_recipient_address,
            amount,
            side: TradeSide::Taker,
            kind: TransferType::Fee,
        }
    }

    /// Orders without a designated taker are simulated with the zero address
    /// as taker, which pays nothing and skips all checks.
    fn is_open_order_taker(&self) -> bool {
        self.from.is_zero() && self.side == TradeSide::Taker
    }

    fn insufficient_balance(&self) -> TransferError {
        TransferError::InsufficientBalance {
            side: self.side,
            kind: self.kind,
        }
    }

    fn insufficient_allowance(&self) -> TransferError {
        TransferError::InsufficientAllowance {
            side: self.side,
            kind: self.kind,
        }
    }
}

/// Applies `transfer` to the store.
///
/// Multi assets recurse into their nested assets in array order, so later
/// legs observe the balances left by earlier ones. A failing leg leaves the
/// writes of earlier legs in place; callers revert through the store's
/// journal.
pub fn transfer<'a>(
    store: &'a mut BalanceAndAllowanceStore,
    transfer: Transfer<'a>,
) -> BoxFuture<'a, Result<(), TransferError>> {
    async move {
        if transfer.amount.is_zero() {
            return Ok(());
        }
        tracing::debug!(
            asset = ?transfer.asset.proxy_id(),
            from = %transfer.from,
            to = %transfer.to,
            amount = %transfer.amount,
            side = %transfer.side,
            kind = %transfer.kind,
            "transfer"
        );
        match transfer.asset {
            Asset::Erc20 { token } => {
                let key = AssetKey::Erc20(*token);
                check_and_consume_allowance(store, &key, &transfer, transfer.amount, true)
                    .await?;
                move_fungible(store, &key, &transfer, transfer.amount).await
            }
            Asset::Erc721 { token, token_id } => {
                let key = AssetKey::Erc721(*token);
                check_and_consume_allowance(store, &key, &transfer, transfer.amount, true)
                    .await?;
                move_non_fungible(store, &key, &transfer, transfer.amount, *token_id).await
            }
            Asset::Erc1155 {
                token,
                token_ids,
                token_values,
            } => {
                for (id, value) in token_ids.iter().zip(token_values) {
                    let amount = transfer.amount.safe_mul(*value)?;
                    let key = AssetKey::erc1155(*token, *id);
                    check_and_consume_allowance(store, &key, &transfer, amount, false).await?;
                    match key.is_fungible() {
                        true => move_fungible(store, &key, &transfer, amount).await?,
                        false => move_non_fungible(store, &key, &transfer, amount, *id).await?,
                    }
                }
                Ok(())
            }
            Asset::MultiAsset {
                amounts,
                nested_assets,
            } => {
                for (amount, asset) in amounts.iter().zip(nested_assets) {
                    let nested = Transfer {
                        asset,
                        amount: transfer.amount.safe_mul(*amount)?,
                        ..transfer
                    };
                    self::transfer(store, nested).await?;
                }
                Ok(())
            }
        }
    }
    .boxed()
}

/// Fails if the proxy may not move `amount` on behalf of the sender and
/// otherwise uses up that much of the allowance.
async fn check_and_consume_allowance(
    store: &mut BalanceAndAllowanceStore,
    key: &AssetKey,
    transfer: &Transfer<'_>,
    amount: U256,
    decrement: bool,
) -> Result<(), TransferError> {
    if transfer.is_open_order_taker() {
        return Ok(());
    }
    let allowance = store.get_allowance(key, transfer.from).await?;
    if !allowance.covers(amount) {
        return Err(transfer.insufficient_allowance());
    }
    if decrement && allowance != Allowance::Unlimited {
        store.set_allowance(key, transfer.from, allowance.consume(amount)?);
    }
    Ok(())
}

async fn move_fungible(
    store: &mut BalanceAndAllowanceStore,
    key: &AssetKey,
    transfer: &Transfer<'_>,
    amount: U256,
) -> Result<(), TransferError> {
    if !transfer.is_open_order_taker() {
        let balance = store.get_balance(key, transfer.from).await?.amount();
        if balance < amount {
            return Err(transfer.insufficient_balance());
        }
        store.set_balance(
            key,
            transfer.from,
            Balance::Fungible(balance.safe_sub(amount)?),
        );
    }
    let balance = store.get_balance(key, transfer.to).await?.amount();
    store.set_balance(key, transfer.to, Balance::Fungible(balance.safe_add(amount)?));
    Ok(())
}

/// Moves the token `id`. The balance check compares against the number of
/// held tokens of the collection.
async fn move_non_fungible(
    store: &mut BalanceAndAllowanceStore,
    key: &AssetKey,
    transfer: &Transfer<'_>,
    amount: U256,
    id: U256,
) -> Result<(), TransferError> {
    if transfer.is_open_order_taker() {
        let mut held = held_ids(store, key, transfer.to).await?;
        held.insert(id);
        store.set_balance(key, transfer.to, Balance::NonFungible(held));
        return Ok(());
    }

    let mut from_held = held_ids(store, key, transfer.from).await?;
    if U256::from(from_held.len()) < amount {
        return Err(transfer.insufficient_balance());
    }
    // A token the sender no longer holds is skipped without an error.
    // Partial fill simulations rely on this when the token moved earlier.
    if !from_held.remove(&id) {
        tracing::warn!(?key, %id, owner = %transfer.from, "non-fungible token not held, skipping");
        return Ok(());
    }
    store.set_balance(key, transfer.from, Balance::NonFungible(from_held));

    let mut to_held = held_ids(store, key, transfer.to).await?;
    to_held.insert(id);
    store.set_balance(key, transfer.to, Balance::NonFungible(to_held));
    Ok(())
}

async fn held_ids(
    store: &mut BalanceAndAllowanceStore,
    key: &AssetKey,
    owner: Address,
) -> Result<std::collections::BTreeSet<U256>, TransferError> {
    match store.get_balance(key, owner).await? {
        Balance::NonFungible(ids) => Ok(ids),
        // Fetchers that report non-fungible holdings as a plain count carry no
        // ids that could be moved.
        Balance::Fungible(_) => Ok(Default::default()),
    }
}
