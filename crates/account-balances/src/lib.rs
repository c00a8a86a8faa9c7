//! Balances and proxy allowances of asset holders.
//!
//! [`BalanceFetching`] reads the real (on-chain) state and
//! [`BalanceAndAllowanceStore`] caches it lazily so a simulation can mutate a
//! private copy without ever writing back.

mod in_memory;
mod store;

use {
    alloy_primitives::{Address, U256},
    model::AssetKey,
    number::{MathError, u256_ext::SafeMath},
    serde::{Deserialize, Serialize},
    std::collections::BTreeSet,
};

pub use {
    in_memory::StaticBalances,
    store::{BalanceAndAllowanceStore, Checkpoint, LedgerSnapshot},
};

/// Identifies the balance (or allowance) of one owner for one asset unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BalanceKey {
    pub asset: AssetKey,
    pub owner: Address,
}

impl BalanceKey {
    pub fn new(asset: AssetKey, owner: Address) -> Self {
        Self { asset, owner }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Balance {
    Fungible(U256),
    /// The ids of all held tokens.
    NonFungible(BTreeSet<U256>),
}

impl Balance {
    /// The empty balance of the kind `key` tracks.
    pub fn zero(key: &AssetKey) -> Self {
        match key.is_fungible() {
            true => Self::Fungible(U256::ZERO),
            false => Self::NonFungible(BTreeSet::new()),
        }
    }

    /// The fungible amount, or the number of held tokens.
    pub fn amount(&self) -> U256 {
        match self {
            Self::Fungible(amount) => *amount,
            Self::NonFungible(ids) => U256::from(ids.len()),
        }
    }
}

/// Amount an owner approved the asset proxy to move on their behalf.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Allowance {
    Finite(U256),
    /// Infinite approval which transfers never decrease.
    Unlimited,
}

impl Allowance {
    pub fn covers(&self, amount: U256) -> bool {
        match self {
            Self::Finite(allowance) => *allowance >= amount,
            Self::Unlimited => true,
        }
    }

    /// The allowance left after the proxy moved `amount`.
    pub fn consume(self, amount: U256) -> Result<Self, MathError> {
        match self {
            Self::Finite(allowance) => Ok(Self::Finite(allowance.safe_sub(amount)?)),
            Self::Unlimited => Ok(Self::Unlimited),
        }
    }
}

/// On-chain allowances use `U256::MAX` to signal an unlimited approval.
impl From<U256> for Allowance {
    fn from(value: U256) -> Self {
        match value == U256::MAX {
            true => Self::Unlimited,
            false => Self::Finite(value),
        }
    }
}

#[cfg_attr(any(test, feature = "test-util"), mockall::automock)]
#[async_trait::async_trait]
pub trait BalanceFetching: Send + Sync {
    /// Returns the current balance of `owner` for the asset unit `key`.
    async fn fetch_balance(&self, key: &AssetKey, owner: Address) -> anyhow::Result<Balance>;

    /// Returns the allowance `owner` granted the asset proxy responsible for
    /// `key`.
    async fn fetch_allowance(&self, key: &AssetKey, owner: Address)
    -> anyhow::Result<Allowance>;
}
