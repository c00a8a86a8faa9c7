use {
    crate::{Allowance, Balance, BalanceFetching, BalanceKey},
    alloy_primitives::{Address, U256},
    anyhow::Result,
    model::AssetKey,
    serde::Serialize,
    std::{
        collections::{BTreeMap, HashMap},
        sync::Arc,
    },
};

/// Lazily populated copy of balances and allowances.
///
/// Reads are served from the cache and fall back to the fetcher on a miss.
/// Writes only ever touch the cache. Every write is journaled so a failed
/// simulation can be rolled back to a [`Checkpoint`].
pub struct BalanceAndAllowanceStore {
    fetcher: Arc<dyn BalanceFetching>,
    balances: HashMap<BalanceKey, Balance>,
    allowances: HashMap<BalanceKey, Allowance>,
    journal: Vec<Undo>,
}

enum Undo {
    Balance(BalanceKey, Option<Balance>),
    Allowance(BalanceKey, Option<Allowance>),
}

/// A position in the store's write journal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Checkpoint(usize);

impl BalanceAndAllowanceStore {
    pub fn new(fetcher: Arc<dyn BalanceFetching>) -> Self {
        Self {
            fetcher,
            balances: Default::default(),
            allowances: Default::default(),
            journal: Default::default(),
        }
    }

    pub async fn get_balance(&mut self, key: &AssetKey, owner: Address) -> Result<Balance> {
        let cache_key = BalanceKey::new(*key, owner);
        if let Some(balance) = self.balances.get(&cache_key) {
            return Ok(balance.clone());
        }
        tracing::debug!(?key, %owner, "balance cache miss");
        let balance = self.fetcher.fetch_balance(key, owner).await?;
        self.balances.insert(cache_key, balance.clone());
        Ok(balance)
    }

    pub fn set_balance(&mut self, key: &AssetKey, owner: Address, balance: Balance) {
        let cache_key = BalanceKey::new(*key, owner);
        let previous = self.balances.insert(cache_key, balance);
        self.journal.push(Undo::Balance(cache_key, previous));
    }

    /// Drops the cached balance so the next read fetches it again.
    pub fn delete_balance(&mut self, key: &AssetKey, owner: Address) {
        let cache_key = BalanceKey::new(*key, owner);
        if let Some(previous) = self.balances.remove(&cache_key) {
            self.journal.push(Undo::Balance(cache_key, Some(previous)));
        }
    }

    /// Allowances are tracked per approval scope, see
    /// [`AssetKey::approval_key`].
    pub async fn get_allowance(&mut self, key: &AssetKey, owner: Address) -> Result<Allowance> {
        let key = key.approval_key();
        let cache_key = BalanceKey::new(key, owner);
        if let Some(allowance) = self.allowances.get(&cache_key) {
            return Ok(*allowance);
        }
        tracing::debug!(?key, %owner, "allowance cache miss");
        let allowance = self.fetcher.fetch_allowance(&key, owner).await?;
        self.allowances.insert(cache_key, allowance);
        Ok(allowance)
    }

    pub fn set_allowance(&mut self, key: &AssetKey, owner: Address, allowance: Allowance) {
        let cache_key = BalanceKey::new(key.approval_key(), owner);
        let previous = self.allowances.insert(cache_key, allowance);
        self.journal.push(Undo::Allowance(cache_key, previous));
    }

    pub fn delete_allowance(&mut self, key: &AssetKey, owner: Address) {
        let cache_key = BalanceKey::new(key.approval_key(), owner);
        if let Some(previous) = self.allowances.remove(&cache_key) {
            self.journal
                .push(Undo::Allowance(cache_key, Some(previous)));
        }
    }

    /// Forgets all cached state and the write journal.
    pub fn clear_all(&mut self) {
        self.balances.clear();
        self.allowances.clear();
        self.journal.clear();
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint(self.journal.len())
    }

    /// Undoes all writes made after `checkpoint`, newest first.
    pub fn revert_to(&mut self, checkpoint: Checkpoint) {
        let reverted = self.journal.len().saturating_sub(checkpoint.0);
        while self.journal.len() > checkpoint.0 {
            let Some(undo) = self.journal.pop() else {
                break;
            };
            match undo {
                Undo::Balance(key, Some(balance)) => {
                    self.balances.insert(key, balance);
                }
                Undo::Balance(key, None) => {
                    self.balances.remove(&key);
                }
                Undo::Allowance(key, Some(allowance)) => {
                    self.allowances.insert(key, allowance);
                }
                Undo::Allowance(key, None) => {
                    self.allowances.remove(&key);
                }
            }
        }
        if reverted > 0 {
            tracing::debug!(reverted, "reverted ledger writes");
        }
    }

    /// Keeps all writes made after `checkpoint` and forgets how to undo them.
    pub fn commit(&mut self, checkpoint: Checkpoint) {
        self.journal.truncate(checkpoint.0);
    }

    /// Copies the currently cached state.
    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            balances: self
                .balances
                .iter()
                .map(|(key, balance)| (*key, balance.clone()))
                .collect(),
            allowances: self
                .allowances
                .iter()
                .map(|(key, allowance)| (*key, *allowance))
                .collect(),
        }
    }
}

/// Point in time copy of a store's cached balances and allowances.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct LedgerSnapshot {
    pub balances: BTreeMap<BalanceKey, Balance>,
    pub allowances: BTreeMap<BalanceKey, Allowance>,
}

impl LedgerSnapshot {
    pub fn balance(&self, key: &AssetKey, owner: Address) -> Option<&Balance> {
        self.balances.get(&BalanceKey::new(*key, owner))
    }

    pub fn allowance(&self, key: &AssetKey, owner: Address) -> Option<&Allowance> {
        self.allowances
            .get(&BalanceKey::new(key.approval_key(), owner))
    }

    /// Sum of all cached balances of `key`.
    pub fn total(&self, key: &AssetKey) -> U256 {
        self.balances
            .iter()
            .filter(|(balance_key, _)| balance_key.asset == *key)
            .fold(U256::ZERO, |total, (_, balance)| {
                total.saturating_add(balance.amount())
            })
    }
}
