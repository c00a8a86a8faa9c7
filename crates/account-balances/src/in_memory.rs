use {
    crate::{Allowance, Balance, BalanceFetching, BalanceKey},
    alloy_primitives::{Address, U256},
    model::AssetKey,
    std::collections::HashMap,
};

/// Balance fetcher serving a fixed set of balances and allowances. Unknown
/// keys are empty balances and zero allowances.
#[derive(Clone, Debug, Default)]
pub struct StaticBalances {
    balances: HashMap<BalanceKey, Balance>,
    allowances: HashMap<BalanceKey, Allowance>,
}

impl StaticBalances {
    pub fn new(
        balances: HashMap<BalanceKey, Balance>,
        allowances: HashMap<BalanceKey, Allowance>,
    ) -> Self {
        Self {
            balances,
            allowances,
        }
    }

    pub fn with_balance(mut self, key: AssetKey, owner: Address, balance: Balance) -> Self {
        self.balances.insert(BalanceKey::new(key, owner), balance);
        self
    }

    pub fn with_allowance(mut self, key: AssetKey, owner: Address, allowance: Allowance) -> Self {
        self.allowances
            .insert(BalanceKey::new(key.approval_key(), owner), allowance);
        self
    }
}

#[async_trait::async_trait]
impl BalanceFetching for StaticBalances {
    async fn fetch_balance(&self, key: &AssetKey, owner: Address) -> anyhow::Result<Balance> {
        Ok(self
            .balances
            .get(&BalanceKey::new(*key, owner))
            .cloned()
            .unwrap_or_else(|| Balance::zero(key)))
    }

    async fn fetch_allowance(&self, key: &AssetKey, owner: Address) -> anyhow::Result<Allowance> {
        Ok(self
            .allowances
            .get(&BalanceKey::new(key.approval_key(), owner))
            .copied()
            .unwrap_or(Allowance::Finite(U256::ZERO)))
    }
}
