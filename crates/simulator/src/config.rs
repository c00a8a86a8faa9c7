use {
    alloy_primitives::Address,
    anyhow::Context,
    serde::Deserialize,
    std::path::Path,
    tokio::fs,
};

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    /// Chain the simulated exchange is deployed on. Part of the order hash
    /// domain.
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,

    /// Address of the simulated exchange contract. Part of the order hash
    /// domain.
    #[serde(default)]
    pub exchange_address: Address,

    /// How two orders get matched.
    #[serde(default)]
    pub match_mode: MatchMode,

    /// Timestamp of the simulated block in seconds. Orders expiring at or
    /// before it are not fillable.
    #[serde(default)]
    pub block_timestamp: u64,
}

fn default_chain_id() -> u64 {
    1
}

impl Default for Config {
    fn default() -> Self {
        Self {
            chain_id: default_chain_id(),
            exchange_address: Address::ZERO,
            match_mode: MatchMode::default(),
            block_timestamp: 0,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum MatchMode {
    /// The right order is filled as far as the left order allows. The
    /// matcher keeps the left maker asset spread.
    #[default]
    Standard,
    /// Both orders are filled as much as possible. The matcher may keep a
    /// spread in either asset.
    MaximalFill,
}

impl Config {
    /// Loads the simulator configuration from a TOML file.
    pub async fn load(path: &Path) -> anyhow::Result<Self> {
        let data = fs::read_to_string(path)
            .await
            .with_context(|| format!("I/O error while reading {path:?}"))?;
        toml::de::from_str(&data).with_context(|| format!("TOML syntax error while reading {path:?}"))
    }
}
