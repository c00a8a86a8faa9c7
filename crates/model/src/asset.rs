//! Asset data as understood by the exchange's asset proxies.
//!
//! On-chain an asset is an opaque byte string whose first four bytes (the
//! proxy id) select the proxy contract that moves it. The remaining bytes are
//! the ABI encoded arguments of that proxy's pseudo function.

use {
    alloy_primitives::{Address, Bytes, FixedBytes, U256},
    alloy_sol_types::SolCall,
    serde::{Deserialize, Serialize},
    thiserror::Error,
};

mod abi {
    alloy_sol_types::sol! {
        function ERC20Token(address tokenAddress);
        function ERC721Token(address tokenAddress, uint256 tokenId);
        function ERC1155Assets(
            address tokenAddress,
            uint256[] tokenIds,
            uint256[] tokenValues,
            bytes callbackData
        );
        function MultiAsset(uint256[] amounts, bytes[] nestedAssetData);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
pub enum AssetProxyId {
    #[strum(serialize = "ERC20")]
    Erc20,
    #[strum(serialize = "ERC721")]
    Erc721,
    #[strum(serialize = "ERC1155")]
    Erc1155,
    MultiAsset,
}

impl AssetProxyId {
    pub fn selector(self) -> FixedBytes<4> {
        FixedBytes(match self {
            Self::Erc20 => abi::ERC20TokenCall::SELECTOR,
            Self::Erc721 => abi::ERC721TokenCall::SELECTOR,
            Self::Erc1155 => abi::ERC1155AssetsCall::SELECTOR,
            Self::MultiAsset => abi::MultiAssetCall::SELECTOR,
        })
    }

    pub fn from_selector(selector: FixedBytes<4>) -> Result<Self, DecodeError> {
        [Self::Erc20, Self::Erc721, Self::Erc1155, Self::MultiAsset]
            .into_iter()
            .find(|id| id.selector() == selector)
            .ok_or(DecodeError::UnhandledAssetProxyId(selector))
    }
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("asset data is shorter than a proxy id")]
    TooShort,
    #[error("unhandled asset proxy id {0}")]
    UnhandledAssetProxyId(FixedBytes<4>),
    #[error("asset lists have different lengths")]
    LengthMismatch,
    #[error(transparent)]
    Abi(#[from] alloy_sol_types::Error),
}

/// A decoded asset.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Asset {
    Erc20 {
        token: Address,
    },
    Erc721 {
        token: Address,
        token_id: U256,
    },
    Erc1155 {
        token: Address,
        token_ids: Vec<U256>,
        token_values: Vec<U256>,
    },
    /// A bundle of assets. Transferring `amount` of the bundle transfers
    /// `amount * amounts[i]` of every `nested_assets[i]`.
    MultiAsset {
        amounts: Vec<U256>,
        nested_assets: Vec<Asset>,
    },
}

/// Placeholder used by builders for fields that are expected to be
/// overwritten.
impl Default for Asset {
    fn default() -> Self {
        Self::Erc20 {
            token: Address::ZERO,
        }
    }
}

impl Asset {
    pub fn erc20(token: Address) -> Self {
        Self::Erc20 { token }
    }

    pub fn erc721(token: Address, token_id: U256) -> Self {
        Self::Erc721 { token, token_id }
    }

    pub fn proxy_id(&self) -> AssetProxyId {
        match self {
            Self::Erc20 { .. } => AssetProxyId::Erc20,
            Self::Erc721 { .. } => AssetProxyId::Erc721,
            Self::Erc1155 { .. } => AssetProxyId::Erc1155,
            Self::MultiAsset { .. } => AssetProxyId::MultiAsset,
        }
    }

    /// Checks that paired lists have equal lengths, recursing into nested
    /// assets.
    pub fn validate(&self) -> Result<(), DecodeError> {
        match self {
            Self::Erc20 { .. } | Self::Erc721 { .. } => Ok(()),
            Self::Erc1155 {
                token_ids,
                token_values,
                ..
            } => match token_ids.len() == token_values.len() {
                true => Ok(()),
                false => Err(DecodeError::LengthMismatch),
            },
            Self::MultiAsset {
                amounts,
                nested_assets,
            } => {
                if amounts.len() != nested_assets.len() {
                    return Err(DecodeError::LengthMismatch);
                }
                nested_assets.iter().try_for_each(Asset::validate)
            }
        }
    }

    /// ABI encodes the asset data including its proxy id.
    pub fn encode(&self) -> Bytes {
        match self {
            Self::Erc20 { token } => abi::ERC20TokenCall {
                tokenAddress: *token,
            }
            .abi_encode(),
            Self::Erc721 { token, token_id } => abi::ERC721TokenCall {
                tokenAddress: *token,
                tokenId: *token_id,
            }
            .abi_encode(),
            Self::Erc1155 {
                token,
                token_ids,
                token_values,
            } => abi::ERC1155AssetsCall {
                tokenAddress: *token,
                tokenIds: token_ids.clone(),
                tokenValues: token_values.clone(),
                callbackData: Bytes::new(),
            }
            .abi_encode(),
            Self::MultiAsset {
                amounts,
                nested_assets,
            } => abi::MultiAssetCall {
                amounts: amounts.clone(),
                nestedAssetData: nested_assets.iter().map(Asset::encode).collect(),
            }
            .abi_encode(),
        }
        .into()
    }

    /// Decodes asset data. ERC1155 callback data is not needed for
    /// simulation and gets dropped.
    pub fn decode(data: &[u8]) -> Result<Self, DecodeError> {
        let selector = data.get(..4).ok_or(DecodeError::TooShort)?;
        let asset = match AssetProxyId::from_selector(FixedBytes::from_slice(selector))? {
            AssetProxyId::Erc20 => {
                let call = abi::ERC20TokenCall::abi_decode(data)?;
                Self::Erc20 {
                    token: call.tokenAddress,
                }
            }
            AssetProxyId::Erc721 => {
                let call = abi::ERC721TokenCall::abi_decode(data)?;
                Self::Erc721 {
                    token: call.tokenAddress,
                    token_id: call.tokenId,
                }
            }
            AssetProxyId::Erc1155 => {
                let call = abi::ERC1155AssetsCall::abi_decode(data)?;
                Self::Erc1155 {
                    token: call.tokenAddress,
                    token_ids: call.tokenIds,
                    token_values: call.tokenValues,
                }
            }
            AssetProxyId::MultiAsset => {
                let call = abi::MultiAssetCall::abi_decode(data)?;
                Self::MultiAsset {
                    amounts: call.amounts,
                    nested_assets: call
                        .nestedAssetData
                        .iter()
                        .map(|nested| Asset::decode(nested))
                        .collect::<Result<_, _>>()?,
                }
            }
        };
        asset.validate()?;
        Ok(asset)
    }
}

/// Identifies the unit of an asset contract that balances are tracked for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AssetKey {
    Erc20(Address),
    /// An ERC721 collection. Balances are the sets of held token ids.
    Erc721(Address),
    /// An ERC1155 contract as a whole. Balances are the sets of held
    /// non-fungible ids and the allowance is the contract wide operator
    /// approval.
    Erc1155(Address),
    /// A fungible token type of an ERC1155 contract.
    Erc1155Fungible(Address, U256),
}

impl AssetKey {
    /// ERC1155 ids with the top bit set are non-fungible.
    pub fn is_non_fungible_erc1155_id(id: U256) -> bool {
        id.bit(255)
    }

    /// The key holding `token_id` of the ERC1155 contract `token`.
    pub fn erc1155(token: Address, token_id: U256) -> Self {
        match Self::is_non_fungible_erc1155_id(token_id) {
            true => Self::Erc1155(token),
            false => Self::Erc1155Fungible(token, token_id),
        }
    }

    pub fn token(&self) -> Address {
        match self {
            Self::Erc20(token)
            | Self::Erc721(token)
            | Self::Erc1155(token)
            | Self::Erc1155Fungible(token, _) => *token,
        }
    }

    /// The key the proxy approval for this unit is tracked under.
    pub fn approval_key(&self) -> Self {
        match self {
            Self::Erc1155Fungible(token, _) => Self::Erc1155(*token),
            key => *key,
        }
    }

    pub fn is_fungible(&self) -> bool {
        matches!(self, Self::Erc20(_) | Self::Erc1155Fungible(..))
    }
}
