//! Contains the order type signed by makers and the order status derived from
//! the exchange's fill state.

use {
    crate::{DomainSeparator, asset::Asset},
    alloy_primitives::{Address, B256, U256, keccak256},
    alloy_sol_types::SolValue,
    serde::{Deserialize, Serialize},
    std::sync::LazyLock,
};

/// An exchange order. Never mutated by the simulator.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub maker_address: Address,
    /// The zero address makes the order fillable by anyone.
    pub taker_address: Address,
    /// The zero address allows any sender.
    pub sender_address: Address,
    pub fee_recipient_address: Address,
    pub maker_asset: Asset,
    pub taker_asset: Asset,
    pub maker_fee_asset: Asset,
    pub taker_fee_asset: Asset,
    pub maker_asset_amount: U256,
    pub taker_asset_amount: U256,
    pub maker_fee: U256,
    pub taker_fee: U256,
    pub salt: U256,
    /// Expiration as a unix timestamp in seconds.
    pub expiration: u64,
}

static ORDER_TYPE_HASH: LazyLock<B256> = LazyLock::new(|| {
    keccak256(
        b"Order(\
        address makerAddress,\
        address takerAddress,\
        address feeRecipientAddress,\
        address senderAddress,\
        uint256 makerAssetAmount,\
        uint256 takerAssetAmount,\
        uint256 makerFee,\
        uint256 takerFee,\
        uint256 expirationTimeSeconds,\
        uint256 salt,\
        bytes makerAssetData,\
        bytes takerAssetData,\
        bytes makerFeeAssetData,\
        bytes takerFeeAssetData\
        )",
    )
});

impl Order {
    /// Returns the value of hashStruct() over the order as defined by
    /// EIP-712.
    ///
    /// https://eips.ethereum.org/EIPS/eip-712#definition-of-hashstruct
    pub fn hash_struct(&self) -> B256 {
        let encoded = (
            *ORDER_TYPE_HASH,
            self.maker_address,
            self.taker_address,
            self.fee_recipient_address,
            self.sender_address,
            self.maker_asset_amount,
            self.taker_asset_amount,
            self.maker_fee,
            self.taker_fee,
            U256::from(self.expiration),
            self.salt,
            keccak256(self.maker_asset.encode()),
            keccak256(self.taker_asset.encode()),
            keccak256(self.maker_fee_asset.encode()),
            keccak256(self.taker_fee_asset.encode()),
        )
            .abi_encode();
        keccak256(encoded)
    }

    /// The order hash the exchange uses to track fills and label events.
    pub fn hash(&self, domain: &DomainSeparator) -> B256 {
        domain.hash_message(&self.hash_struct())
    }

    /// Derives the order's status as the exchange's `getOrderInfo` would.
    pub fn status(&self, filled: U256, cancelled: bool, timestamp: u64) -> OrderStatus {
        if self.maker_asset_amount.is_zero() {
            return OrderStatus::InvalidMakerAssetAmount;
        }
        if self.taker_asset_amount.is_zero() {
            return OrderStatus::InvalidTakerAssetAmount;
        }
        if filled >= self.taker_asset_amount {
            return OrderStatus::FullyFilled;
        }
        if timestamp >= self.expiration {
            return OrderStatus::Expired;
        }
        if cancelled {
            return OrderStatus::Cancelled;
        }
        OrderStatus::Fillable
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "camelCase")]
pub enum OrderStatus {
    InvalidMakerAssetAmount,
    InvalidTakerAssetAmount,
    Fillable,
    Expired,
    FullyFilled,
    Cancelled,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderInfo {
    pub status: OrderStatus,
    pub hash: B256,
    pub taker_asset_filled_amount: U256,
}

#[derive(Clone, Default, Debug)]
pub struct OrderBuilder(Order);

impl OrderBuilder {
    pub fn with_maker(mut self, maker: Address) -> Self {
        self.0.maker_address = maker;
        self
    }

    pub fn with_taker(mut self, taker: Address) -> Self {
        self.0.taker_address = taker;
        self
    }

    pub fn with_sender(mut self, sender: Address) -> Self {
        self.0.sender_address = sender;
        self
    }

    pub fn with_fee_recipient(mut self, fee_recipient: Address) -> Self {
        self.0.fee_recipient_address = fee_recipient;
        self
    }

    pub fn with_maker_asset(mut self, asset: Asset, amount: U256) -> Self {
        self.0.maker_asset = asset;
        self.0.maker_asset_amount = amount;
        self
    }

    pub fn with_taker_asset(mut self, asset: Asset, amount: U256) -> Self {
        self.0.taker_asset = asset;
        self.0.taker_asset_amount = amount;
        self
    }

    pub fn with_maker_fee(mut self, asset: Asset, fee: U256) -> Self {
        self.0.maker_fee_asset = asset;
        self.0.maker_fee = fee;
        self
    }

    pub fn with_taker_fee(mut self, asset: Asset, fee: U256) -> Self {
        self.0.taker_fee_asset = asset;
        self.0.taker_fee = fee;
        self
    }

    pub fn with_salt(mut self, salt: U256) -> Self {
        self.0.salt = salt;
        self
    }

    pub fn with_expiration(mut self, expiration: u64) -> Self {
        self.0.expiration = expiration;
        self
    }

    pub fn build(self) -> Order {
        self.0
    }
}
