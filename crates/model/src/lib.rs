//! Contains the exchange models shared between the balance store and the
//! settlement simulator.

pub mod asset;
pub mod event;
pub mod fill;
pub mod order;

use {
    alloy_primitives::{Address, B256, U256, keccak256},
    alloy_sol_types::SolValue,
    std::fmt,
};

pub use {
    asset::{Asset, AssetKey, AssetProxyId},
    event::FillEvent,
    fill::{FillResults, MatchedFillResults},
    order::{Order, OrderBuilder, OrderInfo, OrderStatus},
};

/// EIP-712 domain name of the exchange contract.
pub const DOMAIN_NAME: &str = "0x Protocol";
/// EIP-712 domain version of the exchange contract.
pub const DOMAIN_VERSION: &str = "3.0.0";

#[derive(Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct DomainSeparator(pub B256);

impl fmt::Debug for DomainSeparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl DomainSeparator {
    pub fn new(chain_id: u64, exchange: Address) -> Self {
        let type_hash = keccak256(
            b"EIP712Domain(string name,string version,uint256 chainId,address verifyingContract)",
        );
        let encoded = (
            type_hash,
            keccak256(DOMAIN_NAME.as_bytes()),
            keccak256(DOMAIN_VERSION.as_bytes()),
            U256::from(chain_id),
            exchange,
        )
            .abi_encode();
        Self(keccak256(encoded))
    }

    /// Hashes an EIP-712 struct hash for this domain.
    ///
    /// https://eips.ethereum.org/EIPS/eip-712#specification
    pub fn hash_message(&self, struct_hash: &B256) -> B256 {
        let mut message = [0u8; 66];
        message[0..2].copy_from_slice(&[0x19, 0x01]);
        message[2..34].copy_from_slice(self.0.as_slice());
        message[34..66].copy_from_slice(struct_hash.as_slice());
        keccak256(message)
    }
}
