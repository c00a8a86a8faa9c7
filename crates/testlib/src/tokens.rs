//! Mainnet addresses of commonly used tokens.

use {alloy_primitives::Address, hex_literal::hex};

/// Address for the `WETH` token.
pub const WETH: Address = Address::new(hex!("c02aaa39b223fe8d0a0e5c4f27ead9083c756cc2"));

/// Address for the `DAI` token.
pub const DAI: Address = Address::new(hex!("6B175474E89094C44Da98b954EedeAC495271d0F"));

/// Address for the `USDC` token.
pub const USDC: Address = Address::new(hex!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"));

/// Address for the `ZRX` token.
pub const ZRX: Address = Address::new(hex!("E41d2489571d322189246DaFA5ebDe1F4699F498"));

/// Address for the `CryptoKitties` ERC721 collection.
pub const KITTIES: Address = Address::new(hex!("06012c8cf97BEaD5deAe237070F9587f8E7A266d"));

/// Address of an ERC1155 contract with fungible and non-fungible items.
pub const ITEMS: Address = Address::new(hex!("76BE3b62873462d2142405439777e971754E8E77"));
