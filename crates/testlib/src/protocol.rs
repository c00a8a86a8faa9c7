//! Mainnet addresses of protocol contracts.

use {alloy_primitives::Address, hex_literal::hex};

/// Address for the exchange contract.
pub const EXCHANGE: Address = Address::new(hex!("61935CbDd02287B511119DDb11Aeb42F1593b7Ef"));
