//! Distinct accounts for simulated trades.

use alloy_primitives::Address;

pub const MAKER: Address = Address::repeat_byte(0x11);
pub const TAKER: Address = Address::repeat_byte(0x22);
pub const FEE_RECIPIENT: Address = Address::repeat_byte(0x33);
pub const OTHER_MAKER: Address = Address::repeat_byte(0x44);
pub const OTHER_FEE_RECIPIENT: Address = Address::repeat_byte(0x55);
pub const MATCHER: Address = Address::repeat_byte(0x66);
