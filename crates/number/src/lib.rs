//! Exact 256-bit arithmetic mirroring the exchange contract's math library.
//!
//! Every operation fails exactly where the on-chain code would revert, so the
//! off-chain simulation can reproduce settlement outcomes bit for bit.

pub mod partial;
pub mod u256_ext;

use {alloy_primitives::U256, thiserror::Error};

pub use partial::{
    Rounding,
    get_partial_amount_ceil,
    get_partial_amount_floor,
    is_rounding_error_ceil,
    is_rounding_error_floor,
    mul_div,
    safe_get_partial_amount_ceil,
    safe_get_partial_amount_floor,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MathError {
    #[error("division by zero")]
    DivisionByZero,
    #[error("multiplication overflow")]
    MultiplicationOverflow,
    #[error("addition overflow")]
    AdditionOverflow,
    #[error("subtraction underflow")]
    SubtractionUnderflow,
    #[error("rounding error computing {numerator} * {target} / {denominator}")]
    RoundingError {
        numerator: U256,
        denominator: U256,
        target: U256,
    },
}
