//! Partial amount computations.
//!
//! All functions take `(numerator, denominator, target)` and operate on
//! `numerator * target / denominator`, which is how the exchange scales an
//! order's amounts by the fraction that gets filled.

use {
    crate::{MathError, u256_ext::SafeMath},
    alloy_primitives::U256,
};

/// The exchange rejects partial amounts whose relative rounding error is at
/// least `1 / ROUNDING_ERROR_DIVISOR` (0.1%).
const ROUNDING_ERROR_DIVISOR: u64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rounding {
    Down,
    Up,
}

/// Computes `numerator * target / denominator` with the requested rounding.
///
/// Works like the smart contract: the intermediate product must fit into 256
/// bits even when the final result would, and rounding up adds
/// `denominator - 1` before dividing, which may overflow as well.
pub fn mul_div(
    numerator: U256,
    denominator: U256,
    target: U256,
    rounding: Rounding,
) -> Result<U256, MathError> {
    if denominator.is_zero() {
        return Err(MathError::DivisionByZero);
    }
    let product = numerator.safe_mul(target)?;
    match rounding {
        Rounding::Down => product.safe_div(denominator),
        Rounding::Up => product
            .safe_add(denominator - U256::from(1))?
            .safe_div(denominator),
    }
}

/// Checks if rounding `numerator * target / denominator` in the given
/// direction introduces an error of 0.1% or more.
pub fn is_rounding_error(
    numerator: U256,
    denominator: U256,
    target: U256,
    rounding: Rounding,
) -> Result<bool, MathError> {
    if denominator.is_zero() {
        return Err(MathError::DivisionByZero);
    }
    // The exact result is zero, so there is nothing to round.
    if numerator.is_zero() || target.is_zero() {
        return Ok(false);
    }
    let product = numerator.safe_mul(target)?;
    let remainder = product % denominator;
    let remainder = match rounding {
        Rounding::Down => remainder,
        Rounding::Up => (denominator - remainder) % denominator,
    };
    Ok(U256::from(ROUNDING_ERROR_DIVISOR).safe_mul(remainder)? >= product)
}

pub fn is_rounding_error_floor(
    numerator: U256,
    denominator: U256,
    target: U256,
) -> Result<bool, MathError> {
    is_rounding_error(numerator, denominator, target, Rounding::Down)
}

pub fn is_rounding_error_ceil(
    numerator: U256,
    denominator: U256,
    target: U256,
) -> Result<bool, MathError> {
    is_rounding_error(numerator, denominator, target, Rounding::Up)
}

pub fn get_partial_amount_floor(
    numerator: U256,
    denominator: U256,
    target: U256,
) -> Result<U256, MathError> {
    mul_div(numerator, denominator, target, Rounding::Down)
}

pub fn get_partial_amount_ceil(
    numerator: U256,
    denominator: U256,
    target: U256,
) -> Result<U256, MathError> {
    mul_div(numerator, denominator, target, Rounding::Up)
}

/// Like [`get_partial_amount_floor`] but fails with
/// [`MathError::RoundingError`] if the result is imprecise.
pub fn safe_get_partial_amount_floor(
    numerator: U256,
    denominator: U256,
    target: U256,
) -> Result<U256, MathError> {
    safe_mul_div(numerator, denominator, target, Rounding::Down)
}

/// Like [`get_partial_amount_ceil`] but fails with
/// [`MathError::RoundingError`] if the result is imprecise.
pub fn safe_get_partial_amount_ceil(
    numerator: U256,
    denominator: U256,
    target: U256,
) -> Result<U256, MathError> {
    safe_mul_div(numerator, denominator, target, Rounding::Up)
}

fn safe_mul_div(
    numerator: U256,
    denominator: U256,
    target: U256,
    rounding: Rounding,
) -> Result<U256, MathError> {
    if denominator.is_zero() {
        return Err(MathError::DivisionByZero);
    }
    if is_rounding_error(numerator, denominator, target, rounding)? {
        return Err(MathError::RoundingError {
            numerator,
            denominator,
            target,
        });
    }
    mul_div(numerator, denominator, target, rounding)
}
