//! Extension trait for checked U256 arithmetic that reports the contract's
//! revert reasons.

use {crate::MathError, alloy_primitives::U256};

/// Checked arithmetic returning [`MathError`] instead of `None`.
pub trait SafeMath: Sized {
    fn safe_add(self, other: Self) -> Result<Self, MathError>;

    fn safe_sub(self, other: Self) -> Result<Self, MathError>;

    fn safe_mul(self, other: Self) -> Result<Self, MathError>;

    fn safe_div(self, other: Self) -> Result<Self, MathError>;
}

impl SafeMath for U256 {
    fn safe_add(self, other: Self) -> Result<Self, MathError> {
        self.checked_add(other).ok_or(MathError::AdditionOverflow)
    }

    fn safe_sub(self, other: Self) -> Result<Self, MathError> {
        self.checked_sub(other).ok_or(MathError::SubtractionUnderflow)
    }

    fn safe_mul(self, other: Self) -> Result<Self, MathError> {
        self.checked_mul(other)
            .ok_or(MathError::MultiplicationOverflow)
    }

    fn safe_div(self, other: Self) -> Result<Self, MathError> {
        self.checked_div(other).ok_or(MathError::DivisionByZero)
    }
}
