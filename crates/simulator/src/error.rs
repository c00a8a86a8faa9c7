use {
    alloy_primitives::U256,
    model::{OrderStatus, asset::DecodeError},
    number::MathError,
    serde::Serialize,
    thiserror::Error,
};

/// The party whose assets a transfer moves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, strum::Display)]
pub enum TradeSide {
    Maker,
    Taker,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, strum::Display)]
pub enum TransferType {
    Trade,
    Fee,
}

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("insufficient {side} {kind} balance")]
    InsufficientBalance { side: TradeSide, kind: TransferType },
    #[error("insufficient {side} {kind} allowance")]
    InsufficientAllowance { side: TradeSide, kind: TransferType },
    #[error(transparent)]
    Math(#[from] MathError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("failed to fetch ledger state: {0:#}")]
    Fetch(#[from] anyhow::Error),
}

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error(transparent)]
    Transfer(#[from] TransferError),
    #[error(transparent)]
    Math(#[from] MathError),
    #[error("order is not fillable: {0}")]
    OrderNotFillable(OrderStatus),
    #[error("taker is not the order's designated taker")]
    InvalidTaker,
    #[error("sender is not the order's designated sender")]
    InvalidSender,
    #[error("taker asset fill amount must be positive")]
    InvalidTakerAssetFillAmount,
    #[error("order assets do not mirror each other")]
    AssetMismatch,
    #[error("order prices do not cross")]
    NegativeSpreadRequired,
    #[error("filled {filled} of the requested {requested}")]
    IncompleteFill { requested: U256, filled: U256 },
}

impl SimulationError {
    pub(crate) fn insufficient_balance(side: TradeSide, kind: TransferType) -> Self {
        Self::Transfer(TransferError::InsufficientBalance { side, kind })
    }
}
