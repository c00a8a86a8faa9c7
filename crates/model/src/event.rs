use {
    crate::{Asset, FillResults},
    alloy_primitives::{Address, B256},
    serde::{Deserialize, Serialize},
};

/// Mirrors the exchange's `Fill` event log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FillEvent {
    pub maker_address: Address,
    pub fee_recipient_address: Address,
    pub taker_address: Address,
    pub sender_address: Address,
    #[serde(flatten)]
    pub fill_results: FillResults,
    pub order_hash: B256,
    pub maker_asset: Asset,
    pub taker_asset: Asset,
}
