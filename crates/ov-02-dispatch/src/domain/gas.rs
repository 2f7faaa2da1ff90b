//! Gas metrics, payable overrides and update-call arguments.

use serde::{Deserialize, Serialize};
use shared_types::{DeviationConsensus, PriceData, SignatureWithSigner};

/// Fee parameters for one transaction.
///
/// Legacy chains fill `gas_price`; EIP-1559-style chains fill the fee cap
/// pair. All values in wei.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GasMetrics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<u128>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_fee_per_gas: Option<u128>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_priority_fee_per_gas: Option<u128>,
}

impl GasMetrics {
    pub fn legacy(gas_price: u128) -> Self {
        Self {
            gas_price: Some(gas_price),
            ..Self::default()
        }
    }

    pub fn eip1559(max_fee_per_gas: u128, max_priority_fee_per_gas: u128) -> Self {
        Self {
            max_fee_per_gas: Some(max_fee_per_gas),
            max_priority_fee_per_gas: Some(max_priority_fee_per_gas),
            gas_price: None,
        }
    }

    /// Scale every present fee by `multiplier`, rounding up.
    ///
    /// Used for manual-estimation chains and for cancellation replacements,
    /// which must outbid the original transaction.
    pub fn scaled(&self, multiplier: f64) -> Self {
        let scale = |v: u128| scale_ceil(v, multiplier);
        Self {
            gas_price: self.gas_price.map(scale),
            max_fee_per_gas: self.max_fee_per_gas.map(scale),
            max_priority_fee_per_gas: self.max_priority_fee_per_gas.map(scale),
        }
    }
}

/// Multiply `value` by `multiplier`, rounding up, in basis points.
///
/// Integer math: `100 * 1.1` through f64 lands on `110.00000000000001`,
/// which a plain `ceil` turns into 111.
pub fn scale_ceil(value: u128, multiplier: f64) -> u128 {
    let bps = (multiplier * 10_000.0).round() as u128;
    (value * bps).div_ceil(10_000)
}

/// Transaction overrides resolved before building the update call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayableOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas_limit: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas: Option<GasMetrics>,
}

/// Arguments of the on-chain feeds update call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateArgs {
    pub keys: Vec<String>,
    pub price_data: Vec<PriceData>,
    pub signatures: Vec<SignatureWithSigner>,
    pub data_timestamp: u64,
}

impl From<&DeviationConsensus> for UpdateArgs {
    fn from(consensus: &DeviationConsensus) -> Self {
        Self {
            keys: consensus.keys.clone(),
            price_data: consensus.price_data.clone(),
            signatures: consensus.signatures.clone(),
            data_timestamp: consensus.data_timestamp,
        }
    }
}
