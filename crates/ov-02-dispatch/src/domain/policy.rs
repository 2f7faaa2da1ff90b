//! Per-chain dispatch policy.
//!
//! Chain-specific behavior is a value object selected from configuration,
//! keyed by chain id. Adding a chain means adding a config entry, not a
//! dispatcher subclass.

use serde::{Deserialize, Serialize};

const WEI_PER_GWEI: u128 = 1_000_000_000;

/// How fee parameters are resolved for a chain.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum GasPolicy {
    /// Let the provider estimate; no explicit fee parameters.
    ProviderDefault,
    /// Ask the adapter for fees, then scale by a safety multiplier.
    /// For networks where automatic estimation is unreliable.
    ManualEstimate { multiplier: f64 },
    /// Fixed priority-fee parameters from configuration; no adapter call.
    PriorityFee {
        max_priority_fee_gwei: u64,
        max_fee_gwei: u64,
    },
    /// No fee resolution at all (non-EVM chains, rollups that price
    /// execution themselves).
    Skip,
}

impl GasPolicy {
    pub fn priority_fee_wei(max_priority_fee_gwei: u64, max_fee_gwei: u64) -> (u128, u128) {
        (
            max_priority_fee_gwei as u128 * WEI_PER_GWEI,
            max_fee_gwei as u128 * WEI_PER_GWEI,
        )
    }
}

/// Everything chain-specific about dispatching.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChainPolicy {
    pub gas_policy: GasPolicy,
    /// Safety multiplier applied to the contract's own gas estimate when
    /// deriving the transaction gas limit.
    pub gas_limit_multiplier: f64,
    /// Whether a stuck transaction can be replaced with a bumped-fee
    /// cancellation. Many non-EVM chains cannot.
    pub supports_cancellation: bool,
    pub confirmation_timeout_secs: u64,
    /// Payloads older than this relative to chain time are not submitted.
    pub max_payload_age_secs: u64,
}

impl Default for ChainPolicy {
    fn default() -> Self {
        Self {
            gas_policy: GasPolicy::ProviderDefault,
            gas_limit_multiplier: 1.5,
            supports_cancellation: true,
            confirmation_timeout_secs: 120,
            max_payload_age_secs: 300,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_serde_round_trip() {
        let policy = ChainPolicy {
            gas_policy: GasPolicy::ManualEstimate { multiplier: 1.3 },
            gas_limit_multiplier: 1.5,
            supports_cancellation: false,
            confirmation_timeout_secs: 60,
            max_payload_age_secs: 120,
        };
        let json = serde_json::to_string(&policy).unwrap();
        let back: ChainPolicy = serde_json::from_str(&json).unwrap();
        assert_eq!(back, policy);
    }

    #[test]
    fn test_gas_policy_tagged_encoding() {
        let json = serde_json::to_string(&GasPolicy::Skip).unwrap();
        assert!(json.contains("\"mode\":\"skip\""));
    }

    #[test]
    fn test_priority_fee_wei_conversion() {
        let (priority, max) = GasPolicy::priority_fee_wei(2, 30);
        assert_eq!(priority, 2_000_000_000);
        assert_eq!(max, 30_000_000_000);
    }
}
