//! Chain parameters
//!
//! Loaded from TOML at node start-up and shared read-only with the
//! validator. Hash-valued fields are hex strings. Missing keys fall back to
//! [`ChainParams::default`].
//!
//! ```toml
//! public_dpos_height = 402680
//! min_transaction_fee = 100
//!
//! [arbitrators]
//! arbitrators_count = 12
//! majority_count = 9
//!
//! [utxo_cache]
//! max_reference_size = 1000
//! ```

use std::fs;
use std::path::Path;

use anyhow::Context;
use lib_consensus::ArbitratorsConfig;
use lib_types::contract::standard_program_hash;
use lib_types::{AssetId, BlockHeight, Fixed64, PrefixType, ProgramHash, COIN};
use lib_utxo::UtxoCacheConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

/// Native asset identifier of the main chain
pub const NATIVE_ASSET_ID: &str = "a3d0eaa466df74983b5d7c543de6904f4c9418ead5ffd6d25814234a96db37b0";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read chain params: {0}")]
    FileSystem(#[from] std::io::Error),

    #[error("Failed to parse chain params: {0}")]
    Parsing(#[from] toml::de::Error),

    #[error("Invalid chain params: {reason}")]
    Invalid { reason: String },
}

impl ConfigError {
    fn invalid(reason: impl Into<String>) -> Self {
        ConfigError::Invalid { reason: reason.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainParams {
    pub native_asset_id: AssetId,
    /// Decimal places the native asset may carry, at most 8
    pub asset_precision: u8,

    // Well-known addresses
    pub foundation: ProgramHash,
    pub destroy_address: ProgramHash,
    pub stake_pool: ProgramHash,

    // Activation heights
    pub public_dpos_height: BlockHeight,
    pub dposv2_start_height: BlockHeight,

    // Fees and limits
    pub min_transaction_fee: Fixed64,
    pub min_cross_chain_tx_fee: Fixed64,
    pub min_deposit_amount: Fixed64,
    pub coinbase_maturity: u32,
    pub max_tx_size: usize,
    pub dposv2_min_votes_lock_time: u32,
    pub dposv2_max_votes_lock_time: u32,

    pub arbitrators: ArbitratorsConfig,
    pub utxo_cache: UtxoCacheConfig,
}

impl Default for ChainParams {
    fn default() -> Self {
        Self {
            native_asset_id: AssetId::from_hex(NATIVE_ASSET_ID).unwrap_or_default(),
            asset_precision: 8,
            foundation: ProgramHash::zero(),
            destroy_address: ProgramHash::zero(),
            stake_pool: ProgramHash::zero(),
            public_dpos_height: 402_680,
            dposv2_start_height: 1_405_000,
            min_transaction_fee: 100,
            min_cross_chain_tx_fee: 10_000,
            min_deposit_amount: 5_000 * COIN,
            coinbase_maturity: 100,
            max_tx_size: 8_000_000,
            dposv2_min_votes_lock_time: 7_200,
            dposv2_max_votes_lock_time: 720_000,
            arbitrators: ArbitratorsConfig::default(),
            utxo_cache: UtxoCacheConfig::default(),
        }
    }
}

impl ChainParams {
    /// Small, deterministic parameters for tests.
    ///
    /// The well-known addresses are derived from fixed keys so fixtures can
    /// recompute them.
    pub fn for_testing(crc_arbitrators: Vec<String>) -> Self {
        Self {
            foundation: test_address(PrefixType::Standard, 0xF0),
            destroy_address: test_address(PrefixType::Standard, 0xDE),
            stake_pool: test_address(PrefixType::DposV2, 0x5A),
            public_dpos_height: 100,
            dposv2_start_height: 200,
            coinbase_maturity: 10,
            max_tx_size: 100_000,
            min_deposit_amount: 5_000 * COIN,
            dposv2_min_votes_lock_time: 10,
            dposv2_max_votes_lock_time: 1_000,
            arbitrators: ArbitratorsConfig::for_testing(crc_arbitrators),
            utxo_cache: UtxoCacheConfig::for_testing(),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.native_asset_id.is_zero() {
            return Err(ConfigError::invalid("native_asset_id must be set"));
        }
        if self.asset_precision > 8 {
            return Err(ConfigError::invalid(format!(
                "asset_precision {} exceeds 8",
                self.asset_precision
            )));
        }
        if self.min_transaction_fee < 0 || self.min_cross_chain_tx_fee < 0 {
            return Err(ConfigError::invalid("fees must be non-negative"));
        }
        if self.min_deposit_amount <= 0 {
            return Err(ConfigError::invalid("min_deposit_amount must be positive"));
        }
        if self.max_tx_size == 0 {
            return Err(ConfigError::invalid("max_tx_size must be positive"));
        }
        if self.dposv2_min_votes_lock_time > self.dposv2_max_votes_lock_time {
            return Err(ConfigError::invalid(format!(
                "dposv2 lock time window {}..{} is empty",
                self.dposv2_min_votes_lock_time, self.dposv2_max_votes_lock_time
            )));
        }
        if !self.stake_pool.is_zero() && self.stake_pool.prefix_type() != Some(PrefixType::DposV2) {
            return Err(ConfigError::invalid("stake_pool must carry the DPoS v2 prefix"));
        }
        if self.utxo_cache.max_reference_size == 0 || self.utxo_cache.max_transaction_size == 0 {
            return Err(ConfigError::invalid("utxo cache sizes must be positive"));
        }
        self.arbitrators
            .validate()
            .map_err(|e| ConfigError::invalid(e.to_string()))?;
        Ok(())
    }

    /// Parse and validate parameters from TOML text
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let params: ChainParams = toml::from_str(s)?;
        params.validate()?;
        Ok(params)
    }

    /// Units per smallest representable amount of the native asset
    pub fn precision_unit(&self) -> Fixed64 {
        10i64.pow(8u32.saturating_sub(self.asset_precision as u32))
    }
}

/// Load chain parameters from a TOML file
pub fn load_chain_params(path: &Path) -> anyhow::Result<ChainParams> {
    info!("Loading chain params from {}", path.display());
    let raw = fs::read_to_string(path)
        .map_err(ConfigError::from)
        .with_context(|| format!("reading {}", path.display()))?;
    let params = ChainParams::from_toml_str(&raw)
        .with_context(|| format!("loading {}", path.display()))?;
    info!(
        "Chain params loaded: {} arbitrators, public DPoS at height {}",
        params.arbitrators.arbitrators_count, params.public_dpos_height
    );
    Ok(params)
}

fn test_address(prefix: PrefixType, seed: u8) -> ProgramHash {
    let mut pk = vec![0x02];
    pk.extend_from_slice(&[seed; 32]);
    match standard_program_hash(&pk) {
        Ok(hash) => ProgramHash::from_parts(prefix as u8, &hash.code_hash()),
        Err(_) => ProgramHash::zero(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params_are_valid() {
        let params = ChainParams::default();
        assert!(params.validate().is_ok());
        assert_eq!(params.native_asset_id.to_string(), NATIVE_ASSET_ID);
        assert_eq!(params.precision_unit(), 1);
    }

    #[test]
    fn test_testing_params_are_valid() {
        let params = ChainParams::for_testing(Vec::new());
        assert!(params.validate().is_ok());
        assert_eq!(params.stake_pool.prefix_type(), Some(PrefixType::DposV2));
        assert_ne!(params.foundation, params.destroy_address);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let params = ChainParams::from_toml_str(
            r#"
            min_transaction_fee = 500
            asset_precision = 4

            [arbitrators]
            arbitrators_count = 6
            majority_count = 5
            "#,
        )
        .unwrap();
        assert_eq!(params.min_transaction_fee, 500);
        assert_eq!(params.precision_unit(), 10_000);
        assert_eq!(params.arbitrators.arbitrators_count, 6);
        assert_eq!(params.arbitrators.candidates_count, 24);
        assert_eq!(params.coinbase_maturity, 100);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            ChainParams::from_toml_str("asset_precision = 9"),
            Err(ConfigError::Invalid { .. })
        ));
        assert!(matches!(
            ChainParams::from_toml_str("[arbitrators]\nmajority_count = 40"),
            Err(ConfigError::Invalid { .. })
        ));
        assert!(matches!(
            ChainParams::from_toml_str("min_transaction_fee = \"cheap\""),
            Err(ConfigError::Parsing(_))
        ));
    }

    #[test]
    fn test_stake_pool_prefix_checked() {
        let mut params = ChainParams::for_testing(Vec::new());
        params.stake_pool = params.foundation;
        assert!(params.validate().is_err());
    }
}
