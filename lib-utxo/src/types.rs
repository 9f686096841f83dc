//! UTXO Types

use serde::{Deserialize, Serialize};
use lib_types::{BlockHeight, Input, Output, Transaction};

/// Inputs paired with the outputs they spend, in input order
pub type References = Vec<(Input, Output)>;

/// A confirmed transaction and the height of the block containing it
#[derive(Debug, Clone)]
pub struct StoredTransaction {
    pub transaction: Transaction,
    pub height: BlockHeight,
}

/// Cache bounds for the resolver
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UtxoCacheConfig {
    /// Maximum cached `(tx_id, index) -> output` entries
    pub max_reference_size: usize,
    /// Maximum cached transactions
    pub max_transaction_size: usize,
}

impl Default for UtxoCacheConfig {
    fn default() -> Self {
        Self {
            max_reference_size: 100_000,
            max_transaction_size: 100_000,
        }
    }
}

impl UtxoCacheConfig {
    /// Small caches for memory-constrained nodes
    pub fn memory_first() -> Self {
        Self {
            max_reference_size: 1_000,
            max_transaction_size: 1_000,
        }
    }

    /// Tiny caches so tests exercise eviction
    pub fn for_testing() -> Self {
        Self {
            max_reference_size: 4,
            max_transaction_size: 4,
        }
    }
}
