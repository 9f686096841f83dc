//! UTXO Errors

use thiserror::Error;
use lib_types::TxHash;

/// Error during reference resolution
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UtxoError {
    #[error("transaction not found: {0}")]
    TransactionNotFound(TxHash),

    #[error("output index {index} out of range for transaction {tx_id} with {outputs} outputs")]
    IndexOutOfRange { tx_id: TxHash, index: u16, outputs: usize },

    #[error("Storage error: {0}")]
    Storage(String),
}

impl UtxoError {
    /// Missing data that may appear later, as opposed to a storage fault
    pub fn is_resolution(&self) -> bool {
        !matches!(self, UtxoError::Storage(_))
    }
}

/// Result type for UTXO operations
pub type UtxoResult<T> = Result<T, UtxoError>;
