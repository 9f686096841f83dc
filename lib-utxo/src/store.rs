//! Transaction store collaborator
//!
//! The resolver only reads. Persistence, indexing and reorg handling live
//! behind this trait.

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};

use lib_types::{BlockHeight, OutPoint, Transaction, TxHash};
use parking_lot::RwLock;

use crate::errors::{UtxoError, UtxoResult};

/// Read access to confirmed transactions and their unspent outputs
///
/// Implementations must be safe to call from several validator threads.
pub trait TransactionStore: Send + Sync {
    /// A confirmed transaction and the height of its block
    fn get_transaction(&self, tx_id: &TxHash) -> UtxoResult<(Transaction, BlockHeight)>;

    /// Output indexes of `tx_id` that are still unspent
    fn get_unspent_indexes(&self, tx_id: &TxHash) -> UtxoResult<Vec<u16>>;
}

/// In-memory store for tests and tooling
#[derive(Default)]
pub struct MemoryTransactionStore {
    transactions: RwLock<HashMap<TxHash, (Transaction, BlockHeight)>>,
    unspent: RwLock<HashMap<TxHash, BTreeSet<u16>>>,
    lookups: AtomicUsize,
}

impl MemoryTransactionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a confirmed transaction with all outputs unspent
    pub fn add_transaction(&self, tx: Transaction, height: BlockHeight) -> TxHash {
        let hash = tx.hash();
        let indexes = (0..tx.outputs.len() as u16).collect();
        self.unspent.write().insert(hash, indexes);
        self.transactions.write().insert(hash, (tx, height));
        hash
    }

    /// Mark an output spent; returns false if it was not unspent
    pub fn spend(&self, outpoint: &OutPoint) -> bool {
        self.unspent
            .write()
            .get_mut(&outpoint.tx_id)
            .map(|set| set.remove(&outpoint.index))
            .unwrap_or(false)
    }

    /// Number of `get_transaction` calls served
    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::Relaxed)
    }
}

impl TransactionStore for MemoryTransactionStore {
    fn get_transaction(&self, tx_id: &TxHash) -> UtxoResult<(Transaction, BlockHeight)> {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        self.transactions
            .read()
            .get(tx_id)
            .cloned()
            .ok_or(UtxoError::TransactionNotFound(*tx_id))
    }

    fn get_unspent_indexes(&self, tx_id: &TxHash) -> UtxoResult<Vec<u16>> {
        self.unspent
            .read()
            .get(tx_id)
            .map(|set| set.iter().copied().collect())
            .ok_or(UtxoError::TransactionNotFound(*tx_id))
    }
}
