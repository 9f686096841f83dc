//! Reference resolver
//!
//! One mutex guards both caches. Store reads happen with the lock released,
//! so concurrent validators may fetch the same transaction twice; both
//! results are identical and the second insert is an update.

use std::sync::Arc;

use lib_types::{OutPoint, Output, Transaction, TxHash};
use parking_lot::Mutex;
use tracing::debug;

use crate::cache::{BoundedCache, CacheStats};
use crate::errors::{UtxoError, UtxoResult};
use crate::store::TransactionStore;
use crate::types::{References, StoredTransaction, UtxoCacheConfig};

struct ResolverCaches {
    references: BoundedCache<OutPoint, Output>,
    transactions: BoundedCache<TxHash, Arc<StoredTransaction>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverCacheStats {
    pub references: CacheStats,
    pub transactions: CacheStats,
}

pub struct UtxoResolver {
    store: Arc<dyn TransactionStore>,
    config: UtxoCacheConfig,
    caches: Mutex<ResolverCaches>,
}

impl UtxoResolver {
    pub fn new(store: Arc<dyn TransactionStore>, config: UtxoCacheConfig) -> Self {
        let caches = ResolverCaches {
            references: BoundedCache::new(config.max_reference_size),
            transactions: BoundedCache::new(config.max_transaction_size),
        };
        Self {
            store,
            config,
            caches: Mutex::new(caches),
        }
    }

    pub fn config(&self) -> &UtxoCacheConfig {
        &self.config
    }

    /// Resolve every input of `tx` to the output it spends, in input order.
    ///
    /// Fails on the first input whose transaction or output cannot be found.
    pub fn get_tx_reference(&self, tx: &Transaction) -> UtxoResult<References> {
        let mut references = Vec::with_capacity(tx.inputs.len());
        for input in &tx.inputs {
            let cached = self.caches.lock().references.get(&input.previous);
            let output = match cached {
                Some(output) => output,
                None => {
                    let output = self.resolve_output(&input.previous)?;
                    let evicted = self
                        .caches
                        .lock()
                        .references
                        .insert(input.previous, output.clone());
                    if evicted > 0 {
                        debug!(evicted, "reference cache evicted entries");
                    }
                    output
                }
            };
            references.push((*input, output));
        }
        Ok(references)
    }

    fn resolve_output(&self, outpoint: &OutPoint) -> UtxoResult<Output> {
        let stored = self.get_transaction(&outpoint.tx_id)?;
        let outputs = &stored.transaction.outputs;
        outputs
            .get(outpoint.index as usize)
            .cloned()
            .ok_or(UtxoError::IndexOutOfRange {
                tx_id: outpoint.tx_id,
                index: outpoint.index,
                outputs: outputs.len(),
            })
    }

    /// A confirmed transaction with its height, through the transaction cache
    pub fn get_transaction(&self, tx_id: &TxHash) -> UtxoResult<Arc<StoredTransaction>> {
        if let Some(stored) = self.caches.lock().transactions.get(tx_id) {
            return Ok(stored);
        }
        let (transaction, height) = self.store.get_transaction(tx_id)?;
        let stored = Arc::new(StoredTransaction { transaction, height });
        let evicted = self
            .caches
            .lock()
            .transactions
            .insert(*tx_id, Arc::clone(&stored));
        if evicted > 0 {
            debug!(evicted, "transaction cache evicted entries");
        }
        Ok(stored)
    }

    /// Whether `tx_id` is already confirmed; storage faults are errors
    pub fn contains_transaction(&self, tx_id: &TxHash) -> UtxoResult<bool> {
        match self.get_transaction(tx_id) {
            Ok(_) => Ok(true),
            Err(UtxoError::TransactionNotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// True if any input spends an output the store does not list as
    /// unspent. A failed lookup counts as a double spend.
    pub fn is_double_spend(&self, tx: &Transaction) -> bool {
        for input in &tx.inputs {
            let previous = &input.previous;
            match self.store.get_unspent_indexes(&previous.tx_id) {
                Ok(unspent) => {
                    if !unspent.contains(&previous.index) {
                        return true;
                    }
                }
                Err(e) => {
                    debug!(tx_id = %previous.tx_id, error = %e, "unspent lookup failed");
                    return true;
                }
            }
        }
        false
    }

    /// Drop reference entries consumed by a confirmed transaction
    pub fn remove_spent_references(&self, tx: &Transaction) {
        let mut caches = self.caches.lock();
        for input in &tx.inputs {
            caches.references.remove(&input.previous);
        }
    }

    pub fn clean_tx_cache(&self) {
        self.caches.lock().transactions.clear();
        debug!("transaction cache cleared");
    }

    pub fn clean_cache(&self) {
        let mut caches = self.caches.lock();
        caches.references.clear();
        caches.transactions.clear();
        debug!("reference and transaction caches cleared");
    }

    pub fn cache_stats(&self) -> ResolverCacheStats {
        let caches = self.caches.lock();
        ResolverCacheStats {
            references: caches.references.stats(),
            transactions: caches.transactions.stats(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryTransactionStore;
    use lib_types::payload::{CoinBase, Payload};
    use lib_types::{Input, ProgramHash};

    fn funding(n: usize, nonce: u8) -> Transaction {
        let mut tx = Transaction::new(Payload::CoinBase(CoinBase { content: vec![nonce] }));
        for i in 0..n {
            tx.outputs.push(Output::new(Default::default(), 100 + i as i64, ProgramHash::zero()));
        }
        tx
    }

    fn spending(outpoints: &[OutPoint]) -> Transaction {
        let mut tx = Transaction::new(Payload::TransferAsset);
        tx.inputs = outpoints.iter().map(|op| Input::new(*op, u32::MAX)).collect();
        tx
    }

    fn setup(config: UtxoCacheConfig) -> (Arc<MemoryTransactionStore>, UtxoResolver) {
        let store = Arc::new(MemoryTransactionStore::new());
        let resolver = UtxoResolver::new(store.clone(), config);
        (store, resolver)
    }

    #[test]
    fn test_references_follow_input_order() {
        let (store, resolver) = setup(UtxoCacheConfig::default());
        let a = store.add_transaction(funding(2, 1), 5);
        let b = store.add_transaction(funding(1, 2), 6);
        let tx = spending(&[OutPoint::new(a, 1), OutPoint::new(b, 0), OutPoint::new(a, 0)]);

        let refs = resolver.get_tx_reference(&tx).unwrap();
        let values: Vec<i64> = refs.iter().map(|(_, o)| o.value).collect();
        assert_eq!(values, vec![101, 100, 100]);
        assert_eq!(refs[0].0, tx.inputs[0]);
    }

    #[test]
    fn test_second_resolution_hits_cache() {
        let (store, resolver) = setup(UtxoCacheConfig::default());
        let a = store.add_transaction(funding(1, 1), 5);
        let tx = spending(&[OutPoint::new(a, 0)]);
        resolver.get_tx_reference(&tx).unwrap();
        resolver.get_tx_reference(&tx).unwrap();
        assert_eq!(store.lookup_count(), 1);
    }

    #[test]
    fn test_missing_transaction_is_resolution_error() {
        let (_, resolver) = setup(UtxoCacheConfig::default());
        let tx = spending(&[OutPoint::new(TxHash::new([3; 32]), 0)]);
        let err = resolver.get_tx_reference(&tx).unwrap_err();
        assert!(matches!(err, UtxoError::TransactionNotFound(_)));
        assert!(err.is_resolution());
    }

    #[test]
    fn test_index_out_of_range() {
        let (store, resolver) = setup(UtxoCacheConfig::default());
        let a = store.add_transaction(funding(1, 1), 5);
        let tx = spending(&[OutPoint::new(a, 3)]);
        assert_eq!(
            resolver.get_tx_reference(&tx).unwrap_err(),
            UtxoError::IndexOutOfRange { tx_id: a, index: 3, outputs: 1 }
        );
    }

    #[test]
    fn test_caches_stay_bounded_and_evicted_entries_resolve_again() {
        let (store, resolver) = setup(UtxoCacheConfig::for_testing());
        let hashes: Vec<TxHash> = (0..20).map(|i| store.add_transaction(funding(1, i), 1)).collect();
        for h in &hashes {
            resolver.get_tx_reference(&spending(&[OutPoint::new(*h, 0)])).unwrap();
            let stats = resolver.cache_stats();
            assert!(stats.references.current_size <= 4);
            assert!(stats.transactions.current_size <= 4);
        }
        let refs = resolver.get_tx_reference(&spending(&[OutPoint::new(hashes[0], 0)])).unwrap();
        assert_eq!(refs[0].1.value, 100);
    }

    #[test]
    fn test_double_spend_against_store() {
        let (store, resolver) = setup(UtxoCacheConfig::default());
        let a = store.add_transaction(funding(2, 1), 5);
        let tx = spending(&[OutPoint::new(a, 0)]);
        assert!(!resolver.is_double_spend(&tx));
        store.spend(&OutPoint::new(a, 0));
        assert!(resolver.is_double_spend(&tx));
    }

    #[test]
    fn test_unknown_transaction_counts_as_double_spend() {
        let (_, resolver) = setup(UtxoCacheConfig::default());
        let tx = spending(&[OutPoint::new(TxHash::new([8; 32]), 0)]);
        assert!(resolver.is_double_spend(&tx));
    }

    #[test]
    fn test_contains_and_cleanup() {
        let (store, resolver) = setup(UtxoCacheConfig::default());
        let a = store.add_transaction(funding(1, 1), 5);
        assert!(resolver.contains_transaction(&a).unwrap());
        assert!(!resolver.contains_transaction(&TxHash::new([4; 32])).unwrap());

        let tx = spending(&[OutPoint::new(a, 0)]);
        resolver.get_tx_reference(&tx).unwrap();
        resolver.remove_spent_references(&tx);
        assert_eq!(resolver.cache_stats().references.current_size, 0);
        resolver.clean_cache();
        assert_eq!(resolver.cache_stats().transactions.current_size, 0);
        assert_eq!(resolver.get_transaction(&a).unwrap().height, 5);
    }
}
