//! UTXO Reference Resolution
//!
//! Maps every input of a transaction to the output it spends, reading
//! through two bounded caches in front of the transaction store.
//!
//! # Key Rules
//!
//! 1. **References come from the store**: an input whose transaction or
//!    output index cannot be found is a resolution failure, not a rejection
//! 2. **Spent-ness is checked against the store**: the caches never answer
//!    double-spend queries
//! 3. **Caches are bounded**: each cache holds at most its configured size
//!
//! # Usage
//!
//! ```ignore
//! use lib_utxo::{UtxoCacheConfig, UtxoResolver};
//!
//! let resolver = UtxoResolver::new(store, UtxoCacheConfig::default());
//! let references = resolver.get_tx_reference(&tx)?;
//! ```

pub mod cache;
pub mod errors;
pub mod resolver;
pub mod store;
pub mod types;

pub use cache::{BoundedCache, CacheStats};
pub use errors::{UtxoError, UtxoResult};
pub use resolver::{ResolverCacheStats, UtxoResolver};
pub use store::{MemoryTransactionStore, TransactionStore};
pub use types::{References, StoredTransaction, UtxoCacheConfig};
