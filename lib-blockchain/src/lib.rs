//! Main-chain transaction validation
//!
//! Decides whether a transaction is well-formed, spends what it claims,
//! is authorized by its programs and agrees with the elected arbitrator set.
//!
//! Collaborators are injected at construction: the UTXO resolver, the
//! arbitrator set and a read-only view of DPoS and CR state. Nothing here
//! is global.

pub mod config;
pub mod state;
pub mod validation;

pub use config::{load_chain_params, ChainParams, ConfigError};
pub use state::{ChainStateView, MemoryChainState, ProducerState};
pub use validation::{ErrorKind, TransactionValidator, TxValidateError, TxValidateResult};
