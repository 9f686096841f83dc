//! Validation Module
//!
//! Transaction validation against chain parameters, referenced outputs,
//! DPoS and CR state, and the arbitrator set.
//!
//! Validation never mutates chain state. The only write is the computed fee
//! stored on the transaction being checked.

pub mod errors;
pub mod sanity;
pub mod validator;

mod context;
mod evidence;
mod payload;
mod votes;

// Re-exports
pub use errors::{ErrorKind, TxValidateError, TxValidateResult};
pub use sanity::{check_transaction_sanity, check_vote_output};
pub use validator::TransactionValidator;
