//! Arbitrator set management

pub mod arbitrator_set;
pub mod config;
pub mod source;
pub mod types;

pub use arbitrator_set::ArbitratorSet;
pub use config::ArbitratorsConfig;
pub use source::{ArbitratorListener, ArbitratorSource};
pub use types::{Arbitrator, ArbitratorKind, ArbitratorSetSnapshot};
