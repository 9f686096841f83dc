//! DPoS Arbitration Layer
//!
//! Tracks which arbitrators are on duty, who is elected next, and rotates
//! the two at fixed block intervals. Consumers read consistent copies of the
//! sets and ask majority questions; nothing here touches the network.
//!
//! Collaborators are dependency-injected: the block and producer ranking
//! source, and election listeners. No globals.

pub mod arbitrators;

pub use arbitrators::{
    Arbitrator, ArbitratorKind, ArbitratorListener, ArbitratorSet, ArbitratorSetSnapshot,
    ArbitratorSource, ArbitratorsConfig,
};

/// Result type for consensus operations
pub type ConsensusResult<T> = Result<T, ConsensusError>;

/// Consensus error types
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConsensusError {
    #[error("Invalid arbitrators config: {0}")]
    InvalidConfig(String),

    #[error("Invalid arbitrator public key: {0}")]
    InvalidPublicKey(String),

    #[error("Block not found at height {0}")]
    BlockNotFound(u32),

    #[error("Arbitrator source error: {0}")]
    Source(String),

    #[error("Not enough producers: need {needed}, have {available}")]
    InsufficientProducers { needed: usize, available: usize },

    #[error("Block {height} already confirmed (last confirmed {last})")]
    BlockAlreadyConfirmed { height: u32, last: u32 },

    #[error("Arbitrator set is empty")]
    EmptyArbitratorSet,
}

impl ConsensusError {
    /// The arbitrator set cannot serve requests; the node must stop
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ConsensusError::EmptyArbitratorSet
                | ConsensusError::BlockNotFound(_)
                | ConsensusError::Source(_)
                | ConsensusError::InsufficientProducers { .. }
        )
    }
}
