//! Collaborators of the arbitrator set

use lib_types::{Block, BlockHeight};

use super::types::Arbitrator;
use crate::ConsensusResult;

/// Chain data the arbitrator set elects from
pub trait ArbitratorSource: Send + Sync {
    fn get_block_by_height(&self, height: BlockHeight) -> ConsensusResult<Block>;

    /// Active producer public keys ranked by votes, highest first, as of `block`
    fn get_producers_desc(&self, block: &Block) -> ConsensusResult<Vec<Vec<u8>>>;
}

/// Notified after each rotation, outside the arbitrator set lock
pub trait ArbitratorListener: Send + Sync {
    /// `arbitrators` is the newly seated current set
    fn on_new_election(&self, arbitrators: &[Arbitrator]);
}
