//! Read-only view of DPoS and CR state
//!
//! The validator consults producer, council and vote state through
//! [`ChainStateView`]; the node's state machines own that data. Every
//! method answers as of the chain tip being validated against.

use std::collections::{HashMap, HashSet};

use lib_types::{BlockHeight, Hash256, ProgramHash};
use parking_lot::RwLock;

/// Lifecycle of a registered producer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProducerState {
    /// Registered, waiting for the deposit to confirm
    Pending,
    Active,
    /// Missed duty; can be re-activated
    Inactive,
    Canceled,
    Illegal,
    /// Deposit returned to the owner
    Returned,
}

pub trait ChainStateView: Send + Sync {
    /// State of the producer registered under `owner_public_key`
    fn producer_state(&self, owner_public_key: &[u8]) -> Option<ProducerState>;

    /// Whether `node_public_key` is already used by a registered producer
    fn node_key_registered(&self, node_public_key: &[u8]) -> bool;

    /// Producer accepting DPoS v2 stake votes
    fn is_dposv2_producer(&self, owner_public_key: &[u8]) -> bool;

    /// Registered council candidate in the current election
    fn is_cr_candidate(&self, candidate: &[u8]) -> bool;

    /// Sitting council member
    fn is_cr_member(&self, member: &[u8]) -> bool;

    /// Proposal approved by the council and open for voter review
    fn is_agreed_proposal(&self, proposal_hash: &Hash256) -> bool;

    /// Council election voting is open at `height`
    fn is_in_voting_period(&self, height: BlockHeight) -> bool;

    /// Lock time of an existing DPoS v2 vote from `voter` to `candidate`
    fn dposv2_vote_lock_time(&self, voter: &ProgramHash, candidate: &[u8]) -> Option<u32>;

    /// Deposit address that belongs to a registered producer or candidate
    fn is_deposit_owner(&self, deposit: &ProgramHash) -> bool;
}

/// In-memory state for tests and tooling
#[derive(Default)]
pub struct MemoryChainState {
    producers: RwLock<HashMap<Vec<u8>, (Vec<u8>, ProducerState)>>,
    dposv2_producers: RwLock<HashSet<Vec<u8>>>,
    cr_candidates: RwLock<HashSet<Vec<u8>>>,
    cr_members: RwLock<HashSet<Vec<u8>>>,
    agreed_proposals: RwLock<HashSet<Hash256>>,
    voting_period: RwLock<Option<(BlockHeight, BlockHeight)>>,
    dposv2_votes: RwLock<HashMap<(ProgramHash, Vec<u8>), u32>>,
    deposit_owners: RwLock<HashSet<ProgramHash>>,
}

impl MemoryChainState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_producer(&self, owner_public_key: &[u8], node_public_key: &[u8], state: ProducerState) {
        self.producers
            .write()
            .insert(owner_public_key.to_vec(), (node_public_key.to_vec(), state));
    }

    pub fn add_dposv2_producer(&self, owner_public_key: &[u8]) {
        self.dposv2_producers.write().insert(owner_public_key.to_vec());
    }

    pub fn add_cr_candidate(&self, candidate: &[u8]) {
        self.cr_candidates.write().insert(candidate.to_vec());
    }

    pub fn add_cr_member(&self, member: &[u8]) {
        self.cr_members.write().insert(member.to_vec());
    }

    pub fn add_agreed_proposal(&self, proposal_hash: Hash256) {
        self.agreed_proposals.write().insert(proposal_hash);
    }

    /// Open council voting for `start..end`
    pub fn set_voting_period(&self, start: BlockHeight, end: BlockHeight) {
        *self.voting_period.write() = Some((start, end));
    }

    pub fn add_dposv2_vote(&self, voter: ProgramHash, candidate: &[u8], lock_time: u32) {
        self.dposv2_votes.write().insert((voter, candidate.to_vec()), lock_time);
    }

    pub fn add_deposit_owner(&self, deposit: ProgramHash) {
        self.deposit_owners.write().insert(deposit);
    }
}

impl ChainStateView for MemoryChainState {
    fn producer_state(&self, owner_public_key: &[u8]) -> Option<ProducerState> {
        self.producers.read().get(owner_public_key).map(|(_, state)| *state)
    }

    fn node_key_registered(&self, node_public_key: &[u8]) -> bool {
        self.producers
            .read()
            .values()
            .any(|(node, _)| node.as_slice() == node_public_key)
    }

    fn is_dposv2_producer(&self, owner_public_key: &[u8]) -> bool {
        self.dposv2_producers.read().contains(owner_public_key)
    }

    fn is_cr_candidate(&self, candidate: &[u8]) -> bool {
        self.cr_candidates.read().contains(candidate)
    }

    fn is_cr_member(&self, member: &[u8]) -> bool {
        self.cr_members.read().contains(member)
    }

    fn is_agreed_proposal(&self, proposal_hash: &Hash256) -> bool {
        self.agreed_proposals.read().contains(proposal_hash)
    }

    fn is_in_voting_period(&self, height: BlockHeight) -> bool {
        matches!(*self.voting_period.read(), Some((start, end)) if height >= start && height < end)
    }

    fn dposv2_vote_lock_time(&self, voter: &ProgramHash, candidate: &[u8]) -> Option<u32> {
        self.dposv2_votes
            .read()
            .get(&(*voter, candidate.to_vec()))
            .copied()
    }

    fn is_deposit_owner(&self, deposit: &ProgramHash) -> bool {
        self.deposit_owners.read().contains(deposit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_producer_lookup() {
        let state = MemoryChainState::new();
        state.add_producer(&[2; 33], &[3; 33], ProducerState::Active);
        assert_eq!(state.producer_state(&[2; 33]), Some(ProducerState::Active));
        assert_eq!(state.producer_state(&[3; 33]), None);
        assert!(state.node_key_registered(&[3; 33]));
        assert!(!state.node_key_registered(&[2; 33]));
    }

    #[test]
    fn test_voting_period_is_half_open() {
        let state = MemoryChainState::new();
        assert!(!state.is_in_voting_period(5));
        state.set_voting_period(10, 20);
        assert!(!state.is_in_voting_period(9));
        assert!(state.is_in_voting_period(10));
        assert!(!state.is_in_voting_period(20));
    }
}
