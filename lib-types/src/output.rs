//! Output type tags and their payloads
//!
//! The output type is the tag of [`OutputPayload`]; an output can never carry
//! a payload that disagrees with its type.

use crate::codec::Encoder;
use crate::primitives::{Fixed64, Hash256, ProgramHash};

/// Votes for producers only
pub const VOTE_PRODUCER_VERSION: u8 = 0;
/// Vote amounts per candidate, CR vote types
pub const VOTE_PRODUCER_AND_CR_VERSION: u8 = 1;
/// DPoS v2 lock times
pub const VOTE_DPOS_V2_VERSION: u8 = 2;

pub const MAX_VOTE_PRODUCERS_PER_TRANSACTION: usize = 36;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OutputType {
    Default = 0x00,
    Vote = 0x01,
    CrossChain = 0x03,
    Withdraw = 0x04,
    ReturnSideChainDeposit = 0x05,
    Stake = 0x07,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputPayload {
    Default,
    Vote(VoteOutput),
    CrossChain(CrossChainOutput),
    Withdraw(WithdrawOutput),
    ReturnSideChainDeposit(ReturnSideChainDepositOutput),
    Stake(StakeOutput),
}

impl OutputPayload {
    pub fn output_type(&self) -> OutputType {
        match self {
            OutputPayload::Default => OutputType::Default,
            OutputPayload::Vote(_) => OutputType::Vote,
            OutputPayload::CrossChain(_) => OutputType::CrossChain,
            OutputPayload::Withdraw(_) => OutputType::Withdraw,
            OutputPayload::ReturnSideChainDeposit(_) => OutputType::ReturnSideChainDeposit,
            OutputPayload::Stake(_) => OutputType::Stake,
        }
    }

    pub(crate) fn encode(&self, enc: &mut Encoder) {
        match self {
            OutputPayload::Default => {}
            OutputPayload::Vote(vote) => vote.encode(enc),
            OutputPayload::CrossChain(p) => {
                enc.write_u8(p.version);
                enc.write_var_string(&p.target_address);
                enc.write_i64(p.target_amount);
                enc.write_var_bytes(&p.target_data);
            }
            OutputPayload::Withdraw(p) => {
                enc.write_u8(p.version);
                enc.write_var_string(&p.genesis_block_address);
                enc.write_bytes(p.side_chain_transaction_hash.as_bytes());
                enc.write_var_bytes(&p.target_data);
            }
            OutputPayload::ReturnSideChainDeposit(p) => {
                enc.write_u8(p.version);
                enc.write_var_string(&p.genesis_block_address);
                enc.write_bytes(p.deposit_transaction_hash.as_bytes());
            }
            OutputPayload::Stake(p) => {
                enc.write_u8(p.version);
                enc.write_bytes(p.stake_address.as_bytes());
            }
        }
    }
}

// ============================================================================
// VOTES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum VoteType {
    Delegate = 0x00,
    Crc = 0x01,
    CrcProposal = 0x02,
    CrcImpeachment = 0x03,
    DposV2 = 0x04,
}

/// One candidate and the weight assigned to it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateVotes {
    /// Producer owner key, CR code hash bytes or proposal hash, by vote type
    pub candidate: Vec<u8>,
    pub votes: Fixed64,
    /// Height until which DPoS v2 votes are locked
    pub lock_time: u32,
}

impl CandidateVotes {
    pub fn new(candidate: Vec<u8>, votes: Fixed64) -> Self {
        Self { candidate, votes, lock_time: 0 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteContent {
    pub vote_type: VoteType,
    pub candidates: Vec<CandidateVotes>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteOutput {
    pub version: u8,
    pub contents: Vec<VoteContent>,
}

impl VoteOutput {
    fn encode(&self, enc: &mut Encoder) {
        enc.write_u8(self.version);
        enc.write_var_uint(self.contents.len() as u64);
        for content in &self.contents {
            enc.write_u8(content.vote_type as u8);
            enc.write_var_uint(content.candidates.len() as u64);
            for cv in &content.candidates {
                enc.write_var_bytes(&cv.candidate);
                if self.version >= VOTE_PRODUCER_AND_CR_VERSION {
                    enc.write_i64(cv.votes);
                }
                if self.version >= VOTE_DPOS_V2_VERSION {
                    enc.write_u32(cv.lock_time);
                }
            }
        }
    }
}

// ============================================================================
// CROSS-CHAIN AND STAKE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrossChainOutput {
    pub version: u8,
    pub target_address: String,
    pub target_amount: Fixed64,
    pub target_data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WithdrawOutput {
    pub version: u8,
    pub genesis_block_address: String,
    pub side_chain_transaction_hash: Hash256,
    pub target_data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnSideChainDepositOutput {
    pub version: u8,
    pub genesis_block_address: String,
    pub deposit_transaction_hash: Hash256,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StakeOutput {
    pub version: u8,
    /// DPoS v2 address credited with the exchanged votes
    pub stake_address: ProgramHash,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_is_output_type() {
        let stake = OutputPayload::Stake(StakeOutput {
            version: 0,
            stake_address: ProgramHash::zero(),
        });
        assert_eq!(stake.output_type(), OutputType::Stake);
        assert_eq!(OutputPayload::Default.output_type(), OutputType::Default);
    }

    #[test]
    fn test_vote_amounts_encoded_from_version_one() {
        let content = VoteContent {
            vote_type: VoteType::Delegate,
            candidates: vec![CandidateVotes::new(vec![0x02; 33], 5)],
        };
        let mut v0 = Encoder::new();
        VoteOutput { version: VOTE_PRODUCER_VERSION, contents: vec![content.clone()] }.encode(&mut v0);
        let mut v1 = Encoder::new();
        VoteOutput { version: VOTE_PRODUCER_AND_CR_VERSION, contents: vec![content] }.encode(&mut v1);
        assert_eq!(v1.len(), v0.len() + 8);
    }
}
