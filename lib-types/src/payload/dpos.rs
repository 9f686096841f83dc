//! DPoS consensus messages and the misbehavior evidence built from them

use crate::block::Header;
use crate::codec::Encoder;
use crate::hashing::sha256d;
use crate::primitives::{BlockHeight, Hash256};

/// Coin type of block evidence produced on the main chain
pub const COIN_TYPE_MAIN_CHAIN: u8 = 0;

/// A sponsor's proposal of a block for a view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DposProposal {
    pub sponsor: Vec<u8>,
    pub block_hash: Hash256,
    pub view_offset: u32,
    pub sign: Vec<u8>,
}

impl DposProposal {
    /// Data covered by `sign`
    pub fn unsigned_data(&self) -> Vec<u8> {
        let mut enc = Encoder::new();
        enc.write_var_bytes(&self.sponsor);
        enc.write_bytes(self.block_hash.as_bytes());
        enc.write_u32(self.view_offset);
        enc.into_bytes()
    }

    pub fn hash(&self) -> Hash256 {
        Hash256::new(sha256d(&self.unsigned_data()))
    }

    fn encode(&self, enc: &mut Encoder) {
        enc.write_bytes(&self.unsigned_data());
        enc.write_var_bytes(&self.sign);
    }
}

/// An arbitrator's accept or reject vote on a proposal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DposProposalVote {
    pub proposal_hash: Hash256,
    pub signer: Vec<u8>,
    pub accept: bool,
    pub sign: Vec<u8>,
}

impl DposProposalVote {
    pub fn unsigned_data(&self) -> Vec<u8> {
        let mut enc = Encoder::new();
        enc.write_bytes(self.proposal_hash.as_bytes());
        enc.write_var_bytes(&self.signer);
        enc.write_bool(self.accept);
        enc.into_bytes()
    }

    pub fn hash(&self) -> Hash256 {
        Hash256::new(sha256d(&self.unsigned_data()))
    }

    fn encode(&self, enc: &mut Encoder) {
        enc.write_bytes(&self.unsigned_data());
        enc.write_var_bytes(&self.sign);
    }
}

/// A proposal together with the votes that confirmed it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirm {
    pub proposal: DposProposal,
    pub votes: Vec<DposProposalVote>,
}

impl Confirm {
    fn encode(&self, enc: &mut Encoder) {
        self.proposal.encode(enc);
        enc.write_var_uint(self.votes.len() as u64);
        for vote in &self.votes {
            vote.encode(enc);
        }
    }
}

// ============================================================================
// EVIDENCE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposalEvidence {
    pub proposal: DposProposal,
    /// Header of the proposed block
    pub block_header: Header,
}

impl ProposalEvidence {
    pub fn block_height(&self) -> BlockHeight {
        self.block_header.height
    }

    fn encode(&self, enc: &mut Encoder) {
        self.proposal.encode(enc);
        self.block_header.encode(enc);
    }

    pub fn hash(&self) -> Hash256 {
        let mut enc = Encoder::new();
        self.encode(&mut enc);
        Hash256::new(sha256d(&enc.into_bytes()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteEvidence {
    pub proposal: ProposalEvidence,
    pub vote: DposProposalVote,
}

impl VoteEvidence {
    pub fn block_height(&self) -> BlockHeight {
        self.proposal.block_height()
    }

    pub fn hash(&self) -> Hash256 {
        let mut enc = Encoder::new();
        self.proposal.encode(&mut enc);
        self.vote.encode(&mut enc);
        Hash256::new(sha256d(&enc.into_bytes()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockEvidence {
    pub header: Header,
    pub confirm: Confirm,
    /// Arbitrators whose accepting votes appear in `confirm`
    pub signers: Vec<Vec<u8>>,
}

impl BlockEvidence {
    pub fn block_height(&self) -> BlockHeight {
        self.header.height
    }

    fn encode(&self, enc: &mut Encoder) {
        self.header.encode(enc);
        self.confirm.encode(enc);
        enc.write_var_uint(self.signers.len() as u64);
        for signer in &self.signers {
            enc.write_var_bytes(signer);
        }
    }

    pub fn hash(&self) -> Hash256 {
        let mut enc = Encoder::new();
        self.encode(&mut enc);
        Hash256::new(sha256d(&enc.into_bytes()))
    }
}

/// Two conflicting proposals from one sponsor at one height and view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DposIllegalProposals {
    pub evidence: ProposalEvidence,
    pub compare_evidence: ProposalEvidence,
}

/// Two conflicting votes from one signer at one height and view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DposIllegalVotes {
    pub evidence: VoteEvidence,
    pub compare_evidence: VoteEvidence,
}

/// Two different blocks confirmed at one height
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DposIllegalBlocks {
    pub coin_type: u8,
    pub block_height: BlockHeight,
    pub evidence: BlockEvidence,
    pub compare_evidence: BlockEvidence,
}

impl DposIllegalProposals {
    pub(crate) fn encode(&self, enc: &mut Encoder) {
        self.evidence.encode(enc);
        self.compare_evidence.encode(enc);
    }
}

impl DposIllegalVotes {
    pub(crate) fn encode(&self, enc: &mut Encoder) {
        for ev in [&self.evidence, &self.compare_evidence] {
            ev.proposal.encode(enc);
            ev.vote.encode(enc);
        }
    }
}

impl DposIllegalBlocks {
    pub(crate) fn encode(&self, enc: &mut Encoder) {
        enc.write_u8(self.coin_type);
        enc.write_u32(self.block_height);
        self.evidence.encode(enc);
        self.compare_evidence.encode(enc);
    }
}

/// CRC report of arbitrators that failed to participate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InactiveArbitrators {
    pub sponsor: Vec<u8>,
    pub arbitrators: Vec<Vec<u8>>,
    pub block_height: BlockHeight,
}

impl InactiveArbitrators {
    pub(crate) fn encode(&self, enc: &mut Encoder) {
        enc.write_var_bytes(&self.sponsor);
        enc.write_var_uint(self.arbitrators.len() as u64);
        for pk in &self.arbitrators {
            enc.write_var_bytes(pk);
        }
        enc.write_u32(self.block_height);
    }
}

/// Arbitrators that take duty at `working_height`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NextTurnDposInfo {
    pub working_height: BlockHeight,
    pub cr_public_keys: Vec<Vec<u8>>,
    pub dpos_public_keys: Vec<Vec<u8>>,
}

impl NextTurnDposInfo {
    pub(crate) fn encode(&self, enc: &mut Encoder) {
        enc.write_u32(self.working_height);
        for keys in [&self.cr_public_keys, &self.dpos_public_keys] {
            enc.write_var_uint(keys.len() as u64);
            for pk in keys {
                enc.write_var_bytes(pk);
            }
        }
    }
}
