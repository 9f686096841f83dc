//! Misbehavior evidence and arbitrator-set transactions
//!
//! These transactions spend nothing; they are accepted on the strength of
//! their signatures and of the arbitrator set alone.
//!
//! Evidence pairs are canonical: the first item's hash must be strictly below
//! the second's, so each misbehavior has exactly one valid report.

use lib_crypto::ecdsa;
use lib_script::run_programs;
use lib_types::contract::parse_multisig_code;
use lib_types::payload::{
    BlockEvidence, DposIllegalBlocks, DposIllegalProposals, DposIllegalVotes, DposProposal,
    DposProposalVote, InactiveArbitrators, NextTurnDposInfo, ProposalEvidence, VoteEvidence,
    COIN_TYPE_MAIN_CHAIN,
};
use lib_types::{Hash256, PrefixType, ProgramHash, Transaction};

use super::errors::{TxValidateError, TxValidateResult};
use super::validator::TransactionValidator;

impl TransactionValidator {
    // =========================================================================
    // Illegal proposals
    // =========================================================================

    pub(super) fn check_illegal_proposals(&self, p: &DposIllegalProposals) -> TxValidateResult<()> {
        check_proposal_evidence(&p.evidence)?;
        check_proposal_evidence(&p.compare_evidence)?;

        if p.evidence.block_height() != p.compare_evidence.block_height() {
            return Err(TxValidateError::EvidenceHeightMismatch);
        }
        check_order(
            p.evidence.proposal.hash(),
            p.compare_evidence.proposal.hash(),
            "proposals",
        )?;

        let (first, second) = (&p.evidence.proposal, &p.compare_evidence.proposal);
        if first.sponsor != second.sponsor {
            return Err(TxValidateError::InvalidEvidence(
                "proposals should be from one sponsor".into(),
            ));
        }
        if first.view_offset != second.view_offset {
            return Err(TxValidateError::InvalidEvidence("proposals should be in same view".into()));
        }

        self.check_arbitrator(&first.sponsor)?;
        verify_proposal(first)?;
        verify_proposal(second)
    }

    // =========================================================================
    // Illegal votes
    // =========================================================================

    pub(super) fn check_illegal_votes(&self, p: &DposIllegalVotes) -> TxValidateResult<()> {
        check_vote_evidence(&p.evidence)?;
        check_vote_evidence(&p.compare_evidence)?;

        if p.evidence.block_height() != p.compare_evidence.block_height() {
            return Err(TxValidateError::EvidenceHeightMismatch);
        }
        check_order(p.evidence.vote.hash(), p.compare_evidence.vote.hash(), "votes")?;

        let (first, second) = (&p.evidence, &p.compare_evidence);
        if first.vote.signer != second.vote.signer {
            return Err(TxValidateError::InvalidEvidence("votes should be from one signer".into()));
        }
        if first.proposal.proposal.view_offset != second.proposal.proposal.view_offset {
            return Err(TxValidateError::InvalidEvidence("votes should be in same view".into()));
        }

        self.check_arbitrator(&first.vote.signer)?;
        for evidence in [first, second] {
            verify_proposal(&evidence.proposal.proposal)?;
            verify_vote(&evidence.vote)?;
        }
        Ok(())
    }

    // =========================================================================
    // Illegal blocks
    // =========================================================================

    pub(super) fn check_illegal_blocks(&self, p: &DposIllegalBlocks) -> TxValidateResult<()> {
        if p.coin_type != COIN_TYPE_MAIN_CHAIN {
            return Err(TxValidateError::InvalidEvidence(format!(
                "unknown coin type {}",
                p.coin_type
            )));
        }
        if p.evidence.block_height() != p.block_height
            || p.compare_evidence.block_height() != p.block_height
        {
            return Err(TxValidateError::EvidenceHeightMismatch);
        }
        check_order(p.evidence.header.hash(), p.compare_evidence.header.hash(), "blocks")?;

        self.check_block_evidence(&p.evidence)?;
        self.check_block_evidence(&p.compare_evidence)
    }

    /// A confirmed block: the confirm names the header, carries a majority of
    /// accepting votes, and every listed signer is an arbitrator who voted
    fn check_block_evidence(&self, evidence: &BlockEvidence) -> TxValidateResult<()> {
        let confirm = &evidence.confirm;
        if confirm.proposal.block_hash != evidence.header.hash() {
            return Err(TxValidateError::InvalidEvidence(
                "confirm does not reference the evidence block".into(),
            ));
        }
        if evidence.signers.len() != confirm.votes.len() {
            return Err(TxValidateError::InvalidEvidence(format!(
                "{} signers for {} votes",
                evidence.signers.len(),
                confirm.votes.len()
            )));
        }
        if !self.arbitrators.has_majority(confirm.votes.len()) {
            return Err(TxValidateError::InsufficientConfirmVotes);
        }

        let proposal_hash = confirm.proposal.hash();
        if confirm.votes.iter().any(|v| v.proposal_hash != proposal_hash) {
            return Err(TxValidateError::InvalidEvidence(
                "vote does not reference the confirmed proposal".into(),
            ));
        }
        for signer in &evidence.signers {
            self.check_arbitrator(signer)?;
            if !confirm.votes.iter().any(|v| v.accept && &v.signer == signer) {
                return Err(TxValidateError::InvalidEvidence(format!(
                    "signer {} has no accepting vote",
                    hex::encode(signer)
                )));
            }
        }

        verify_proposal(&confirm.proposal)?;
        confirm.votes.iter().try_for_each(verify_vote)
    }

    // =========================================================================
    // Arbitrator-set transactions
    // =========================================================================

    /// Council report of inactive arbitrators, signed by a council majority
    pub(super) fn check_inactive_arbitrators(
        &self,
        tx: &Transaction,
        p: &InactiveArbitrators,
    ) -> TxValidateResult<()> {
        if !self.arbitrators.is_crc_arbitrator(&p.sponsor) {
            return Err(TxValidateError::SponsorNotCrc);
        }
        for pk in &p.arbitrators {
            if !self.arbitrators.is_arbitrator_or_disabled(pk) || self.arbitrators.is_crc_arbitrator(pk) {
                return Err(TxValidateError::InvalidInactiveArbitrator(hex::encode(pk)));
            }
        }

        let program = match tx.programs.as_slice() {
            [program] => program,
            programs => {
                return Err(TxValidateError::InvalidProgramCount {
                    tx_type: tx.tx_type,
                    actual: programs.len(),
                })
            }
        };
        let code = parse_multisig_code(&program.code)
            .map_err(|e| TxValidateError::InvalidCrcMultisig(e.to_string()))?;

        let mut council: Vec<Vec<u8>> = self
            .arbitrators
            .get_crc_arbitrators()
            .iter()
            .map(|a| a.public_key().to_vec())
            .collect();
        council.sort();
        let mut keys = code.public_keys.clone();
        keys.sort();
        if keys != council {
            return Err(TxValidateError::InvalidCrcMultisig(
                "keys do not match the council".into(),
            ));
        }
        if code.m < self.arbitrators.crc_majority_count() {
            return Err(TxValidateError::InvalidCrcMultisig(format!(
                "m = {} is below the council majority {}",
                code.m,
                self.arbitrators.crc_majority_count()
            )));
        }

        let program_hash = ProgramHash::from_code(PrefixType::MultiSig, &program.code);
        run_programs(&tx.serialize_unsigned(), &[program_hash], &tx.programs)?;
        Ok(())
    }

    /// Announced next-turn keys must be the elected next producers and the
    /// council
    pub(super) fn check_next_turn_info(&self, p: &NextTurnDposInfo) -> TxValidateResult<()> {
        let mut producers: Vec<Vec<u8>> = self
            .arbitrators
            .get_next_arbitrators()
            .iter()
            .filter(|a| !a.is_crc())
            .map(|a| a.public_key().to_vec())
            .collect();
        let mut council: Vec<Vec<u8>> = self
            .arbitrators
            .get_crc_arbitrators()
            .iter()
            .map(|a| a.public_key().to_vec())
            .collect();
        producers.sort();
        council.sort();

        let mut dpos_keys = p.dpos_public_keys.clone();
        let mut cr_keys = p.cr_public_keys.clone();
        dpos_keys.sort();
        cr_keys.sort();
        if dpos_keys != producers || cr_keys != council {
            return Err(TxValidateError::NextTurnInfoMismatch);
        }
        Ok(())
    }

    fn check_arbitrator(&self, public_key: &[u8]) -> TxValidateResult<()> {
        if !self.arbitrators.is_arbitrator_or_disabled(public_key) {
            return Err(TxValidateError::NotArbitrator(hex::encode(public_key)));
        }
        Ok(())
    }
}

fn check_proposal_evidence(evidence: &ProposalEvidence) -> TxValidateResult<()> {
    if evidence.proposal.block_hash != evidence.block_header.hash() {
        return Err(TxValidateError::InvalidEvidence(
            "proposal does not reference the evidence block".into(),
        ));
    }
    Ok(())
}

fn check_vote_evidence(evidence: &VoteEvidence) -> TxValidateResult<()> {
    check_proposal_evidence(&evidence.proposal)?;
    if evidence.vote.proposal_hash != evidence.proposal.proposal.hash() {
        return Err(TxValidateError::InvalidEvidence(
            "vote does not reference the evidence proposal".into(),
        ));
    }
    Ok(())
}

/// Identical items are no evidence; a reversed pair is rejected
fn check_order(first: Hash256, second: Hash256, what: &'static str) -> TxValidateResult<()> {
    if first == second {
        return Err(TxValidateError::IdenticalEvidence(what));
    }
    if first > second {
        return Err(TxValidateError::EvidenceOrderError);
    }
    Ok(())
}

fn verify_proposal(proposal: &DposProposal) -> TxValidateResult<()> {
    ecdsa::verify(&proposal.sponsor, &proposal.unsigned_data(), &proposal.sign)
        .map_err(|_| TxValidateError::InvalidEvidenceSignature)
}

fn verify_vote(vote: &DposProposalVote) -> TxValidateResult<()> {
    ecdsa::verify(&vote.signer, &vote.unsigned_data(), &vote.sign)
        .map_err(|_| TxValidateError::InvalidEvidenceSignature)
}
