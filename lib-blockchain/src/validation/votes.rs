//! Vote output rules
//!
//! Each vote type has its own candidate registry and its own amount rule:
//! producer and proposal votes may give every candidate up to the full
//! output value, while council, impeachment and DPoS v2 votes split it.

use lib_types::output::{VoteContent, VOTE_DPOS_V2_VERSION, VOTE_PRODUCER_AND_CR_VERSION};
use lib_types::transaction::{OutputPayload, VoteType};
use lib_types::{checked_sum, BlockHeight, Hash256, Output, Transaction};
use lib_utxo::References;

use super::errors::{TxValidateError, TxValidateResult};
use super::validator::TransactionValidator;
use crate::state::ProducerState;

impl TransactionValidator {
    pub(super) fn check_vote_outputs(
        &self,
        height: BlockHeight,
        tx: &Transaction,
        references: &References,
    ) -> TxValidateResult<()> {
        for output in &tx.outputs {
            let OutputPayload::Vote(vote) = &output.payload else {
                continue;
            };
            for content in &vote.contents {
                match content.vote_type {
                    VoteType::Delegate => self.check_delegate_votes(vote.version, output, content)?,
                    VoteType::Crc => {
                        require_version(vote.version, VOTE_PRODUCER_AND_CR_VERSION, "CRC")?;
                        if !self.state.is_in_voting_period(height) {
                            return Err(TxValidateError::NotInVotingPeriod);
                        }
                        for cv in &content.candidates {
                            if !self.state.is_cr_candidate(&cv.candidate) {
                                return Err(TxValidateError::InvalidVoteCandidate("CR"));
                            }
                        }
                        check_total_votes(output, content)?;
                    }
                    VoteType::CrcProposal => {
                        require_version(vote.version, VOTE_PRODUCER_AND_CR_VERSION, "proposal")?;
                        for cv in &content.candidates {
                            let agreed = Hash256::from_slice(&cv.candidate)
                                .map(|hash| self.state.is_agreed_proposal(&hash))
                                .unwrap_or(false);
                            if !agreed {
                                return Err(TxValidateError::InvalidVoteCandidate("proposal"));
                            }
                            if cv.votes > output.value {
                                return Err(TxValidateError::VotesExceedOutputValue);
                            }
                        }
                    }
                    VoteType::CrcImpeachment => {
                        require_version(vote.version, VOTE_PRODUCER_AND_CR_VERSION, "impeachment")?;
                        for cv in &content.candidates {
                            if !self.state.is_cr_member(&cv.candidate) {
                                return Err(TxValidateError::InvalidVoteCandidate("CR member"));
                            }
                        }
                        check_total_votes(output, content)?;
                    }
                    VoteType::DposV2 => {
                        require_version(vote.version, VOTE_DPOS_V2_VERSION, "DPoS v2")?;
                        self.check_dposv2_votes(height, output, content, references)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn check_delegate_votes(&self, version: u8, output: &Output, content: &VoteContent) -> TxValidateResult<()> {
        for cv in &content.candidates {
            if self.state.producer_state(&cv.candidate) != Some(ProducerState::Active) {
                return Err(TxValidateError::InvalidVoteCandidate("producer"));
            }
            if version >= VOTE_PRODUCER_AND_CR_VERSION && cv.votes > output.value {
                return Err(TxValidateError::VotesExceedOutputValue);
            }
        }
        Ok(())
    }

    /// Stake votes come from the voter's own inputs and may only extend an
    /// existing lock
    fn check_dposv2_votes(
        &self,
        height: BlockHeight,
        output: &Output,
        content: &VoteContent,
        references: &References,
    ) -> TxValidateResult<()> {
        if height < self.params.dposv2_start_height {
            return Err(TxValidateError::DposV2NotStarted(self.params.dposv2_start_height));
        }
        let voter = output.program_hash;
        if references.iter().any(|(_, o)| o.program_hash != voter) {
            return Err(TxValidateError::InvalidDposV2Voter(
                "inputs must all belong to the voter".into(),
            ));
        }

        let earliest = height.saturating_add(self.params.dposv2_min_votes_lock_time);
        let latest = height.saturating_add(self.params.dposv2_max_votes_lock_time);
        for cv in &content.candidates {
            if !self.state.is_dposv2_producer(&cv.candidate) {
                return Err(TxValidateError::InvalidVoteCandidate("DPoS v2 producer"));
            }
            if cv.lock_time < earliest || cv.lock_time > latest {
                return Err(TxValidateError::InvalidVoteLockTime(cv.lock_time));
            }
            if let Some(existing) = self.state.dposv2_vote_lock_time(&voter, &cv.candidate) {
                if cv.lock_time < existing {
                    return Err(TxValidateError::VoteLockTimeDecreased);
                }
            }
        }
        check_total_votes(output, content)
    }
}

fn require_version(version: u8, min: u8, vote_type: &'static str) -> TxValidateResult<()> {
    if version < min {
        return Err(TxValidateError::VoteVersionNotSupported { version, vote_type });
    }
    Ok(())
}

fn check_total_votes(output: &Output, content: &VoteContent) -> TxValidateResult<()> {
    let total = checked_sum(content.candidates.iter().map(|cv| cv.votes))
        .ok_or(TxValidateError::AmountOverflow)?;
    if total > output.value {
        return Err(TxValidateError::VotesExceedOutputValue);
    }
    Ok(())
}
