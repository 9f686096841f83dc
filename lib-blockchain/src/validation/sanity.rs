//! Sanity checks
//!
//! Everything that can be decided from the transaction bytes and the chain
//! parameters alone. No storage, no arbitrator set. Safe to run in
//! parallel and to cache by transaction hash.

use std::collections::HashSet;

use lib_crypto::ecdsa::decode_point;
use lib_types::output::{
    VoteOutput, MAX_VOTE_PRODUCERS_PER_TRANSACTION, VOTE_DPOS_V2_VERSION,
    VOTE_PRODUCER_AND_CR_VERSION,
};
use lib_types::payload::{
    BlockEvidence, DposProposal, DposProposalVote, ProposalEvidence, PRODUCER_INFO_DPOS_V2_VERSION,
};
use lib_types::transaction::{OutputPayload, VoteType, TX_VERSION_09};
use lib_types::{
    checked_sum, AttributeUsage, BlockHeight, Fixed64, Hash256, Output, OutputType, Payload,
    PrefixType, ProgramHash, Transaction, TxType, MAX_AMOUNT,
};

use super::errors::{TxValidateError, TxValidateResult};
use crate::config::ChainParams;

/// Longest producer nickname, in characters
pub const MAX_NICKNAME_LENGTH: usize = 100;

/// Largest attribute payload for memo-like usages
pub const MAX_ATTRIBUTE_DATA_LENGTH: usize = 255;

/// Validate transaction without chain state
pub fn check_transaction_sanity(
    params: &ChainParams,
    height: BlockHeight,
    tx: &Transaction,
) -> TxValidateResult<()> {
    let size = tx.serialized_size();
    if size > params.max_tx_size {
        return Err(TxValidateError::InvalidSize { size, max: params.max_tx_size });
    }

    check_payload_type(tx)?;
    check_inputs(tx)?;
    check_outputs(params, height, tx)?;
    check_asset_precision(params, tx)?;
    check_attributes(tx)?;
    check_programs(tx)?;
    check_payload(tx)?;
    Ok(())
}

fn check_payload_type(tx: &Transaction) -> TxValidateResult<()> {
    if tx.payload.tx_type() != tx.tx_type {
        return Err(TxValidateError::PayloadTypeMismatch(tx.tx_type));
    }
    let max_version = match tx.tx_type {
        TxType::RegisterProducer => PRODUCER_INFO_DPOS_V2_VERSION,
        _ => 0,
    };
    if tx.payload_version > max_version {
        return Err(TxValidateError::UnsupportedPayloadVersion {
            tx_type: tx.tx_type,
            version: tx.payload_version,
        });
    }
    Ok(())
}

// =============================================================================
// Inputs
// =============================================================================

fn check_inputs(tx: &Transaction) -> TxValidateResult<()> {
    if tx.is_coinbase() {
        if tx.inputs.len() != 1 || !tx.inputs[0].is_coinbase_input() {
            return Err(TxValidateError::InvalidCoinbaseInput);
        }
        return Ok(());
    }

    if tx.tx_type.is_no_cost() {
        if !tx.inputs.is_empty() {
            return Err(TxValidateError::UnexpectedInputs(tx.tx_type));
        }
        return Ok(());
    }

    if tx.inputs.is_empty() {
        return Err(TxValidateError::EmptyInputs);
    }
    if tx.inputs.len() > u16::MAX as usize {
        return Err(TxValidateError::TooManyInputs(tx.inputs.len()));
    }

    let mut seen = HashSet::with_capacity(tx.inputs.len());
    for input in &tx.inputs {
        if input.previous.is_null() {
            return Err(TxValidateError::NullInput);
        }
        if !seen.insert(input.previous) {
            return Err(TxValidateError::DuplicateInput {
                tx_id: input.previous.tx_id,
                index: input.previous.index,
            });
        }
    }
    Ok(())
}

// =============================================================================
// Outputs
// =============================================================================

fn check_outputs(params: &ChainParams, height: BlockHeight, tx: &Transaction) -> TxValidateResult<()> {
    if tx.is_coinbase() {
        return check_coinbase_outputs(params, height, &tx.outputs);
    }

    if tx.tx_type.is_no_cost() {
        if !tx.outputs.is_empty() {
            return Err(TxValidateError::UnexpectedOutputs(tx.tx_type));
        }
        return Ok(());
    }

    if tx.outputs.is_empty() {
        return Err(TxValidateError::EmptyOutputs);
    }

    let mut special_outputs = 0;
    for output in &tx.outputs {
        check_output_common(params, output)?;

        let output_type = output.output_type();
        if output_type == OutputType::Default {
            continue;
        }
        special_outputs += 1;
        if special_outputs > 1 {
            return Err(TxValidateError::MultipleSpecialOutputs);
        }
        if tx.version < TX_VERSION_09 {
            return Err(TxValidateError::SpecialOutputVersion);
        }
        if allowed_tx_type(output_type) != Some(tx.tx_type) {
            return Err(TxValidateError::OutputTypeNotAllowed { output_type, tx_type: tx.tx_type });
        }
        check_output_payload(params, output)?;
    }
    check_output_total(&tx.outputs)
}

fn check_output_total(outputs: &[Output]) -> TxValidateResult<()> {
    match checked_sum(outputs.iter().map(|o| o.value)) {
        Some(total) if total <= MAX_AMOUNT => Ok(()),
        _ => Err(TxValidateError::AmountOverflow),
    }
}

fn check_output_common(params: &ChainParams, output: &Output) -> TxValidateResult<()> {
    if output.asset_id != params.native_asset_id {
        return Err(TxValidateError::InvalidOutputAsset);
    }
    if output.value < 0 || output.value > MAX_AMOUNT {
        return Err(TxValidateError::InvalidOutputValue(output.value));
    }
    if output.program_hash.prefix_type().is_none() && output.program_hash != params.destroy_address {
        return Err(TxValidateError::InvalidOutputAddress(output.program_hash));
    }
    Ok(())
}

/// The only transaction type allowed to carry a special output type
fn allowed_tx_type(output_type: OutputType) -> Option<TxType> {
    match output_type {
        OutputType::Default => None,
        OutputType::Vote => Some(TxType::TransferAsset),
        OutputType::CrossChain => Some(TxType::TransferCrossChainAsset),
        OutputType::Withdraw => Some(TxType::WithdrawFromSideChain),
        OutputType::ReturnSideChainDeposit => Some(TxType::ReturnSideChainDepositCoin),
        OutputType::Stake => Some(TxType::ExchangeVotes),
    }
}

fn check_coinbase_outputs(
    params: &ChainParams,
    height: BlockHeight,
    outputs: &[Output],
) -> TxValidateResult<()> {
    if outputs.len() < 2 {
        return Err(TxValidateError::CoinbaseOutputCount(outputs.len()));
    }
    for output in outputs {
        check_output_common(params, output)?;
        if output.output_type() != OutputType::Default {
            return Err(TxValidateError::OutputTypeNotAllowed {
                output_type: output.output_type(),
                tx_type: TxType::CoinBase,
            });
        }
    }
    check_output_total(outputs)?;
    if outputs[0].program_hash != params.foundation {
        return Err(TxValidateError::CoinbaseFoundationMissing);
    }
    if !foundation_reward_sufficient(params, height, outputs)? {
        return Err(TxValidateError::FoundationRewardTooLow);
    }
    Ok(())
}

/// Foundation share of the block reward.
///
/// Before public DPoS the foundation takes 30% of all outputs. From then on
/// arbitrators are paid separately, so a two-output coinbase carries the
/// foundation's 30% and the miner's 35% of the full reward.
fn foundation_reward_sufficient(
    params: &ChainParams,
    height: BlockHeight,
    outputs: &[Output],
) -> TxValidateResult<bool> {
    let foundation = outputs[0].value;
    let sufficient = if height < params.public_dpos_height {
        let total =
            checked_sum(outputs.iter().map(|o| o.value)).ok_or(TxValidateError::AmountOverflow)?;
        foundation >= (total as f64 * 0.3) as Fixed64
    } else if outputs.len() == 2 {
        let total = outputs[0]
            .value
            .checked_add(outputs[1].value)
            .ok_or(TxValidateError::AmountOverflow)?;
        foundation >= (total as f64 * 0.3 / 0.65) as Fixed64
    } else {
        true
    };
    Ok(sufficient)
}

fn check_output_payload(params: &ChainParams, output: &Output) -> TxValidateResult<()> {
    match &output.payload {
        OutputPayload::Default => Ok(()),
        OutputPayload::Vote(vote) => check_vote_output(vote),
        OutputPayload::CrossChain(cc) => {
            if cc.target_address.is_empty() {
                return Err(TxValidateError::InvalidOutputPayload(
                    "cross chain target address is empty".into(),
                ));
            }
            if cc.target_amount < 0 {
                return Err(TxValidateError::InvalidOutputPayload(
                    "cross chain target amount is negative".into(),
                ));
            }
            let required = cc
                .target_amount
                .checked_add(params.min_cross_chain_tx_fee)
                .ok_or(TxValidateError::AmountOverflow)?;
            if output.value < required {
                return Err(TxValidateError::InvalidOutputPayload(
                    "cross chain output value does not cover target amount and fee".into(),
                ));
            }
            Ok(())
        }
        OutputPayload::Withdraw(w) => {
            if w.genesis_block_address.is_empty() {
                return Err(TxValidateError::InvalidOutputPayload(
                    "withdraw genesis block address is empty".into(),
                ));
            }
            Ok(())
        }
        OutputPayload::ReturnSideChainDeposit(r) => {
            if r.genesis_block_address.is_empty() {
                return Err(TxValidateError::InvalidOutputPayload(
                    "return deposit genesis block address is empty".into(),
                ));
            }
            Ok(())
        }
        OutputPayload::Stake(stake) => {
            if stake.stake_address.prefix_type() != Some(PrefixType::DposV2) {
                return Err(TxValidateError::InvalidOutputPayload(
                    "stake address must carry the DPoS v2 prefix".into(),
                ));
            }
            Ok(())
        }
    }
}

/// Shape of a vote output; candidates are checked against chain state later
pub fn check_vote_output(vote: &VoteOutput) -> TxValidateResult<()> {
    if vote.version > VOTE_DPOS_V2_VERSION {
        return Err(TxValidateError::InvalidOutputPayload(format!(
            "invalid vote version {}",
            vote.version
        )));
    }

    let mut vote_types = HashSet::new();
    for content in &vote.contents {
        if !vote_types.insert(content.vote_type) {
            return Err(TxValidateError::InvalidOutputPayload("duplicate vote type".into()));
        }
        if content.candidates.is_empty()
            || (content.vote_type == VoteType::Delegate
                && content.candidates.len() > MAX_VOTE_PRODUCERS_PER_TRANSACTION)
        {
            return Err(TxValidateError::InvalidOutputPayload(format!(
                "invalid candidate count {}",
                content.candidates.len()
            )));
        }

        let mut candidates = HashSet::new();
        for cv in &content.candidates {
            if !candidates.insert(cv.candidate.as_slice()) {
                return Err(TxValidateError::InvalidOutputPayload("duplicate candidate".into()));
            }
            if vote.version >= VOTE_PRODUCER_AND_CR_VERSION && cv.votes <= 0 {
                return Err(TxValidateError::InvalidOutputPayload(
                    "candidate votes must be positive".into(),
                ));
            }
            if cv.votes > MAX_AMOUNT {
                return Err(TxValidateError::InvalidOutputPayload(
                    "candidate votes exceed the maximum supply".into(),
                ));
            }
        }
    }
    Ok(())
}

fn check_asset_precision(params: &ChainParams, tx: &Transaction) -> TxValidateResult<()> {
    let unit = params.precision_unit();
    if tx.outputs.iter().any(|o| o.value % unit != 0) {
        return Err(TxValidateError::InvalidAssetPrecision);
    }
    Ok(())
}

// =============================================================================
// Attributes and programs
// =============================================================================

fn check_attributes(tx: &Transaction) -> TxValidateResult<()> {
    for attr in &tx.attributes {
        match attr.usage {
            AttributeUsage::Script => {
                let hash = ProgramHash::from_slice(&attr.data)
                    .map_err(|e| TxValidateError::InvalidAttribute(e.to_string()))?;
                if hash.prefix_type().is_none() {
                    return Err(TxValidateError::InvalidAttribute(format!(
                        "unknown script prefix {:#04x}",
                        hash.prefix()
                    )));
                }
            }
            AttributeUsage::Memo | AttributeUsage::Description | AttributeUsage::DescriptionUrl => {
                if attr.data.len() > MAX_ATTRIBUTE_DATA_LENGTH {
                    return Err(TxValidateError::InvalidAttribute(format!(
                        "{:?} data too long: {}",
                        attr.usage,
                        attr.data.len()
                    )));
                }
            }
            AttributeUsage::Nonce | AttributeUsage::Confirmations => {}
        }
    }
    Ok(())
}

fn check_programs(tx: &Transaction) -> TxValidateResult<()> {
    let count = tx.programs.len();
    let valid = match tx.tx_type {
        TxType::InactiveArbitrators => count == 1,
        t if t.is_coinbase() || t.is_illegal_evidence() || t.skips_signature_check() => count == 0,
        _ => count >= 1,
    };
    if !valid {
        return Err(TxValidateError::InvalidProgramCount { tx_type: tx.tx_type, actual: count });
    }
    if tx.programs.iter().any(|p| p.code.is_empty() || p.parameter.is_empty()) {
        return Err(TxValidateError::EmptyProgram);
    }
    Ok(())
}

// =============================================================================
// Payloads
// =============================================================================

fn check_payload(tx: &Transaction) -> TxValidateResult<()> {
    match &tx.payload {
        Payload::RegisterProducer(info) => {
            check_public_key(&info.owner_public_key)?;
            check_public_key(&info.node_public_key)?;
            let chars = info.nickname.chars().count();
            if chars == 0 || chars > MAX_NICKNAME_LENGTH {
                return Err(TxValidateError::InvalidPayload(format!(
                    "invalid nickname length {}",
                    chars
                )));
            }
            Ok(())
        }
        Payload::CancelProducer(p) | Payload::ActivateProducer(p) => check_public_key(&p.owner_public_key),
        Payload::IllegalProposals(p) => {
            check_proposal_evidence(&p.evidence)?;
            check_proposal_evidence(&p.compare_evidence)
        }
        Payload::IllegalVotes(p) => {
            for ev in [&p.evidence, &p.compare_evidence] {
                check_proposal_evidence(&ev.proposal)?;
                check_vote_shape(&ev.vote)?;
            }
            Ok(())
        }
        Payload::IllegalBlocks(p) => {
            check_block_evidence(&p.evidence)?;
            check_block_evidence(&p.compare_evidence)
        }
        Payload::InactiveArbitrators(p) => {
            check_public_key(&p.sponsor)?;
            if p.arbitrators.is_empty() {
                return Err(TxValidateError::InvalidPayload("no inactive arbitrators listed".into()));
            }
            p.arbitrators.iter().try_for_each(|pk| check_public_key(pk))
        }
        Payload::NextTurnDposInfo(p) => p
            .cr_public_keys
            .iter()
            .chain(&p.dpos_public_keys)
            .try_for_each(|pk| check_public_key(pk)),
        Payload::WithdrawFromSideChain(w) => check_unique_hashes(&w.side_chain_transaction_hashes),
        Payload::CrcProposalRealWithdraw(w) => check_unique_hashes(&w.withdraw_transaction_hashes),
        Payload::CoinBase(_)
        | Payload::TransferAsset
        | Payload::Record(_)
        | Payload::TransferCrossChainAsset
        | Payload::ReturnDepositCoin
        | Payload::ReturnCrDepositCoin
        | Payload::CrAssetsRectify
        | Payload::ReturnSideChainDepositCoin
        | Payload::ExchangeVotes => Ok(()),
    }
}

fn check_public_key(pk: &[u8]) -> TxValidateResult<()> {
    decode_point(pk)
        .map(|_| ())
        .map_err(|e| TxValidateError::InvalidPublicKey(e.to_string()))
}

fn check_proposal_shape(proposal: &DposProposal) -> TxValidateResult<()> {
    check_public_key(&proposal.sponsor)?;
    if proposal.sign.is_empty() {
        return Err(TxValidateError::InvalidPayload("proposal is not signed".into()));
    }
    Ok(())
}

fn check_vote_shape(vote: &DposProposalVote) -> TxValidateResult<()> {
    check_public_key(&vote.signer)?;
    if vote.sign.is_empty() {
        return Err(TxValidateError::InvalidPayload("vote is not signed".into()));
    }
    Ok(())
}

fn check_proposal_evidence(evidence: &ProposalEvidence) -> TxValidateResult<()> {
    check_proposal_shape(&evidence.proposal)
}

fn check_block_evidence(evidence: &BlockEvidence) -> TxValidateResult<()> {
    if evidence.signers.is_empty() {
        return Err(TxValidateError::InvalidPayload("block evidence has no signers".into()));
    }
    check_proposal_shape(&evidence.confirm.proposal)?;
    evidence.confirm.votes.iter().try_for_each(check_vote_shape)?;
    evidence.signers.iter().try_for_each(|pk| check_public_key(pk))
}

fn check_unique_hashes(hashes: &[Hash256]) -> TxValidateResult<()> {
    let mut seen = HashSet::with_capacity(hashes.len());
    for hash in hashes {
        if !seen.insert(hash) {
            return Err(TxValidateError::InvalidPayload(format!(
                "duplicate side chain transaction hash {}",
                hash
            )));
        }
    }
    Ok(())
}
