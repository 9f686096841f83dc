//! Transaction payloads
//!
//! One variant per supported transaction kind. [`Payload::tx_type`] names
//! the transaction type a payload belongs to; validation rejects a
//! transaction whose declared type disagrees.

pub mod dpos;
pub mod producer;

use crate::codec::Encoder;
use crate::primitives::{BlockHeight, Hash256};
use crate::transaction::TxType;

pub use dpos::{
    BlockEvidence, Confirm, DposIllegalBlocks, DposIllegalProposals, DposIllegalVotes,
    DposProposal, DposProposalVote, InactiveArbitrators, NextTurnDposInfo, ProposalEvidence,
    VoteEvidence, COIN_TYPE_MAIN_CHAIN,
};
pub use producer::{ProcessProducer, ProducerInfo, PRODUCER_INFO_DPOS_V2_VERSION};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoinBase {
    pub content: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub record_type: String,
    pub content: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WithdrawFromSideChain {
    pub block_height: BlockHeight,
    pub genesis_block_address: String,
    pub side_chain_transaction_hashes: Vec<Hash256>,
}

/// CR proposal funds paid out from the CR expenses address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrcProposalRealWithdraw {
    pub withdraw_transaction_hashes: Vec<Hash256>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    CoinBase(CoinBase),
    TransferAsset,
    Record(Record),
    WithdrawFromSideChain(WithdrawFromSideChain),
    TransferCrossChainAsset,
    RegisterProducer(ProducerInfo),
    CancelProducer(ProcessProducer),
    ReturnDepositCoin,
    ActivateProducer(ProcessProducer),
    IllegalProposals(DposIllegalProposals),
    IllegalVotes(DposIllegalVotes),
    IllegalBlocks(DposIllegalBlocks),
    InactiveArbitrators(InactiveArbitrators),
    NextTurnDposInfo(NextTurnDposInfo),
    ReturnCrDepositCoin,
    CrcProposalRealWithdraw(CrcProposalRealWithdraw),
    CrAssetsRectify,
    ReturnSideChainDepositCoin,
    ExchangeVotes,
}

impl Payload {
    pub fn tx_type(&self) -> TxType {
        match self {
            Payload::CoinBase(_) => TxType::CoinBase,
            Payload::TransferAsset => TxType::TransferAsset,
            Payload::Record(_) => TxType::Record,
            Payload::WithdrawFromSideChain(_) => TxType::WithdrawFromSideChain,
            Payload::TransferCrossChainAsset => TxType::TransferCrossChainAsset,
            Payload::RegisterProducer(_) => TxType::RegisterProducer,
            Payload::CancelProducer(_) => TxType::CancelProducer,
            Payload::ReturnDepositCoin => TxType::ReturnDepositCoin,
            Payload::ActivateProducer(_) => TxType::ActivateProducer,
            Payload::IllegalProposals(_) => TxType::IllegalProposalEvidence,
            Payload::IllegalVotes(_) => TxType::IllegalVoteEvidence,
            Payload::IllegalBlocks(_) => TxType::IllegalBlockEvidence,
            Payload::InactiveArbitrators(_) => TxType::InactiveArbitrators,
            Payload::NextTurnDposInfo(_) => TxType::NextTurnDposInfo,
            Payload::ReturnCrDepositCoin => TxType::ReturnCrDepositCoin,
            Payload::CrcProposalRealWithdraw(_) => TxType::CrcProposalRealWithdraw,
            Payload::CrAssetsRectify => TxType::CrAssetsRectify,
            Payload::ReturnSideChainDepositCoin => TxType::ReturnSideChainDepositCoin,
            Payload::ExchangeVotes => TxType::ExchangeVotes,
        }
    }

    pub(crate) fn encode(&self, enc: &mut Encoder, payload_version: u8) {
        match self {
            Payload::CoinBase(p) => enc.write_var_bytes(&p.content),
            Payload::Record(p) => {
                enc.write_var_string(&p.record_type);
                enc.write_var_bytes(&p.content);
            }
            Payload::WithdrawFromSideChain(p) => {
                enc.write_u32(p.block_height);
                enc.write_var_string(&p.genesis_block_address);
                enc.write_var_uint(p.side_chain_transaction_hashes.len() as u64);
                for h in &p.side_chain_transaction_hashes {
                    enc.write_bytes(h.as_bytes());
                }
            }
            Payload::RegisterProducer(p) => p.encode(enc, payload_version),
            Payload::CancelProducer(p) | Payload::ActivateProducer(p) => p.encode(enc),
            Payload::IllegalProposals(p) => p.encode(enc),
            Payload::IllegalVotes(p) => p.encode(enc),
            Payload::IllegalBlocks(p) => p.encode(enc),
            Payload::InactiveArbitrators(p) => p.encode(enc),
            Payload::NextTurnDposInfo(p) => p.encode(enc),
            Payload::CrcProposalRealWithdraw(p) => {
                enc.write_var_uint(p.withdraw_transaction_hashes.len() as u64);
                for h in &p.withdraw_transaction_hashes {
                    enc.write_bytes(h.as_bytes());
                }
            }
            Payload::TransferAsset
            | Payload::TransferCrossChainAsset
            | Payload::ReturnDepositCoin
            | Payload::ReturnCrDepositCoin
            | Payload::CrAssetsRectify
            | Payload::ReturnSideChainDepositCoin
            | Payload::ExchangeVotes => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_names_its_type() {
        assert_eq!(Payload::TransferAsset.tx_type(), TxType::TransferAsset);
        assert_eq!(
            Payload::CoinBase(CoinBase { content: vec![] }).tx_type(),
            TxType::CoinBase
        );
        assert_eq!(
            Payload::NextTurnDposInfo(NextTurnDposInfo {
                working_height: 1,
                cr_public_keys: vec![],
                dpos_public_keys: vec![],
            })
            .tx_type(),
            TxType::NextTurnDposInfo
        );
    }
}
