//! Payload rules that need chain state

use lib_crypto::ecdsa;
use lib_types::contract::{deposit_program_hash, parse_cross_chain_code};
use lib_types::payload::{ProcessProducer, ProducerInfo, PRODUCER_INFO_DPOS_V2_VERSION};
use lib_types::transaction::OutputPayload;
use lib_types::{checked_sum, BlockHeight, Payload, PrefixType, ProgramHash, Transaction};
use lib_utxo::References;

use super::errors::{TxValidateError, TxValidateResult};
use super::validator::TransactionValidator;
use crate::state::ProducerState;

impl TransactionValidator {
    pub(super) fn check_payload_context(
        &self,
        height: BlockHeight,
        tx: &Transaction,
        references: &References,
    ) -> TxValidateResult<()> {
        match &tx.payload {
            Payload::RegisterProducer(info) => self.check_register_producer(height, tx, info),
            Payload::CancelProducer(p) => {
                check_process_signature(p)?;
                match self.state.producer_state(&p.owner_public_key) {
                    None => Err(TxValidateError::ProducerNotFound),
                    Some(ProducerState::Pending | ProducerState::Active | ProducerState::Inactive) => Ok(()),
                    Some(state) => Err(TxValidateError::InvalidProducerState(state)),
                }
            }
            Payload::ActivateProducer(p) => {
                check_process_signature(p)?;
                match self.state.producer_state(&p.owner_public_key) {
                    None => Err(TxValidateError::ProducerNotFound),
                    Some(ProducerState::Inactive) => Ok(()),
                    Some(state) => Err(TxValidateError::InvalidProducerState(state)),
                }
            }
            Payload::WithdrawFromSideChain(_) => self.check_withdraw_program(tx),
            Payload::ExchangeVotes => self.check_exchange_votes(tx, references),
            _ => Ok(()),
        }
    }

    fn check_register_producer(
        &self,
        height: BlockHeight,
        tx: &Transaction,
        info: &ProducerInfo,
    ) -> TxValidateResult<()> {
        ecdsa::verify(
            &info.owner_public_key,
            &info.unsigned_data(tx.payload_version),
            &info.signature,
        )
        .map_err(|_| TxValidateError::InvalidPayloadSignature)?;

        if self.state.producer_state(&info.owner_public_key).is_some() {
            return Err(TxValidateError::ProducerAlreadyRegistered);
        }
        if self.state.node_key_registered(&info.node_public_key) {
            return Err(TxValidateError::NodeKeyAlreadyRegistered);
        }

        if tx.payload_version >= PRODUCER_INFO_DPOS_V2_VERSION {
            if height < self.params.dposv2_start_height {
                return Err(TxValidateError::DposV2NotStarted(self.params.dposv2_start_height));
            }
            if info.stake_until <= height {
                return Err(TxValidateError::InvalidStakeUntil(info.stake_until));
            }
        }

        let deposit = deposit_program_hash(&info.owner_public_key)
            .map_err(|e| TxValidateError::InvalidPublicKey(e.to_string()))?;
        let deposited = checked_sum(
            tx.outputs
                .iter()
                .filter(|o| o.program_hash == deposit)
                .map(|o| o.value),
        )
        .ok_or(TxValidateError::AmountOverflow)?;
        if deposited < self.params.min_deposit_amount {
            return Err(TxValidateError::DepositNotEnough);
        }
        Ok(())
    }

    /// The side-chain withdrawal is signed by an M-of-N over exactly the
    /// current arbitrators, with M a majority
    fn check_withdraw_program(&self, tx: &Transaction) -> TxValidateResult<()> {
        let program = tx
            .programs
            .first()
            .ok_or_else(|| TxValidateError::InvalidWithdrawProgram("missing program".into()))?;
        let code = parse_cross_chain_code(&program.code)
            .map_err(|e| TxValidateError::InvalidWithdrawProgram(e.to_string()))?;

        let arbitrators_count = self.arbitrators.arbitrators_count() as usize;
        if code.n != arbitrators_count {
            return Err(TxValidateError::InvalidWithdrawProgram(format!(
                "{} keys, expected {}",
                code.n, arbitrators_count
            )));
        }
        if !self.arbitrators.has_majority(code.m) {
            return Err(TxValidateError::InvalidWithdrawProgram(format!(
                "m = {} is not a majority",
                code.m
            )));
        }
        if let Some(pk) = code.public_keys.iter().find(|pk| !self.arbitrators.is_arbitrator(pk)) {
            return Err(TxValidateError::InvalidWithdrawProgram(format!(
                "{} is not a current arbitrator",
                hex::encode(pk)
            )));
        }
        Ok(())
    }

    /// Stake goes to the stake pool and is credited to the stake address of
    /// the single owner of all inputs
    fn check_exchange_votes(&self, tx: &Transaction, references: &References) -> TxValidateResult<()> {
        let (output, stake) = tx
            .outputs
            .iter()
            .find_map(|o| match &o.payload {
                OutputPayload::Stake(stake) => Some((o, stake)),
                _ => None,
            })
            .ok_or_else(|| TxValidateError::InvalidStakeOutput("missing stake output".into()))?;

        if output.program_hash != self.params.stake_pool {
            return Err(TxValidateError::InvalidStakeOutput(
                "stake output must pay the stake pool".into(),
            ));
        }

        let owner = match references.first() {
            Some((_, first)) => first.program_hash,
            None => return Err(TxValidateError::EmptyInputs),
        };
        if references.iter().any(|(_, o)| o.program_hash != owner) {
            return Err(TxValidateError::InvalidStakeOutput("inputs have more than one owner".into()));
        }
        if owner.prefix_type() != Some(PrefixType::Standard) {
            return Err(TxValidateError::InvalidStakeOutput("inputs must be owned by a standard address".into()));
        }
        let expected = ProgramHash::from_parts(PrefixType::DposV2 as u8, &owner.code_hash());
        if stake.stake_address != expected {
            return Err(TxValidateError::InvalidStakeOutput(
                "stake address does not belong to the input owner".into(),
            ));
        }
        Ok(())
    }
}

fn check_process_signature(p: &ProcessProducer) -> TxValidateResult<()> {
    ecdsa::verify(&p.owner_public_key, &p.unsigned_data(), &p.signature)
        .map_err(|_| TxValidateError::InvalidPayloadSignature)
}
