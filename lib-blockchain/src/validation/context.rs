//! Reference-dependent rules
//!
//! Everything here runs after the inputs were resolved to the outputs they
//! spend. `references` is in input order.

use std::collections::HashSet;

use lib_script::{run_programs, sort_program_hashes, sort_programs};
use lib_types::transaction::LOCKED_SEQUENCE;
use lib_types::{
    checked_sum, AttributeUsage, BlockHeight, Fixed64, PrefixType, ProgramHash, Transaction, TxType,
};
use lib_utxo::References;

use super::errors::{TxValidateError, TxValidateResult};
use super::validator::TransactionValidator;

impl TransactionValidator {
    /// Time-locked outputs need a locked sequence and a late enough lock time
    pub(super) fn check_utxo_lock(&self, tx: &Transaction, references: &References) -> TxValidateResult<()> {
        for (input, output) in references {
            if output.output_lock == 0 {
                continue;
            }
            if input.sequence != LOCKED_SEQUENCE {
                return Err(TxValidateError::InvalidInputSequence);
            }
            if tx.lock_time < output.output_lock {
                return Err(TxValidateError::UtxoLocked);
            }
        }
        Ok(())
    }

    /// Deposit UTXOs are spent by deposit returns and nothing else
    pub(super) fn check_deposit_utxos(&self, tx: &Transaction, references: &References) -> TxValidateResult<()> {
        let is_deposit = |hash: &ProgramHash| hash.prefix_type() == Some(PrefixType::Deposit);
        if tx.tx_type.is_deposit_return() {
            if !references.iter().all(|(_, output)| is_deposit(&output.program_hash)) {
                return Err(TxValidateError::DepositReturnInput);
            }
        } else if references.iter().any(|(_, output)| is_deposit(&output.program_hash)) {
            return Err(TxValidateError::DepositUtxoNotAllowed);
        }
        Ok(())
    }

    pub(super) fn check_coinbase_maturity(
        &self,
        height: BlockHeight,
        references: &References,
    ) -> TxValidateResult<()> {
        for (input, _) in references {
            let stored = self.resolver.get_transaction(&input.previous.tx_id)?;
            if stored.transaction.is_coinbase()
                && height.saturating_sub(stored.height) < self.params.coinbase_maturity
            {
                return Err(TxValidateError::ImmatureCoinbase);
            }
        }
        Ok(())
    }

    pub(super) fn check_destroyed_utxos(&self, references: &References) -> TxValidateResult<()> {
        if references
            .iter()
            .any(|(_, output)| output.program_hash == self.params.destroy_address)
        {
            return Err(TxValidateError::DestroyedUtxo);
        }
        Ok(())
    }

    /// Outputs paying a deposit address must open or return a deposit, or
    /// top up a known one
    pub(super) fn check_deposit_outputs(&self, tx: &Transaction) -> TxValidateResult<()> {
        let deposit_allowed = tx.tx_type == TxType::RegisterProducer || tx.tx_type.is_deposit_return();
        for output in &tx.outputs {
            if output.program_hash.prefix_type() != Some(PrefixType::Deposit) || deposit_allowed {
                continue;
            }
            if !self.state.is_deposit_owner(&output.program_hash) {
                return Err(TxValidateError::InvalidDepositOutput);
            }
        }
        Ok(())
    }

    /// Native-asset inputs minus outputs, at least the minimum fee
    pub(super) fn check_fee(&self, tx: &Transaction, references: &References) -> TxValidateResult<Fixed64> {
        let native = self.params.native_asset_id;
        let inputs = checked_sum(
            references
                .iter()
                .filter(|(_, output)| output.asset_id == native)
                .map(|(_, output)| output.value),
        );
        let outputs = checked_sum(
            tx.outputs
                .iter()
                .filter(|output| output.asset_id == native)
                .map(|output| output.value),
        );

        let fee = inputs
            .zip(outputs)
            .and_then(|(inputs, outputs)| inputs.checked_sub(outputs))
            .ok_or(TxValidateError::AmountOverflow)?;
        if fee < self.params.min_transaction_fee {
            return Err(TxValidateError::FeeNotEnough);
        }
        Ok(fee)
    }

    /// Every input owner and every Script attribute must sign, paired with
    /// the programs in code-hash order
    pub(super) fn check_signatures(&self, tx: &Transaction, references: &References) -> TxValidateResult<()> {
        let mut hashes: Vec<ProgramHash> = references.iter().map(|(_, output)| output.program_hash).collect();
        for attr in tx.attributes.iter().filter(|a| a.usage == AttributeUsage::Script) {
            let hash = ProgramHash::from_slice(&attr.data)
                .map_err(|e| TxValidateError::InvalidAttribute(e.to_string()))?;
            hashes.push(hash);
        }
        let mut seen = HashSet::with_capacity(hashes.len());
        hashes.retain(|hash| seen.insert(*hash));
        sort_program_hashes(&mut hashes);

        let mut programs = tx.programs.clone();
        sort_programs(&mut programs);

        run_programs(&tx.serialize_unsigned(), &hashes, &programs)?;
        Ok(())
    }
}
