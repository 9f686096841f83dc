//! Transaction Validator
//!
//! # Validation Phases
//!
//! 1. **Sanity** - transaction bytes and chain parameters only
//! 2. **Context** - referenced outputs, chain state and the arbitrator set
//!
//! The validator is constructed once per node and shared by handle. It holds
//! no mutable state of its own; concurrent calls are safe as long as the
//! injected collaborators are.

use std::sync::Arc;

use lib_consensus::ArbitratorSet;
use lib_types::{BlockHeight, Payload, Transaction};
use lib_utxo::UtxoResolver;
use tracing::debug;

use super::errors::{TxValidateError, TxValidateResult};
use super::sanity::check_transaction_sanity;
use crate::config::ChainParams;
use crate::state::ChainStateView;

pub struct TransactionValidator {
    pub(super) params: Arc<ChainParams>,
    pub(super) resolver: Arc<UtxoResolver>,
    pub(super) arbitrators: Arc<ArbitratorSet>,
    pub(super) state: Arc<dyn ChainStateView>,
}

impl TransactionValidator {
    pub fn new(
        params: Arc<ChainParams>,
        resolver: Arc<UtxoResolver>,
        arbitrators: Arc<ArbitratorSet>,
        state: Arc<dyn ChainStateView>,
    ) -> Self {
        Self { params, resolver, arbitrators, state }
    }

    pub fn params(&self) -> &ChainParams {
        &self.params
    }

    /// Checks that need no chain state
    pub fn check_sanity(&self, height: BlockHeight, tx: &Transaction) -> TxValidateResult<()> {
        check_transaction_sanity(&self.params, height, tx).map_err(|e| rejected(tx, "sanity", e))
    }

    /// Checks against referenced outputs, chain state and the arbitrator set.
    ///
    /// On success `tx.fee` and `tx.fee_per_kb` are filled in for
    /// transactions that spend inputs.
    pub fn check_context(&self, height: BlockHeight, tx: &mut Transaction) -> TxValidateResult<()> {
        self.context(height, tx).map_err(|e| rejected(tx, "context", e))
    }

    /// Sanity followed by context
    pub fn check_transaction(&self, height: BlockHeight, tx: &mut Transaction) -> TxValidateResult<()> {
        self.check_sanity(height, tx)?;
        self.check_context(height, tx)
    }

    fn context(&self, height: BlockHeight, tx: &mut Transaction) -> TxValidateResult<()> {
        if self.resolver.contains_transaction(&tx.hash())? {
            return Err(TxValidateError::DuplicateTransaction);
        }

        match &tx.payload {
            Payload::IllegalProposals(p) => return self.check_illegal_proposals(p),
            Payload::IllegalVotes(p) => return self.check_illegal_votes(p),
            Payload::IllegalBlocks(p) => return self.check_illegal_blocks(p),
            Payload::InactiveArbitrators(p) => return self.check_inactive_arbitrators(tx, p),
            Payload::NextTurnDposInfo(p) => return self.check_next_turn_info(p),
            Payload::CoinBase(_) => return Ok(()),
            _ => {}
        }

        let references = self.resolver.get_tx_reference(tx)?;
        if self.resolver.is_double_spend(tx) {
            return Err(TxValidateError::DoubleSpend);
        }

        self.check_utxo_lock(tx, &references)?;
        self.check_deposit_utxos(tx, &references)?;
        self.check_coinbase_maturity(height, &references)?;
        self.check_destroyed_utxos(&references)?;
        self.check_deposit_outputs(tx)?;

        let fee = self.check_fee(tx, &references)?;
        let size = tx.serialized_size().max(1) as i64;
        tx.fee = fee;
        tx.fee_per_kb = fee.checked_mul(1000).ok_or(TxValidateError::AmountOverflow)? / size;

        self.check_payload_context(height, tx, &references)?;
        self.check_vote_outputs(height, tx, &references)?;

        if !tx.tx_type.skips_signature_check() {
            self.check_signatures(tx, &references)?;
        }
        Ok(())
    }
}

fn rejected(tx: &Transaction, phase: &str, e: TxValidateError) -> TxValidateError {
    debug!(tx = %tx.hash(), kind = ?e.kind(), "{} check rejected transaction: {}", phase, e);
    e
}
