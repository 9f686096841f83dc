//! Validation Errors
//!
//! One variant per rejected rule. Messages are stable: peers and tooling
//! match on them. [`TxValidateError::kind`] tells the caller what to do with
//! a rejection.

use lib_consensus::ConsensusError;
use lib_script::ScriptError;
use lib_types::{OutputType, ProgramHash, TxHash, TxType};
use lib_utxo::UtxoError;
use thiserror::Error;

use crate::state::ProducerState;

/// How a caller should treat a rejected transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed; never valid
    Structural,
    /// Referenced data unknown; may become valid as more blocks arrive
    Resolution,
    /// Signatures or payload signatures do not verify
    Authorization,
    /// Well-formed but violates a chain rule
    Policy,
    /// Disagrees with the elected arbitrator set
    ConsensusSet,
    /// Validation could not be performed; the node must stop
    Fatal,
}

/// Transaction validation error
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TxValidateError {
    // =========================================================================
    // Structure Errors
    // =========================================================================

    #[error("invalid transaction size {size}, max {max}")]
    InvalidSize { size: usize, max: usize },

    #[error("transaction payload does not match type {0:?}")]
    PayloadTypeMismatch(TxType),

    #[error("unsupported payload version {version} for {tx_type:?}")]
    UnsupportedPayloadVersion { tx_type: TxType, version: u8 },

    #[error("coinbase must have exactly one null input")]
    InvalidCoinbaseInput,

    #[error("{0:?} transaction must not have inputs")]
    UnexpectedInputs(TxType),

    #[error("transaction has no inputs")]
    EmptyInputs,

    #[error("invalid transaction input: null outpoint")]
    NullInput,

    #[error("duplicate input {tx_id}:{index}")]
    DuplicateInput { tx_id: TxHash, index: u16 },

    #[error("too many inputs: {0}")]
    TooManyInputs(usize),

    #[error("coinbase output is not enough, at least 2")]
    CoinbaseOutputCount(usize),

    #[error("first output address should be foundation")]
    CoinbaseFoundationMissing,

    #[error("reward to foundation in coinbase < 30%")]
    FoundationRewardTooLow,

    #[error("{0:?} transaction must not have outputs")]
    UnexpectedOutputs(TxType),

    #[error("transaction has no outputs")]
    EmptyOutputs,

    #[error("asset ID in output is invalid")]
    InvalidOutputAsset,

    #[error("invalid transaction output value {0}")]
    InvalidOutputValue(i64),

    #[error("output amounts exceed the maximum supply")]
    AmountOverflow,

    #[error("invalid output address {0}")]
    InvalidOutputAddress(ProgramHash),

    #[error("transaction has more than one special output")]
    MultipleSpecialOutputs,

    #[error("special output requires transaction version 09")]
    SpecialOutputVersion,

    #[error("output type {output_type:?} not allowed in {tx_type:?} transaction")]
    OutputTypeNotAllowed { output_type: OutputType, tx_type: TxType },

    #[error("invalid output payload: {0}")]
    InvalidOutputPayload(String),

    #[error("invalid asset precision")]
    InvalidAssetPrecision,

    #[error("invalid attribute: {0}")]
    InvalidAttribute(String),

    #[error("invalid program count {actual} for {tx_type:?}")]
    InvalidProgramCount { tx_type: TxType, actual: usize },

    #[error("program code or parameter is empty")]
    EmptyProgram,

    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    // =========================================================================
    // Reference Errors
    // =========================================================================

    #[error("duplicate transaction")]
    DuplicateTransaction,

    #[error("transaction not yet valid: {0}")]
    NotYetValid(UtxoError),

    #[error("double spent UTXO inputs")]
    DoubleSpend,

    #[error("invalid input sequence")]
    InvalidInputSequence,

    #[error("UTXO output locked")]
    UtxoLocked,

    #[error("cannot use utxo from deposit address")]
    DepositUtxoNotAllowed,

    #[error("deposit return may only spend deposit utxos")]
    DepositReturnInput,

    #[error("the reference coinbase is not mature")]
    ImmatureCoinbase,

    #[error("cannot use utxo from the destruction address")]
    DestroyedUtxo,

    #[error("deposit output not allowed for this transaction")]
    InvalidDepositOutput,

    #[error("transaction fee not enough")]
    FeeNotEnough,

    // =========================================================================
    // Payload Errors
    // =========================================================================

    #[error("invalid payload signature")]
    InvalidPayloadSignature,

    #[error("producer already registered")]
    ProducerAlreadyRegistered,

    #[error("producer node key already registered")]
    NodeKeyAlreadyRegistered,

    #[error("producer not found")]
    ProducerNotFound,

    #[error("producer in state {0:?} can not do this")]
    InvalidProducerState(ProducerState),

    #[error("deposit amount is not enough")]
    DepositNotEnough,

    #[error("invalid stake until height {0}")]
    InvalidStakeUntil(u32),

    #[error("invalid withdraw multisig: {0}")]
    InvalidWithdrawProgram(String),

    #[error("invalid stake output: {0}")]
    InvalidStakeOutput(String),

    // =========================================================================
    // Vote Errors
    // =========================================================================

    #[error("invalid vote output payload {0} candidate")]
    InvalidVoteCandidate(&'static str),

    #[error("votes larger than output amount")]
    VotesExceedOutputValue,

    #[error("vote output version {version} can not carry {vote_type} votes")]
    VoteVersionNotSupported { version: u8, vote_type: &'static str },

    #[error("cr vote tx must during voting period")]
    NotInVotingPeriod,

    #[error("dposv2 votes are not allowed before height {0}")]
    DposV2NotStarted(u32),

    #[error("invalid vote lock time {0}")]
    InvalidVoteLockTime(u32),

    #[error("vote lock time can not be decreased")]
    VoteLockTimeDecreased,

    #[error("invalid dposv2 voter: {0}")]
    InvalidDposV2Voter(String),

    // =========================================================================
    // Evidence Errors
    // =========================================================================

    #[error("evidence should be in same height")]
    EvidenceHeightMismatch,

    #[error("{0} can not be same")]
    IdenticalEvidence(&'static str),

    #[error("evidence order error")]
    EvidenceOrderError,

    #[error("invalid evidence: {0}")]
    InvalidEvidence(String),

    #[error("{0} is not an arbitrator")]
    NotArbitrator(String),

    #[error("invalid evidence signature")]
    InvalidEvidenceSignature,

    #[error("confirm votes not reach majority")]
    InsufficientConfirmVotes,

    #[error("sponsor is not a CRC arbitrator")]
    SponsorNotCrc,

    #[error("invalid inactive arbitrator {0}")]
    InvalidInactiveArbitrator(String),

    #[error("invalid CRC multisig: {0}")]
    InvalidCrcMultisig(String),

    #[error("next turn dpos info does not match the next arbitrators")]
    NextTurnInfoMismatch,

    // =========================================================================
    // Collaborator Errors
    // =========================================================================

    #[error("{0}")]
    Script(#[from] ScriptError),

    #[error("arbitrator set error: {0}")]
    Consensus(#[from] ConsensusError),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl TxValidateError {
    pub fn kind(&self) -> ErrorKind {
        use TxValidateError::*;
        match self {
            InvalidSize { .. }
            | PayloadTypeMismatch(_)
            | UnsupportedPayloadVersion { .. }
            | InvalidCoinbaseInput
            | UnexpectedInputs(_)
            | EmptyInputs
            | NullInput
            | DuplicateInput { .. }
            | TooManyInputs(_)
            | CoinbaseOutputCount(_)
            | CoinbaseFoundationMissing
            | FoundationRewardTooLow
            | UnexpectedOutputs(_)
            | EmptyOutputs
            | InvalidOutputAsset
            | InvalidOutputValue(_)
            | AmountOverflow
            | InvalidOutputAddress(_)
            | MultipleSpecialOutputs
            | SpecialOutputVersion
            | OutputTypeNotAllowed { .. }
            | InvalidOutputPayload(_)
            | InvalidAssetPrecision
            | InvalidAttribute(_)
            | InvalidProgramCount { .. }
            | EmptyProgram
            | InvalidPayload(_)
            | InvalidPublicKey(_) => ErrorKind::Structural,

            NotYetValid(_) => ErrorKind::Resolution,

            InvalidPayloadSignature | InvalidEvidenceSignature => ErrorKind::Authorization,
            Script(e) if e.is_structural() => ErrorKind::Structural,
            Script(_) => ErrorKind::Authorization,

            NotArbitrator(_)
            | InsufficientConfirmVotes
            | SponsorNotCrc
            | InvalidInactiveArbitrator(_)
            | InvalidCrcMultisig(_)
            | InvalidWithdrawProgram(_)
            | NextTurnInfoMismatch => ErrorKind::ConsensusSet,
            Consensus(e) if e.is_fatal() => ErrorKind::Fatal,
            Consensus(_) => ErrorKind::ConsensusSet,

            Storage(_) => ErrorKind::Fatal,

            DuplicateTransaction
            | DoubleSpend
            | InvalidInputSequence
            | UtxoLocked
            | DepositUtxoNotAllowed
            | DepositReturnInput
            | ImmatureCoinbase
            | DestroyedUtxo
            | InvalidDepositOutput
            | FeeNotEnough
            | ProducerAlreadyRegistered
            | NodeKeyAlreadyRegistered
            | ProducerNotFound
            | InvalidProducerState(_)
            | DepositNotEnough
            | InvalidStakeUntil(_)
            | InvalidStakeOutput(_)
            | InvalidVoteCandidate(_)
            | VotesExceedOutputValue
            | VoteVersionNotSupported { .. }
            | NotInVotingPeriod
            | DposV2NotStarted(_)
            | InvalidVoteLockTime(_)
            | VoteLockTimeDecreased
            | InvalidDposV2Voter(_)
            | EvidenceHeightMismatch
            | IdenticalEvidence(_)
            | EvidenceOrderError
            | InvalidEvidence(_) => ErrorKind::Policy,
        }
    }
}

impl From<UtxoError> for TxValidateError {
    fn from(e: UtxoError) -> Self {
        if e.is_resolution() {
            TxValidateError::NotYetValid(e)
        } else {
            TxValidateError::Storage(e.to_string())
        }
    }
}

/// Result type for transaction validation
pub type TxValidateResult<T> = Result<T, TxValidateError>;

#[cfg(test)]
mod tests {
    use super::*;
    use lib_types::Hash256;

    #[test]
    fn test_stable_messages() {
        assert_eq!(TxValidateError::EvidenceOrderError.to_string(), "evidence order error");
        assert_eq!(
            TxValidateError::FoundationRewardTooLow.to_string(),
            "reward to foundation in coinbase < 30%"
        );
        assert_eq!(
            TxValidateError::InvalidVoteCandidate("producer").to_string(),
            "invalid vote output payload producer candidate"
        );
    }

    #[test]
    fn test_resolution_vs_storage() {
        let missing: TxValidateError = UtxoError::TransactionNotFound(Hash256::zero()).into();
        assert_eq!(missing.kind(), ErrorKind::Resolution);
        let broken: TxValidateError = UtxoError::Storage("disk".into()).into();
        assert_eq!(broken.kind(), ErrorKind::Fatal);
    }

    #[test]
    fn test_script_errors_split() {
        let count = TxValidateError::from(ScriptError::ProgramCountMismatch { hashes: 1, programs: 2 });
        assert_eq!(count.kind(), ErrorKind::Structural);
        let dup = TxValidateError::from(ScriptError::DuplicatedSignatures);
        assert_eq!(dup.kind(), ErrorKind::Authorization);
    }

    #[test]
    fn test_empty_arbitrator_set_is_fatal() {
        let err = TxValidateError::from(ConsensusError::EmptyArbitratorSet);
        assert_eq!(err.kind(), ErrorKind::Fatal);
    }
}
