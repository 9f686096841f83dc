//! Transaction model
//!
//! A transaction is immutable once its hash has been observed: the id is
//! SHA-256d of the unsigned encoding and is materialized at most once.

use std::sync::OnceLock;

use crate::codec::Encoder;
use crate::hashing::sha256d;
use crate::payload::Payload;
use crate::primitives::{AssetId, Fixed64, ProgramHash, TxHash};

pub use crate::output::{
    CandidateVotes, CrossChainOutput, OutputPayload, OutputType, ReturnSideChainDepositOutput,
    StakeOutput, VoteContent, VoteOutput, VoteType, WithdrawOutput,
};

/// First version whose outputs carry a type and payload
pub const TX_VERSION_09: u8 = 0x09;
pub const TX_VERSION_DEFAULT: u8 = 0x00;

/// Sequence an input must carry to spend a time-locked output
pub const LOCKED_SEQUENCE: u32 = u32::MAX - 1;

// ============================================================================
// TRANSACTION TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TxType {
    CoinBase = 0x00,
    TransferAsset = 0x02,
    Record = 0x03,
    WithdrawFromSideChain = 0x07,
    TransferCrossChainAsset = 0x08,
    RegisterProducer = 0x09,
    CancelProducer = 0x0a,
    ReturnDepositCoin = 0x0c,
    ActivateProducer = 0x0d,
    IllegalProposalEvidence = 0x0e,
    IllegalVoteEvidence = 0x0f,
    IllegalBlockEvidence = 0x10,
    InactiveArbitrators = 0x12,
    NextTurnDposInfo = 0x14,
    ReturnCrDepositCoin = 0x24,
    CrcProposalRealWithdraw = 0x2a,
    CrAssetsRectify = 0x2b,
    ReturnSideChainDepositCoin = 0x51,
    ExchangeVotes = 0x62,
}

impl TxType {
    pub fn is_coinbase(self) -> bool {
        self == TxType::CoinBase
    }

    pub fn is_illegal_evidence(self) -> bool {
        matches!(
            self,
            TxType::IllegalProposalEvidence
                | TxType::IllegalVoteEvidence
                | TxType::IllegalBlockEvidence
        )
    }

    /// Types that move no value: no inputs, no outputs
    pub fn is_no_cost(self) -> bool {
        self.is_illegal_evidence()
            || matches!(self, TxType::InactiveArbitrators | TxType::NextTurnDposInfo)
    }

    /// Administrative types produced by block producers without signatures
    pub fn skips_signature_check(self) -> bool {
        matches!(
            self,
            TxType::NextTurnDposInfo | TxType::CrcProposalRealWithdraw | TxType::CrAssetsRectify
        )
    }

    pub fn is_deposit_return(self) -> bool {
        matches!(self, TxType::ReturnDepositCoin | TxType::ReturnCrDepositCoin)
    }
}

// ============================================================================
// INPUTS
// ============================================================================

/// Reference to one output of a previous transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OutPoint {
    pub tx_id: TxHash,
    pub index: u16,
}

impl OutPoint {
    pub const NULL_INDEX: u16 = u16::MAX;

    pub fn new(tx_id: TxHash, index: u16) -> Self {
        Self { tx_id, index }
    }

    pub fn null() -> Self {
        Self { tx_id: TxHash::zero(), index: Self::NULL_INDEX }
    }

    pub fn is_null(&self) -> bool {
        self.tx_id.is_zero() && self.index == Self::NULL_INDEX
    }

    fn encode(&self, enc: &mut Encoder) {
        enc.write_bytes(self.tx_id.as_bytes());
        enc.write_u16(self.index);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Input {
    pub previous: OutPoint,
    pub sequence: u32,
}

impl Input {
    pub fn new(previous: OutPoint, sequence: u32) -> Self {
        Self { previous, sequence }
    }

    /// The single input every coinbase carries
    pub fn coinbase() -> Self {
        Self { previous: OutPoint::null(), sequence: u32::MAX }
    }

    pub fn is_coinbase_input(&self) -> bool {
        self.previous.is_null() && self.sequence == u32::MAX
    }

    fn encode(&self, enc: &mut Encoder) {
        self.previous.encode(enc);
        enc.write_u32(self.sequence);
    }
}

// ============================================================================
// OUTPUTS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Output {
    pub asset_id: AssetId,
    pub value: Fixed64,
    pub output_lock: u32,
    pub program_hash: ProgramHash,
    /// Type tag and type-specific data; the tag is the output type
    pub payload: OutputPayload,
}

impl Output {
    pub fn new(asset_id: AssetId, value: Fixed64, program_hash: ProgramHash) -> Self {
        Self { asset_id, value, output_lock: 0, program_hash, payload: OutputPayload::Default }
    }

    pub fn output_type(&self) -> OutputType {
        self.payload.output_type()
    }

    fn encode(&self, enc: &mut Encoder, tx_version: u8) {
        enc.write_bytes(self.asset_id.as_bytes());
        enc.write_i64(self.value);
        enc.write_u32(self.output_lock);
        enc.write_bytes(self.program_hash.as_bytes());
        if tx_version >= TX_VERSION_09 {
            enc.write_u8(self.output_type() as u8);
            self.payload.encode(enc);
        }
    }
}

// ============================================================================
// ATTRIBUTES AND PROGRAMS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum AttributeUsage {
    Nonce = 0x00,
    /// Data is a program hash that must also sign the transaction
    Script = 0x20,
    Memo = 0x81,
    Description = 0x90,
    DescriptionUrl = 0x91,
    Confirmations = 0x92,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub usage: AttributeUsage,
    pub data: Vec<u8>,
}

impl Attribute {
    pub fn new(usage: AttributeUsage, data: Vec<u8>) -> Self {
        Self { usage, data }
    }

    fn encode(&self, enc: &mut Encoder) {
        enc.write_u8(self.usage as u8);
        enc.write_var_bytes(&self.data);
    }
}

/// Contract code plus the parameter (signatures) that satisfies it
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Program {
    pub code: Vec<u8>,
    pub parameter: Vec<u8>,
}

impl Program {
    pub fn new(code: Vec<u8>, parameter: Vec<u8>) -> Self {
        Self { code, parameter }
    }

    fn encode(&self, enc: &mut Encoder) {
        enc.write_var_bytes(&self.parameter);
        enc.write_var_bytes(&self.code);
    }
}

// ============================================================================
// TRANSACTION
// ============================================================================

#[derive(Debug, Clone)]
pub struct Transaction {
    pub version: u8,
    pub tx_type: TxType,
    pub payload_version: u8,
    pub payload: Payload,
    pub attributes: Vec<Attribute>,
    pub inputs: Vec<Input>,
    pub outputs: Vec<Output>,
    pub lock_time: u32,
    pub programs: Vec<Program>,
    /// Set by context validation
    pub fee: Fixed64,
    /// Set by context validation
    pub fee_per_kb: Fixed64,
    hash: OnceLock<TxHash>,
}

impl Transaction {
    /// A version-09 transaction whose type follows its payload
    pub fn new(payload: Payload) -> Self {
        Self {
            version: TX_VERSION_09,
            tx_type: payload.tx_type(),
            payload_version: 0,
            payload,
            attributes: Vec::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            lock_time: 0,
            programs: Vec::new(),
            fee: 0,
            fee_per_kb: 0,
            hash: OnceLock::new(),
        }
    }

    pub fn is_coinbase(&self) -> bool {
        self.tx_type.is_coinbase()
    }

    /// Canonical encoding without programs; the signable data
    pub fn serialize_unsigned(&self) -> Vec<u8> {
        let mut enc = Encoder::new();
        self.encode_unsigned(&mut enc);
        enc.into_bytes()
    }

    /// Canonical encoding including programs
    pub fn serialize(&self) -> Vec<u8> {
        let mut enc = Encoder::new();
        self.encode_unsigned(&mut enc);
        enc.write_var_uint(self.programs.len() as u64);
        for program in &self.programs {
            program.encode(&mut enc);
        }
        enc.into_bytes()
    }

    pub fn serialized_size(&self) -> usize {
        self.serialize().len()
    }

    /// SHA-256d of the unsigned encoding, computed on first use.
    ///
    /// Mutating the transaction after this call does not refresh the id.
    pub fn hash(&self) -> TxHash {
        *self
            .hash
            .get_or_init(|| TxHash::new(sha256d(&self.serialize_unsigned())))
    }

    fn encode_unsigned(&self, enc: &mut Encoder) {
        if self.version >= TX_VERSION_09 {
            enc.write_u8(self.version);
        }
        enc.write_u8(self.tx_type as u8);
        enc.write_u8(self.payload_version);
        self.payload.encode(enc, self.payload_version);

        enc.write_var_uint(self.attributes.len() as u64);
        for attr in &self.attributes {
            attr.encode(enc);
        }
        enc.write_var_uint(self.inputs.len() as u64);
        for input in &self.inputs {
            input.encode(enc);
        }
        enc.write_var_uint(self.outputs.len() as u64);
        for output in &self.outputs {
            output.encode(enc, self.version);
        }
        enc.write_u32(self.lock_time);
    }
}
