//! Program verification errors

use lib_crypto::CryptoError;
use lib_types::TypesError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScriptError {
    // ========================================================================
    // Structural
    // ========================================================================
    #[error("the number of data hashes {hashes} is different with number of programs {programs}")]
    ProgramCountMismatch { hashes: usize, programs: usize },

    #[error("unknown program hash prefix: {0:#04x}")]
    UnknownPrefix(u8),

    #[error("invalid code: {0}")]
    InvalidCode(String),

    #[error("invalid parameter length: expected {expected}, got {actual}")]
    InvalidParameterLength { expected: usize, actual: usize },

    // ========================================================================
    // Authorization
    // ========================================================================
    #[error("the data hashes is different with corresponding program code")]
    CodeHashMismatch,

    #[error("invalid public key count: expected {expected}, got {actual}")]
    InvalidPublicKeyCount { expected: usize, actual: usize },

    #[error("invalid multi sign signatures, length not enough: {0}")]
    InvalidSignatureLength(usize),

    #[error("invalid signatures, not enough signatures")]
    NotEnoughSignatures,

    #[error("invalid signatures, too many signatures")]
    TooManySignatures,

    #[error("duplicated signatures")]
    DuplicatedSignatures,

    #[error("matched signatures not enough")]
    MatchedSignaturesNotEnough,

    #[error("schnorr signature verify failed")]
    SchnorrVerifyFailed,

    #[error("signature verify failed: {0}")]
    Crypto(#[from] CryptoError),

    #[error("execute engine fault: {0}")]
    VmFault(String),

    #[error("the result stack count is {0}, expected 1")]
    VmStackCount(usize),

    #[error("the program returned false")]
    VmReturnedFalse,
}

impl ScriptError {
    /// Malformed program data, as opposed to a failed authorization
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            ScriptError::ProgramCountMismatch { .. }
                | ScriptError::UnknownPrefix(_)
                | ScriptError::InvalidCode(_)
                | ScriptError::InvalidParameterLength { .. }
        )
    }
}

impl From<TypesError> for ScriptError {
    fn from(err: TypesError) -> Self {
        ScriptError::InvalidCode(err.to_string())
    }
}

pub type ScriptResult<T> = Result<T, ScriptError>;
