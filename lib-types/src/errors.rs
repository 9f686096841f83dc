//! Primitive decoding and template construction errors

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TypesError {
    #[error("invalid length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("invalid hex: {0}")]
    InvalidHex(String),

    #[error("invalid public key length: {0}")]
    InvalidPublicKeyLength(usize),

    #[error("invalid multi-signature parameters: m={m}, n={n}")]
    InvalidMultisigParams { m: usize, n: usize },

    #[error("invalid contract code: {0}")]
    InvalidCode(String),

    #[error("unknown program hash prefix: {0:#04x}")]
    UnknownPrefix(u8),
}

pub type TypesResult<T> = Result<T, TypesError>;
