//! Signature errors
//!
//! Malformed inputs are errors; a well-formed signature that does not verify
//! is reported separately by each scheme.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("invalid private key")]
    InvalidPrivateKey,

    #[error("invalid public key encoding: {0}")]
    InvalidPublicKeyEncoding(String),

    #[error("public key is not on the curve")]
    PointNotOnCurve,

    #[error("invalid signature length: {0}")]
    InvalidSignatureLength(usize),

    #[error("invalid signature encoding")]
    InvalidSignatureEncoding,

    #[error("signature r is not below the field prime")]
    SignatureRTooLarge,

    #[error("signature s is not below the curve order")]
    SignatureSTooLarge,

    #[error("signature verification failed")]
    VerificationFailed,

    #[error("no keys to aggregate")]
    EmptyKeySet,

    #[error("aggregation produced the point at infinity")]
    PointAtInfinity,
}

pub type CryptoResult<T> = Result<T, CryptoError>;
