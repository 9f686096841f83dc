//! Signature Foundation Module
//!
//! Two schemes over secp256k1, both with 33-byte compressed public keys and
//! 64-byte signatures:
//!
//! - [`ecdsa`]: standard single-key signatures over SHA-256 of the data
//! - [`schnorr`]: multi-party Schnorr signatures that verify against one
//!   aggregated public key

pub mod ecdsa;
pub mod errors;
pub mod schnorr;

pub use errors::{CryptoError, CryptoResult};

/// Compressed SEC1 public key length
pub const PUBLIC_KEY_LENGTH: usize = 33;
/// Raw private scalar length
pub const PRIVATE_KEY_LENGTH: usize = 32;
/// `r || s`
pub const SIGNATURE_LENGTH: usize = 64;
