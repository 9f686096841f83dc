//! Canonical Primitive Types for chain state
//!
//! These types are the foundational building blocks for all consensus-critical
//! data structures. They are designed to be:
//! - Fixed-size (no dynamic allocation)
//! - Deterministically serializable
//! - Efficient to copy and compare
//!
//! Hash-valued types serialize as lower-case hex strings so they can appear
//! in TOML chain parameters.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::contract::PrefixType;
use crate::errors::{TypesError, TypesResult};
use crate::hashing;

// ============================================================================
// TYPE ALIASES
// ============================================================================

/// Block height in the chain (0-indexed)
pub type BlockHeight = u32;

/// Fixed-point amount, 10^8 units per coin
pub type Fixed64 = i64;

/// One coin in fixed-point units
pub const COIN: Fixed64 = 100_000_000;

/// Total supply ceiling; no single amount or sum of amounts may exceed it
pub const MAX_AMOUNT: Fixed64 = 33_000_000 * COIN;

/// Sum of amounts, `None` on `i64` overflow
pub fn checked_sum<I>(values: I) -> Option<Fixed64>
where
    I: IntoIterator<Item = Fixed64>,
{
    values.into_iter().try_fold(0 as Fixed64, |acc, v| acc.checked_add(v))
}

/// Transaction identifier
pub type TxHash = Hash256;

/// Block identifier
pub type BlockHash = Hash256;

/// Asset identifier carried by every output
pub type AssetId = Hash256;

// ============================================================================
// HASH TYPES
// ============================================================================

/// 32-byte double-SHA-256 digest
#[derive(Clone, Copy, Eq, PartialEq, Hash, PartialOrd, Ord, Default)]
pub struct Hash256(pub [u8; 32]);

impl Hash256 {
    /// Create a new hash from raw bytes
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Create a zeroed hash
    pub const fn zero() -> Self {
        Self([0u8; 32])
    }

    /// Get the underlying bytes
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Check if this is the zero hash
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    pub fn from_slice(bytes: &[u8]) -> TypesResult<Self> {
        let arr: [u8; 32] = bytes.try_into().map_err(|_| TypesError::InvalidLength {
            expected: 32,
            actual: bytes.len(),
        })?;
        Ok(Self(arr))
    }

    pub fn from_hex(s: &str) -> TypesResult<Self> {
        let bytes = hex::decode(s).map_err(|e| TypesError::InvalidHex(e.to_string()))?;
        Self::from_slice(&bytes)
    }
}

impl fmt::Debug for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash256({})", hex::encode(&self.0[..8]))
    }
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl From<[u8; 32]> for Hash256 {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Hash256 {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Serialize for Hash256 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(self.0))
    }
}

impl<'de> Deserialize<'de> for Hash256 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(de::Error::custom)
    }
}

/// 20-byte RIPEMD-160(SHA-256(code)) digest of a contract code
#[derive(Clone, Copy, Eq, PartialEq, Hash, PartialOrd, Ord, Default)]
pub struct CodeHash(pub [u8; 20]);

impl CodeHash {
    /// Hash a contract code
    pub fn from_code(code: &[u8]) -> Self {
        Self(hashing::sha_ripemd(code))
    }

    pub const fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl fmt::Debug for CodeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CodeHash({})", hex::encode(&self.0[..8]))
    }
}

impl fmt::Display for CodeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

// ============================================================================
// PROGRAM HASH
// ============================================================================

/// 21-byte address: one prefix byte followed by the code hash.
///
/// The prefix selects the verification path used when an output owned by
/// this hash is spent.
#[derive(Clone, Copy, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct ProgramHash(pub [u8; 21]);

impl ProgramHash {
    pub const fn new(bytes: [u8; 21]) -> Self {
        Self(bytes)
    }

    pub const fn zero() -> Self {
        Self([0u8; 21])
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 21]
    }

    /// Derive the program hash of `code` under `prefix`
    pub fn from_code(prefix: PrefixType, code: &[u8]) -> Self {
        Self::from_parts(prefix as u8, &CodeHash::from_code(code))
    }

    pub fn from_parts(prefix: u8, code_hash: &CodeHash) -> Self {
        let mut bytes = [0u8; 21];
        bytes[0] = prefix;
        bytes[1..].copy_from_slice(&code_hash.0);
        Self(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> TypesResult<Self> {
        let arr: [u8; 21] = bytes.try_into().map_err(|_| TypesError::InvalidLength {
            expected: 21,
            actual: bytes.len(),
        })?;
        Ok(Self(arr))
    }

    pub fn from_hex(s: &str) -> TypesResult<Self> {
        let bytes = hex::decode(s).map_err(|e| TypesError::InvalidHex(e.to_string()))?;
        Self::from_slice(&bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 21] {
        &self.0
    }

    /// Raw prefix byte
    pub const fn prefix(&self) -> u8 {
        self.0[0]
    }

    /// Known prefix type, `None` for unrecognised prefixes
    pub fn prefix_type(&self) -> Option<PrefixType> {
        PrefixType::from_u8(self.0[0])
    }

    /// The 20 bytes following the prefix
    pub fn code_hash(&self) -> CodeHash {
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&self.0[1..]);
        CodeHash(bytes)
    }
}

impl Default for ProgramHash {
    fn default() -> Self {
        Self::zero()
    }
}

impl fmt::Debug for ProgramHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProgramHash({})", hex::encode(self.0))
    }
}

impl fmt::Display for ProgramHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl AsRef<[u8]> for ProgramHash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Serialize for ProgramHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(self.0))
    }
}

impl<'de> Deserialize<'de> for ProgramHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(de::Error::custom)
    }
}
