//! Arbitrator identity and set snapshots

use lib_types::contract::standard_program_hash;
use lib_types::{BlockHeight, ProgramHash};

use crate::{ConsensusError, ConsensusResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArbitratorKind {
    /// Elected by producer votes
    Producer,
    /// Permanent council seat
    Crc,
}

/// An arbitrator's public key with its derived standard program hash.
///
/// Immutable: the program hash is derived once, so the key and hash lists
/// of a set can never drift apart.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Arbitrator {
    public_key: Vec<u8>,
    program_hash: ProgramHash,
    kind: ArbitratorKind,
}

impl Arbitrator {
    pub fn new(public_key: Vec<u8>, kind: ArbitratorKind) -> ConsensusResult<Self> {
        let program_hash = standard_program_hash(&public_key)
            .map_err(|e| ConsensusError::InvalidPublicKey(e.to_string()))?;
        Ok(Self { public_key, program_hash, kind })
    }

    pub fn producer(public_key: Vec<u8>) -> ConsensusResult<Self> {
        Self::new(public_key, ArbitratorKind::Producer)
    }

    pub fn crc(public_key: Vec<u8>) -> ConsensusResult<Self> {
        Self::new(public_key, ArbitratorKind::Crc)
    }

    pub fn public_key(&self) -> &[u8] {
        &self.public_key
    }

    pub fn program_hash(&self) -> ProgramHash {
        self.program_hash
    }

    pub fn kind(&self) -> ArbitratorKind {
        self.kind
    }

    pub fn is_crc(&self) -> bool {
        self.kind == ArbitratorKind::Crc
    }

    /// Lower-case hex of the public key; the rotation sort key
    pub fn hex_key(&self) -> String {
        hex::encode(&self.public_key)
    }
}

/// Consistent copy of the arbitrator set taken under its lock
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArbitratorSetSnapshot {
    pub height: BlockHeight,
    pub current_arbitrators: Vec<Arbitrator>,
    pub current_candidates: Vec<Arbitrator>,
    pub next_arbitrators: Vec<Arbitrator>,
    pub next_candidates: Vec<Arbitrator>,
    pub disabled_arbitrators: Vec<Vec<u8>>,
    pub duty_changed_count: u32,
    pub arbitrators_count: u32,
    pub candidates_count: u32,
    pub majority_count: u32,
}
