//! Arbitrator set configuration

use serde::{Deserialize, Serialize};

use super::types::Arbitrator;
use crate::{ConsensusError, ConsensusResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArbitratorsConfig {
    /// Arbitrators on duty per term, council seats included
    pub arbitrators_count: u32,
    /// Ranked producers kept as standby candidates
    pub candidates_count: u32,
    /// Signatures needed for a majority decision
    pub majority_count: u32,
    /// Hex-encoded council public keys, seated every term
    pub crc_arbitrators: Vec<String>,
}

impl Default for ArbitratorsConfig {
    fn default() -> Self {
        Self {
            arbitrators_count: 12,
            candidates_count: 24,
            majority_count: 9,
            crc_arbitrators: Vec::new(),
        }
    }
}

impl ArbitratorsConfig {
    /// Five arbitrators, two of them council seats
    pub fn for_testing(crc_arbitrators: Vec<String>) -> Self {
        Self {
            arbitrators_count: 5,
            candidates_count: 3,
            majority_count: 4,
            crc_arbitrators,
        }
    }

    pub fn validate(&self) -> ConsensusResult<()> {
        if self.arbitrators_count < 2 {
            return Err(ConsensusError::InvalidConfig(format!(
                "arbitrators_count must be at least 2, got {}",
                self.arbitrators_count
            )));
        }
        if self.majority_count == 0 || self.majority_count > self.arbitrators_count {
            return Err(ConsensusError::InvalidConfig(format!(
                "majority_count {} must be in 1..={}",
                self.majority_count, self.arbitrators_count
            )));
        }
        if self.crc_arbitrators.len() > self.arbitrators_count as usize {
            return Err(ConsensusError::InvalidConfig(format!(
                "{} council seats exceed {} arbitrators",
                self.crc_arbitrators.len(),
                self.arbitrators_count
            )));
        }
        let keys = self.crc_arbitrators()?;
        for (i, a) in keys.iter().enumerate() {
            if keys[..i].iter().any(|b| b.public_key() == a.public_key()) {
                return Err(ConsensusError::InvalidConfig(format!(
                    "duplicate council key {}",
                    a.hex_key()
                )));
            }
        }
        Ok(())
    }

    /// Parsed council arbitrators, in configuration order
    pub fn crc_arbitrators(&self) -> ConsensusResult<Vec<Arbitrator>> {
        self.crc_arbitrators
            .iter()
            .map(|h| {
                let pk = hex::decode(h)
                    .map_err(|e| ConsensusError::InvalidPublicKey(format!("{}: {}", h, e)))?;
                Arbitrator::crc(pk)
            })
            .collect()
    }

    /// Seats left for elected producers
    pub fn producer_seats(&self) -> usize {
        (self.arbitrators_count as usize).saturating_sub(self.crc_arbitrators.len())
    }
}
