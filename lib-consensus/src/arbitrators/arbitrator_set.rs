//! Arbitrator rotation state machine
//!
//! ## Invariants
//! - Current arbitrators are sorted by the hex of their public keys, so every
//!   node computes the same on-duty order
//! - `duty_changed_count` stays below `arbitrators_count - 1`; reaching it
//!   rotates the next set in and resets the counter
//! - Each confirmed block is applied once; replays are rejected
//! - Listeners run after the state lock is released

use std::collections::BTreeSet;
use std::sync::Arc;

use lib_types::{Block, BlockHeight, ProgramHash};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::config::ArbitratorsConfig;
use super::source::{ArbitratorListener, ArbitratorSource};
use super::types::{Arbitrator, ArbitratorSetSnapshot};
use crate::{ConsensusError, ConsensusResult};

#[derive(Debug, Default)]
struct ArbitratorState {
    height: BlockHeight,
    last_confirmed: Option<BlockHeight>,
    current_arbitrators: Vec<Arbitrator>,
    current_candidates: Vec<Arbitrator>,
    next_arbitrators: Vec<Arbitrator>,
    next_candidates: Vec<Arbitrator>,
    /// Rotated out at the last election, or disabled explicitly since
    disabled: BTreeSet<Vec<u8>>,
    duty_changed_count: u32,
}

/// Elected arbitrators and standby candidates for one term
struct Election {
    arbitrators: Vec<Arbitrator>,
    candidates: Vec<Arbitrator>,
}

pub struct ArbitratorSet {
    config: ArbitratorsConfig,
    crc_arbitrators: Vec<Arbitrator>,
    source: Arc<dyn ArbitratorSource>,
    state: Mutex<ArbitratorState>,
    listeners: Mutex<Vec<Arc<dyn ArbitratorListener>>>,
}

impl ArbitratorSet {
    pub fn new(config: ArbitratorsConfig, source: Arc<dyn ArbitratorSource>) -> ConsensusResult<Self> {
        config.validate()?;
        let crc_arbitrators = config.crc_arbitrators()?;
        Ok(Self {
            config,
            crc_arbitrators,
            source,
            state: Mutex::new(ArbitratorState::default()),
            listeners: Mutex::new(Vec::new()),
        })
    }

    pub fn config(&self) -> &ArbitratorsConfig {
        &self.config
    }

    // ========================================================================
    // LIFECYCLE
    // ========================================================================

    /// Seat the arbitrators elected as of `chain_height` and elect the next
    /// term from the same block.
    pub fn start_up(&self, chain_height: BlockHeight) -> ConsensusResult<()> {
        let block = self.source.get_block_by_height(chain_height)?;
        let first = self.elect(&block)?;
        let next = self.elect(&block)?;

        let mut state = self.state.lock();
        Self::rotate(&mut state, first);
        state.disabled.clear();
        state.next_arbitrators = next.arbitrators;
        state.next_candidates = next.candidates;
        state.duty_changed_count = 0;
        state.height = chain_height;
        state.last_confirmed = Some(chain_height);

        info!(
            "Arbitrator set started at height {} with {} arbitrators",
            chain_height,
            state.current_arbitrators.len()
        );
        Ok(())
    }

    /// Advance the duty counter for a newly confirmed block, rotating when
    /// the term ends.
    pub fn on_block_confirmed(&self, block: &Block) -> ConsensusResult<()> {
        let height = block.height();
        let seated = {
            let mut state = self.state.lock();
            if let Some(last) = state.last_confirmed {
                if height <= last {
                    warn!("Ignoring replayed confirmation of block {} (last {})", height, last);
                    return Err(ConsensusError::BlockAlreadyConfirmed { height, last });
                }
            }

            let duty_changed_count = state.duty_changed_count + 1;
            let seated = if duty_changed_count == self.config.arbitrators_count - 1 {
                let next = self.elect(block)?;
                let incoming = Election {
                    arbitrators: std::mem::take(&mut state.next_arbitrators),
                    candidates: std::mem::take(&mut state.next_candidates),
                };
                Self::rotate(&mut state, incoming);
                state.next_arbitrators = next.arbitrators;
                state.next_candidates = next.candidates;
                state.duty_changed_count = 0;
                info!(
                    "Arbitrators rotated at height {}, {} disabled",
                    height,
                    state.disabled.len()
                );
                Some(state.current_arbitrators.clone())
            } else {
                state.duty_changed_count = duty_changed_count;
                None
            };
            state.height = height;
            state.last_confirmed = Some(height);
            seated
        };

        if let Some(arbitrators) = seated {
            let listeners = self.listeners.lock().clone();
            for listener in listeners {
                listener.on_new_election(&arbitrators);
            }
        }
        Ok(())
    }

    /// Seat `incoming` as the current term; the outgoing arbitrators that
    /// lost their seat become disabled.
    fn rotate(state: &mut ArbitratorState, incoming: Election) {
        let mut arbitrators = incoming.arbitrators;
        arbitrators.sort_by_cached_key(|a| a.hex_key());

        state.disabled = state
            .current_arbitrators
            .iter()
            .filter(|old| !arbitrators.iter().any(|a| a.public_key() == old.public_key()))
            .map(|old| old.public_key().to_vec())
            .collect();
        state.current_arbitrators = arbitrators;
        state.current_candidates = incoming.candidates;
    }

    /// Council seats plus the top-ranked producers as of `block`
    fn elect(&self, block: &Block) -> ConsensusResult<Election> {
        let producers = self.source.get_producers_desc(block)?;
        let seats = self.config.producer_seats();
        if producers.len() < seats {
            return Err(ConsensusError::InsufficientProducers {
                needed: seats,
                available: producers.len(),
            });
        }

        let mut arbitrators = self.crc_arbitrators.clone();
        let mut candidates = Vec::new();
        for (rank, pk) in producers.into_iter().enumerate() {
            if self.crc_arbitrators.iter().any(|c| c.public_key() == pk.as_slice()) {
                continue;
            }
            if arbitrators.len() < self.config.arbitrators_count as usize {
                arbitrators.push(Arbitrator::producer(pk)?);
            } else if candidates.len() < self.config.candidates_count as usize {
                candidates.push(Arbitrator::producer(pk)?);
            } else {
                debug!("Producer ranked {} not elected", rank);
                break;
            }
        }
        if arbitrators.len() < self.config.arbitrators_count as usize {
            return Err(ConsensusError::InsufficientProducers {
                needed: seats,
                available: arbitrators.len() - self.crc_arbitrators.len(),
            });
        }
        Ok(Election { arbitrators, candidates })
    }

    pub fn register_listener(&self, listener: Arc<dyn ArbitratorListener>) {
        self.listeners.lock().push(listener);
    }

    /// Mark an arbitrator disabled until the next rotation
    pub fn disable_arbitrator(&self, public_key: &[u8]) {
        self.state.lock().disabled.insert(public_key.to_vec());
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    pub fn get_arbitrators(&self) -> Vec<Arbitrator> {
        self.state.lock().current_arbitrators.clone()
    }

    pub fn get_candidates(&self) -> Vec<Arbitrator> {
        self.state.lock().current_candidates.clone()
    }

    pub fn get_next_arbitrators(&self) -> Vec<Arbitrator> {
        self.state.lock().next_arbitrators.clone()
    }

    pub fn get_next_candidates(&self) -> Vec<Arbitrator> {
        self.state.lock().next_candidates.clone()
    }

    pub fn get_arbitrators_program_hashes(&self) -> Vec<ProgramHash> {
        self.state
            .lock()
            .current_arbitrators
            .iter()
            .map(Arbitrator::program_hash)
            .collect()
    }

    pub fn get_candidates_program_hashes(&self) -> Vec<ProgramHash> {
        self.state
            .lock()
            .current_candidates
            .iter()
            .map(Arbitrator::program_hash)
            .collect()
    }

    pub fn get_crc_arbitrators(&self) -> Vec<Arbitrator> {
        self.crc_arbitrators.clone()
    }

    pub fn snapshot(&self) -> ArbitratorSetSnapshot {
        let state = self.state.lock();
        ArbitratorSetSnapshot {
            height: state.height,
            current_arbitrators: state.current_arbitrators.clone(),
            current_candidates: state.current_candidates.clone(),
            next_arbitrators: state.next_arbitrators.clone(),
            next_candidates: state.next_candidates.clone(),
            disabled_arbitrators: state.disabled.iter().cloned().collect(),
            duty_changed_count: state.duty_changed_count,
            arbitrators_count: self.config.arbitrators_count,
            candidates_count: self.config.candidates_count,
            majority_count: self.config.majority_count,
        }
    }

    /// `current[(height + offset) mod len]`
    pub fn get_on_duty_arbitrator(&self, offset: u32) -> ConsensusResult<Arbitrator> {
        let state = self.state.lock();
        let len = state.current_arbitrators.len();
        if len == 0 {
            return Err(ConsensusError::EmptyArbitratorSet);
        }
        let index = ((state.height as u64 + offset as u64) % len as u64) as usize;
        Ok(state.current_arbitrators[index].clone())
    }

    pub fn arbitrators_count(&self) -> u32 {
        self.config.arbitrators_count
    }

    pub fn majority_count(&self) -> u32 {
        self.config.majority_count
    }

    pub fn has_majority(&self, count: usize) -> bool {
        count >= self.config.majority_count as usize
    }

    pub fn has_minority(&self, count: usize) -> bool {
        count > (self.config.arbitrators_count - self.config.majority_count) as usize
    }

    /// Council signatures needed for council decisions
    pub fn crc_majority_count(&self) -> usize {
        self.crc_arbitrators.len() * 2 / 3 + 1
    }

    pub fn is_arbitrator(&self, public_key: &[u8]) -> bool {
        self.state
            .lock()
            .current_arbitrators
            .iter()
            .any(|a| a.public_key() == public_key)
    }

    pub fn is_disabled(&self, public_key: &[u8]) -> bool {
        self.state.lock().disabled.contains(public_key)
    }

    /// Accepted as a sponsor or signer of misbehavior evidence
    pub fn is_arbitrator_or_disabled(&self, public_key: &[u8]) -> bool {
        let state = self.state.lock();
        state.disabled.contains(public_key)
            || state.current_arbitrators.iter().any(|a| a.public_key() == public_key)
    }

    pub fn is_crc_arbitrator(&self, public_key: &[u8]) -> bool {
        self.crc_arbitrators.iter().any(|a| a.public_key() == public_key)
    }
}
