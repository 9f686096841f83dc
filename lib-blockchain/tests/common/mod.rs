//! Shared fixtures for validator integration tests
//!
//! Keys come from fixed seeds; the ledger, producer ranking and chain state
//! are in memory.

#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use lib_blockchain::{ChainParams, MemoryChainState, TransactionValidator};
use lib_consensus::{ArbitratorSet, ArbitratorSource, ConsensusResult};
use lib_crypto::ecdsa;
use lib_types::contract::{create_standard_code, standard_parameter, standard_program_hash};
use lib_types::payload::CoinBase;
use lib_types::{
    Attribute, AttributeUsage, Block, BlockHeight, Header, Input, OutPoint, Output, Payload,
    Program, ProgramHash, Transaction,
};
use lib_utxo::{MemoryTransactionStore, UtxoResolver};

/// Height most tests validate at: after public DPoS, before DPoS v2
pub const HEIGHT: BlockHeight = 150;

pub struct Keypair {
    pub private_key: Vec<u8>,
    pub public_key: Vec<u8>,
}

impl Keypair {
    pub fn from_seed(seed: u8) -> Self {
        let private_key = vec![seed; 32];
        let public_key = ecdsa::public_key_from_private(&private_key).unwrap().to_vec();
        Self { private_key, public_key }
    }

    pub fn address(&self) -> ProgramHash {
        standard_program_hash(&self.public_key).unwrap()
    }

    pub fn sign(&self, data: &[u8]) -> Vec<u8> {
        ecdsa::sign(&self.private_key, data).unwrap().to_vec()
    }

    /// Standard program signing the unsigned encoding of `tx`
    pub fn program_for(&self, tx: &Transaction) -> Program {
        let signature = self.sign(&tx.serialize_unsigned());
        Program::new(
            create_standard_code(&self.public_key).unwrap(),
            standard_parameter(&signature),
        )
    }
}

/// Fixed producer ranking
struct StaticProducers {
    ranking: Vec<Vec<u8>>,
}

impl ArbitratorSource for StaticProducers {
    fn get_block_by_height(&self, height: BlockHeight) -> ConsensusResult<Block> {
        Ok(Block::new(Header { height, ..Header::default() }, Vec::new()))
    }

    fn get_producers_desc(&self, _block: &Block) -> ConsensusResult<Vec<Vec<u8>>> {
        Ok(self.ranking.clone())
    }
}

pub struct Harness {
    pub params: Arc<ChainParams>,
    pub store: Arc<MemoryTransactionStore>,
    pub resolver: Arc<UtxoResolver>,
    pub arbitrators: Arc<ArbitratorSet>,
    pub state: Arc<MemoryChainState>,
    pub validator: TransactionValidator,
    /// Two council seats
    pub council: Vec<Keypair>,
    /// Ranked producers; the first three are on duty
    pub producers: Vec<Keypair>,
    nonce: AtomicU32,
}

impl Harness {
    pub fn new() -> Self {
        let council: Vec<Keypair> = (200..202).map(Keypair::from_seed).collect();
        let producers: Vec<Keypair> = (10..18).map(Keypair::from_seed).collect();

        let params = Arc::new(ChainParams::for_testing(
            council.iter().map(|k| hex::encode(&k.public_key)).collect(),
        ));
        let store = Arc::new(MemoryTransactionStore::new());
        let resolver = Arc::new(UtxoResolver::new(store.clone(), params.utxo_cache.clone()));
        let source = Arc::new(StaticProducers {
            ranking: producers.iter().map(|k| k.public_key.clone()).collect(),
        });
        let arbitrators = Arc::new(ArbitratorSet::new(params.arbitrators.clone(), source).unwrap());
        arbitrators.start_up(HEIGHT - 1).unwrap();
        let state = Arc::new(MemoryChainState::new());

        let validator = TransactionValidator::new(
            params.clone(),
            resolver.clone(),
            arbitrators.clone(),
            state.clone(),
        );

        Self {
            params,
            store,
            resolver,
            arbitrators,
            state,
            validator,
            council,
            producers,
            nonce: AtomicU32::new(0),
        }
    }

    pub fn output(&self, to: ProgramHash, value: i64) -> Output {
        Output::new(self.params.native_asset_id, value, to)
    }

    /// Confirm a transaction paying `value` to `owner`; returns its outpoint
    pub fn fund(&self, owner: ProgramHash, value: i64) -> OutPoint {
        self.fund_output(self.output(owner, value), 1)
    }

    pub fn fund_output(&self, output: Output, height: BlockHeight) -> OutPoint {
        let mut tx = Transaction::new(Payload::TransferAsset);
        tx.attributes.push(self.nonce());
        tx.outputs.push(output);
        OutPoint::new(self.store.add_transaction(tx, height), 0)
    }

    /// Confirm a coinbase paying `value` to `owner` at `height`
    pub fn fund_coinbase(&self, owner: ProgramHash, value: i64, height: BlockHeight) -> OutPoint {
        let mut tx = Transaction::new(Payload::CoinBase(CoinBase { content: vec![] }));
        tx.attributes.push(self.nonce());
        tx.inputs.push(Input::coinbase());
        tx.outputs.push(self.output(owner, value));
        OutPoint::new(self.store.add_transaction(tx, height), 0)
    }

    /// Record `tx` as confirmed and spend its inputs
    pub fn confirm(&self, tx: &Transaction, height: BlockHeight) {
        for input in &tx.inputs {
            self.store.spend(&input.previous);
        }
        self.resolver.remove_spent_references(tx);
        self.store.add_transaction(tx.clone(), height);
    }

    /// Unsigned transfer spending `inputs`
    pub fn transfer(&self, inputs: &[OutPoint], outputs: Vec<Output>) -> Transaction {
        let mut tx = Transaction::new(Payload::TransferAsset);
        tx.inputs = inputs.iter().map(|op| Input::new(*op, u32::MAX)).collect();
        tx.outputs = outputs;
        tx
    }

    fn nonce(&self) -> Attribute {
        let n = self.nonce.fetch_add(1, Ordering::SeqCst);
        Attribute::new(AttributeUsage::Nonce, n.to_le_bytes().to_vec())
    }
}

/// Sign `tx` with each key, in the order given
pub fn sign(tx: &mut Transaction, keys: &[&Keypair]) {
    let programs: Vec<Program> = keys.iter().map(|k| k.program_for(tx)).collect();
    tx.programs = programs;
}
