//! Block header and body

use crate::codec::Encoder;
use crate::hashing::sha256d;
use crate::primitives::{BlockHash, BlockHeight, Hash256};
use crate::transaction::Transaction;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Header {
    pub version: u32,
    pub previous: BlockHash,
    pub merkle_root: Hash256,
    pub timestamp: u32,
    pub bits: u32,
    pub nonce: u32,
    pub height: BlockHeight,
}

impl Header {
    pub(crate) fn encode(&self, enc: &mut Encoder) {
        enc.write_u32(self.version);
        enc.write_bytes(self.previous.as_bytes());
        enc.write_bytes(self.merkle_root.as_bytes());
        enc.write_u32(self.timestamp);
        enc.write_u32(self.bits);
        enc.write_u32(self.nonce);
        enc.write_u32(self.height);
    }

    pub fn hash(&self) -> BlockHash {
        let mut enc = Encoder::new();
        self.encode(&mut enc);
        BlockHash::new(sha256d(&enc.into_bytes()))
    }
}

#[derive(Debug, Clone)]
pub struct Block {
    pub header: Header,
    pub transactions: Vec<Transaction>,
}

impl Block {
    pub fn new(header: Header, transactions: Vec<Transaction>) -> Self {
        Self { header, transactions }
    }

    pub fn height(&self) -> BlockHeight {
        self.header.height
    }

    pub fn hash(&self) -> BlockHash {
        self.header.hash()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_hash_commits_to_height() {
        let a = Header { height: 1, ..Header::default() };
        let b = Header { height: 2, ..Header::default() };
        assert_ne!(a.hash(), b.hash());
        assert_eq!(a.hash(), a.clone().hash());
    }
}
