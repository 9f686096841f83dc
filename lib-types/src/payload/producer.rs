//! Producer registration payloads

use crate::codec::Encoder;
use crate::primitives::BlockHeight;

/// Payload version that adds `stake_until`
pub const PRODUCER_INFO_DPOS_V2_VERSION: u8 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProducerInfo {
    pub owner_public_key: Vec<u8>,
    pub node_public_key: Vec<u8>,
    pub nickname: String,
    pub url: String,
    pub location: u64,
    pub net_address: String,
    /// Height the DPoS v2 stake is locked until; payload version 1 only
    pub stake_until: BlockHeight,
    /// Owner signature over [`ProducerInfo::unsigned_data`]
    pub signature: Vec<u8>,
}

impl ProducerInfo {
    pub fn unsigned_data(&self, payload_version: u8) -> Vec<u8> {
        let mut enc = Encoder::new();
        self.encode_unsigned(&mut enc, payload_version);
        enc.into_bytes()
    }

    fn encode_unsigned(&self, enc: &mut Encoder, payload_version: u8) {
        enc.write_var_bytes(&self.owner_public_key);
        enc.write_var_bytes(&self.node_public_key);
        enc.write_var_string(&self.nickname);
        enc.write_var_string(&self.url);
        enc.write_u64(self.location);
        enc.write_var_string(&self.net_address);
        if payload_version >= PRODUCER_INFO_DPOS_V2_VERSION {
            enc.write_u32(self.stake_until);
        }
    }

    pub(crate) fn encode(&self, enc: &mut Encoder, payload_version: u8) {
        self.encode_unsigned(enc, payload_version);
        enc.write_var_bytes(&self.signature);
    }
}

/// Cancel or activate an existing producer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessProducer {
    pub owner_public_key: Vec<u8>,
    pub signature: Vec<u8>,
}

impl ProcessProducer {
    pub fn unsigned_data(&self) -> Vec<u8> {
        let mut enc = Encoder::new();
        enc.write_var_bytes(&self.owner_public_key);
        enc.into_bytes()
    }

    pub(crate) fn encode(&self, enc: &mut Encoder) {
        enc.write_var_bytes(&self.owner_public_key);
        enc.write_var_bytes(&self.signature);
    }
}
