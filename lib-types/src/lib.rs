//! Chain primitives for the validation core.
//! Stable, storage-neutral, behavior-light.
//!
//! Rule: everything that is hashed or signed goes through [`codec::Encoder`].

pub mod primitives;
pub mod errors;
pub mod hashing;
pub mod contract;
pub mod codec;
pub mod transaction;
pub mod output;
pub mod payload;
pub mod block;

pub use primitives::{
    checked_sum, AssetId, BlockHash, BlockHeight, CodeHash, Fixed64, Hash256, ProgramHash, TxHash,
    COIN, MAX_AMOUNT,
};
pub use errors::{TypesError, TypesResult};
pub use contract::PrefixType;
pub use codec::Encoder;
pub use transaction::{
    Attribute, AttributeUsage, Input, OutPoint, Output, OutputPayload, OutputType, Program,
    Transaction, TxType,
};
pub use payload::Payload;
pub use block::{Block, Header};
