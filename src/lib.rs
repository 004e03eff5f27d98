//! Block structure and hashing for a hierarchical ("fractal-coordinate") ledger.
//!
//! Blocks live at [`Coordinate`]s in a tree where every position has three
//! solid children and a central void. A [`BlockHeader`] hashes to the SHA-256
//! of a canonical JSON record; that record is the contract every node must
//! reproduce bit for bit.

pub mod blockchain;
pub mod canonical;
pub mod coordinate;
pub mod error;
pub mod genesis;
pub mod merkle;
pub mod settings;
pub mod tx;

pub use blockchain::{
    current_timestamp, transactions_merkle_root, Block, BlockHeader, HASH_RECORD_VERSION, ZERO_HASH,
};
pub use coordinate::Coordinate;
pub use error::{CoordinateError, HeaderError, SerializationError};
pub use genesis::{create_genesis_block, create_genesis_block_at, GENESIS_PROOF_PLACEHOLDER};
pub use tx::{
    transaction_digest, PlaceholderTransaction, ToCanonicalForm, Transaction, TransferTransaction,
};
