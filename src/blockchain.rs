//! Block headers and blocks.
//!
//! A header's hash is a pure function of its current fields. Blocks never
//! store their hash: parents legitimately change identity when children
//! register into `child_block_references`, so any hash that is persisted or
//! sent elsewhere must be captured at a known snapshot point.

use std::collections::BTreeMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, trace};

use crate::canonical::{sha256_hex, to_canonical_string};
use crate::coordinate::Coordinate;
use crate::error::{HeaderError, SerializationError};
use crate::merkle::merkle_root;
use crate::tx::{transaction_digest, ToCanonicalForm, Transaction};

/// Parent hash reserved for root blocks: 32 zero bytes in hex.
pub const ZERO_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

/// Version of the hashed header record layout.
///
/// The record is a consensus contract: changing its fields, names or encoding
/// splits hash agreement with every other node, so any change bumps this.
pub const HASH_RECORD_VERSION: u32 = 1;

/// Wall-clock seconds since the Unix epoch, microsecond precision.
pub fn current_timestamp() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

/// Represents the header of a block.
///
/// `parent_hash`, `timestamp`, `depth` and `coordinate` are frozen at creation.
/// `child_block_references` and `nonce` may change afterwards, and every
/// change produces a new hash.
///
/// The serde form is the export form returned by [`BlockHeader::to_dict`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BlockHeader {
    /// Hex digest of the parent header, [`ZERO_HASH`] for the root.
    parent_hash: String,
    /// Creation time in seconds; not monotonic across peers.
    timestamp: f64,
    /// Always equal to `coordinate.depth()`.
    depth: u32,
    coordinate: Coordinate,
    /// Merkle root of the transaction digests, `None` for an empty block.
    #[serde(default)]
    merkle_root_transactions: Option<String>,
    /// Local slot key to child block hash.
    #[serde(default)]
    child_block_references: BTreeMap<String, String>,
    /// Opaque proof-of-position payload, hex in the export form.
    #[serde(default, with = "proof_hex")]
    geometric_proof: Option<Vec<u8>>,
    #[serde(default)]
    nonce: u64,
}

/// The exact record that is hashed. Field names are wire contract.
#[derive(Serialize)]
struct HashRecord<'a> {
    parent_hash: &'a str,
    timestamp: f64,
    depth: u32,
    coordinate_depth: u32,
    coordinate_path: &'a [u8],
    merkle_root_transactions: Option<&'a str>,
    child_block_references: BTreeMap<&'a str, &'a str>,
    geometric_proof: Option<String>,
    nonce: u64,
}

impl BlockHeader {
    /// Creates a header with no transactions, children or proof and a zero nonce.
    pub fn new(parent_hash: impl Into<String>, timestamp: f64, coordinate: Coordinate) -> Self {
        Self {
            parent_hash: parent_hash.into(),
            timestamp,
            depth: coordinate.depth(),
            coordinate,
            merkle_root_transactions: None,
            child_block_references: BTreeMap::new(),
            geometric_proof: None,
            nonce: 0,
        }
    }

    pub fn with_merkle_root(mut self, merkle_root: Option<String>) -> Self {
        self.merkle_root_transactions = merkle_root;
        self
    }

    pub fn with_child_references(mut self, references: BTreeMap<String, String>) -> Self {
        self.child_block_references = references;
        self
    }

    /// `Some(vec![])` and `None` are distinct and hash differently.
    pub fn with_geometric_proof(mut self, proof: Option<Vec<u8>>) -> Self {
        self.geometric_proof = proof;
        self
    }

    pub fn with_nonce(mut self, nonce: u64) -> Self {
        self.nonce = nonce;
        self
    }

    pub fn parent_hash(&self) -> &str {
        &self.parent_hash
    }

    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn coordinate(&self) -> &Coordinate {
        &self.coordinate
    }

    pub fn merkle_root_transactions(&self) -> Option<&str> {
        self.merkle_root_transactions.as_deref()
    }

    pub fn child_block_references(&self) -> &BTreeMap<String, String> {
        &self.child_block_references
    }

    pub fn geometric_proof(&self) -> Option<&[u8]> {
        self.geometric_proof.as_deref()
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    /// True for headers that point at the reserved root parent.
    pub fn is_genesis(&self) -> bool {
        self.parent_hash == ZERO_HASH
    }

    pub fn set_nonce(&mut self, nonce: u64) {
        self.nonce = nonce;
    }

    /// Records a child's hash under `slot`, returning the hash it replaced.
    pub fn add_child_reference(
        &mut self,
        slot: impl ToString,
        child_hash: impl Into<String>,
    ) -> Option<String> {
        let slot = slot.to_string();
        let child_hash = child_hash.into();
        debug!(
            coordinate = %self.coordinate,
            %slot,
            %child_hash,
            "registering child block; header hash changes"
        );
        self.child_block_references.insert(slot, child_hash)
    }

    pub fn remove_child_reference(&mut self, slot: &str) -> Option<String> {
        self.child_block_references.remove(slot)
    }

    /// The canonical text fed to SHA-256.
    ///
    /// # Panics
    ///
    /// If the timestamp is NaN or infinite. Such a header is malformed and
    /// has no canonical encoding.
    pub fn canonical_string(&self) -> String {
        assert!(
            self.timestamp.is_finite(),
            "block header timestamp must be finite, got {}",
            self.timestamp
        );

        let record = HashRecord {
            parent_hash: &self.parent_hash,
            timestamp: self.timestamp,
            depth: self.depth,
            coordinate_depth: self.coordinate.depth(),
            coordinate_path: self.coordinate.path(),
            merkle_root_transactions: self.merkle_root_transactions.as_deref(),
            child_block_references: self
                .child_block_references
                .iter()
                .map(|(slot, hash)| (slot.as_str(), hash.as_str()))
                .collect(),
            geometric_proof: self.geometric_proof.as_ref().map(hex::encode),
            nonce: self.nonce,
        };
        to_canonical_string(&record).expect("header hash record is plain JSON")
    }

    /// Lowercase hex SHA-256 of [`canonical_string`](Self::canonical_string).
    pub fn calculate_hash(&self) -> String {
        let hash = sha256_hex(self.canonical_string());
        trace!(coordinate = %self.coordinate, nonce = self.nonce, %hash, "hashed block header");
        hash
    }

    /// Export form: every field, `coordinate` as `{depth, path}` and the proof as hex.
    pub fn to_dict(&self) -> Value {
        serde_json::to_value(self).expect("block header export form is plain JSON")
    }

    /// Rebuilds a header from [`to_dict`](Self::to_dict) output.
    pub fn from_dict(value: &Value) -> Result<Self, HeaderError> {
        let header = Self::deserialize(value)?;
        if header.depth != header.coordinate.depth() {
            return Err(HeaderError::DepthMismatch {
                depth: header.depth,
                coordinate_depth: header.coordinate.depth(),
            });
        }
        Ok(header)
    }
}

mod proof_hex {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(proof: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error> {
        match proof {
            Some(bytes) => serializer.serialize_some(&hex::encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Vec<u8>>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|text| hex::decode(text).map_err(serde::de::Error::custom))
            .transpose()
    }
}

/// Represents a block in the hierarchy.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    header: BlockHeader,
    /// Fixed at construction; order is significant to callers.
    transactions: Vec<Transaction>,
}

impl Block {
    pub fn new(header: BlockHeader, transactions: Vec<Transaction>) -> Self {
        Self {
            header,
            transactions,
        }
    }

    /// Builds a block whose header commits to `transactions` through their merkle root.
    ///
    /// Fails with [`SerializationError::NonFinite`] for a NaN or infinite timestamp.
    pub fn assemble(
        parent_hash: impl Into<String>,
        timestamp: f64,
        coordinate: Coordinate,
        transactions: Vec<Transaction>,
    ) -> Result<Self, SerializationError> {
        if !timestamp.is_finite() {
            return Err(SerializationError::NonFinite { field: "timestamp" });
        }
        let merkle_root = transactions_merkle_root(&transactions)?;
        debug!(
            %coordinate,
            txs = transactions.len(),
            merkle_root = merkle_root.as_deref().unwrap_or("none"),
            "assembling block"
        );
        let header = BlockHeader::new(parent_hash, timestamp, coordinate).with_merkle_root(merkle_root);
        Ok(Self::new(header, transactions))
    }

    /// The header hash, recomputed on every call.
    pub fn block_hash(&self) -> String {
        self.header.calculate_hash()
    }

    pub fn header(&self) -> &BlockHeader {
        &self.header
    }

    /// Mutable header access for the owning pipeline (nonce search, child registration).
    pub fn header_mut(&mut self) -> &mut BlockHeader {
        &mut self.header
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Header export form plus each transaction's canonical form, in order.
    pub fn to_dict(&self) -> Result<Value, SerializationError> {
        let transactions = self
            .transactions
            .iter()
            .map(ToCanonicalForm::to_canonical_form)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(json!({
            "header": self.header.to_dict(),
            "transactions": transactions,
        }))
    }
}

/// Merkle root over the transactions' digests, `None` when there are none.
pub fn transactions_merkle_root<T: ToCanonicalForm>(
    transactions: &[T],
) -> Result<Option<String>, SerializationError> {
    let digests = transactions
        .iter()
        .map(transaction_digest)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(merkle_root(&digests))
}
