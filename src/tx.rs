use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::blockchain::current_timestamp;
use crate::canonical::{sha256_hex, to_canonical_string};
use crate::coordinate::Coordinate;
use crate::error::SerializationError;

/// Anything a block can carry: a stable id plus a canonical serializable form.
pub trait ToCanonicalForm {
    fn id(&self) -> &str;

    /// Field name to value mapping that is digested into the block's merkle root.
    fn to_canonical_form(&self) -> Result<Value, SerializationError>;
}

/// Digest of a transaction's canonical form, used as its merkle leaf.
pub fn transaction_digest<T>(tx: &T) -> Result<String, SerializationError>
where
    T: ToCanonicalForm + ?Sized,
{
    let form = tx.to_canonical_form()?;
    Ok(sha256_hex(to_canonical_string(&form)?))
}

/// Opaque payload with a caller-chosen id.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PlaceholderTransaction {
    pub id: String,
    pub data: Value,
}

impl PlaceholderTransaction {
    pub fn new(id: impl Into<String>, data: Value) -> Self {
        Self {
            id: id.into(),
            data,
        }
    }
}

impl ToCanonicalForm for PlaceholderTransaction {
    fn id(&self) -> &str {
        &self.id
    }

    fn to_canonical_form(&self) -> Result<Value, SerializationError> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Value transfer between two coordinates.
///
/// The id is the digest of every other field and is fixed at construction, so
/// instances are only created through [`TransferBuilder`].
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct TransferTransaction {
    /// `None` for coinbase-style issuance.
    sender_coord: Option<Coordinate>,
    /// `None` for contract creation.
    receiver_coord: Option<Coordinate>,
    amount: f64,
    fee: f64,
    /// Sender-specific sequence number.
    nonce: u64,
    timestamp: f64,
    transaction_type: String,
    signature: Option<String>,
    data: Option<Map<String, Value>>,
    id: String,
}

/// The fields that make a transfer unique; `id` itself is excluded.
#[derive(Serialize)]
struct TransferHashRecord<'a> {
    sender_coord: Option<&'a [u8]>,
    sender_coord_depth: Option<u32>,
    receiver_coord: Option<&'a [u8]>,
    receiver_coord_depth: Option<u32>,
    amount: f64,
    fee: f64,
    nonce: u64,
    timestamp: f64,
    transaction_type: &'a str,
    signature: Option<&'a str>,
    data: Option<&'a Map<String, Value>>,
}

impl TransferTransaction {
    pub fn builder(amount: f64, fee: f64, nonce: u64) -> TransferBuilder {
        TransferBuilder {
            sender_coord: None,
            receiver_coord: None,
            amount,
            fee,
            nonce,
            timestamp: None,
            transaction_type: "standard".to_string(),
            signature: None,
            data: None,
        }
    }

    pub fn sender_coord(&self) -> Option<&Coordinate> {
        self.sender_coord.as_ref()
    }

    pub fn receiver_coord(&self) -> Option<&Coordinate> {
        self.receiver_coord.as_ref()
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn fee(&self) -> f64 {
        self.fee
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    pub fn transaction_type(&self) -> &str {
        &self.transaction_type
    }

    pub fn signature(&self) -> Option<&str> {
        self.signature.as_deref()
    }

    pub fn data(&self) -> Option<&Map<String, Value>> {
        self.data.as_ref()
    }

    fn calculate_id(&self) -> Result<String, SerializationError> {
        let record = TransferHashRecord {
            sender_coord: self.sender_coord.as_ref().map(Coordinate::path),
            sender_coord_depth: self.sender_coord.as_ref().map(Coordinate::depth),
            receiver_coord: self.receiver_coord.as_ref().map(Coordinate::path),
            receiver_coord_depth: self.receiver_coord.as_ref().map(Coordinate::depth),
            amount: self.amount,
            fee: self.fee,
            nonce: self.nonce,
            timestamp: self.timestamp,
            transaction_type: &self.transaction_type,
            signature: self.signature.as_deref(),
            data: self.data.as_ref(),
        };
        Ok(sha256_hex(to_canonical_string(&record)?))
    }
}

impl ToCanonicalForm for TransferTransaction {
    fn id(&self) -> &str {
        &self.id
    }

    fn to_canonical_form(&self) -> Result<Value, SerializationError> {
        Ok(serde_json::to_value(self)?)
    }
}

#[derive(Debug, Clone)]
pub struct TransferBuilder {
    sender_coord: Option<Coordinate>,
    receiver_coord: Option<Coordinate>,
    amount: f64,
    fee: f64,
    nonce: u64,
    timestamp: Option<f64>,
    transaction_type: String,
    signature: Option<String>,
    data: Option<Map<String, Value>>,
}

impl TransferBuilder {
    pub fn sender(mut self, coord: Coordinate) -> Self {
        self.sender_coord = Some(coord);
        self
    }

    pub fn receiver(mut self, coord: Coordinate) -> Self {
        self.receiver_coord = Some(coord);
        self
    }

    /// Defaults to the current time when unset.
    pub fn timestamp(mut self, timestamp: f64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn transaction_type(mut self, transaction_type: impl Into<String>) -> Self {
        self.transaction_type = transaction_type.into();
        self
    }

    pub fn signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = Some(signature.into());
        self
    }

    pub fn data(mut self, data: Map<String, Value>) -> Self {
        self.data = Some(data);
        self
    }

    /// Validates the numeric fields and derives the id.
    pub fn build(self) -> Result<TransferTransaction, SerializationError> {
        let timestamp = self.timestamp.unwrap_or_else(current_timestamp);
        for (field, value) in [
            ("amount", self.amount),
            ("fee", self.fee),
            ("timestamp", timestamp),
        ] {
            if !value.is_finite() {
                return Err(SerializationError::NonFinite { field });
            }
        }

        let mut tx = TransferTransaction {
            sender_coord: self.sender_coord,
            receiver_coord: self.receiver_coord,
            amount: self.amount,
            fee: self.fee,
            nonce: self.nonce,
            timestamp,
            transaction_type: self.transaction_type,
            signature: self.signature,
            data: self.data,
            id: String::new(),
        };
        tx.id = tx.calculate_id()?;
        Ok(tx)
    }
}

/// Every transaction kind a block may contain.
#[derive(Debug, Clone, PartialEq)]
pub enum Transaction {
    Placeholder(PlaceholderTransaction),
    Transfer(TransferTransaction),
}

impl ToCanonicalForm for Transaction {
    fn id(&self) -> &str {
        match self {
            Transaction::Placeholder(tx) => tx.id(),
            Transaction::Transfer(tx) => tx.id(),
        }
    }

    fn to_canonical_form(&self) -> Result<Value, SerializationError> {
        match self {
            Transaction::Placeholder(tx) => tx.to_canonical_form(),
            Transaction::Transfer(tx) => tx.to_canonical_form(),
        }
    }
}

impl From<PlaceholderTransaction> for Transaction {
    fn from(tx: PlaceholderTransaction) -> Self {
        Transaction::Placeholder(tx)
    }
}

impl From<TransferTransaction> for Transaction {
    fn from(tx: TransferTransaction) -> Self {
        Transaction::Transfer(tx)
    }
}
