//! The root block of the hierarchy.

use tracing::warn;

use crate::blockchain::{current_timestamp, Block, BlockHeader, ZERO_HASH};
use crate::coordinate::Coordinate;
use crate::error::HeaderError;

/// Stand-in proof carried by genesis until a real proof-of-position policy exists.
pub const GENESIS_PROOF_PLACEHOLDER: &[u8] = b"genesis_proof_placeholder";

/// Creates the genesis block stamped with the current time.
///
/// The hash depends on the timestamp, so independent runs disagree unless they
/// use [`create_genesis_block_at`] with a shared timestamp.
pub fn create_genesis_block(genesis_coordinate: Coordinate) -> Block {
    build_genesis(genesis_coordinate, current_timestamp())
}

/// Creates the genesis block with a fixed timestamp.
///
/// Any coordinate is accepted; one other than the root is logged as a warning.
/// NaN and infinite timestamps are rejected since they have no hash encoding.
pub fn create_genesis_block_at(
    genesis_coordinate: Coordinate,
    timestamp: f64,
) -> Result<Block, HeaderError> {
    if !timestamp.is_finite() {
        return Err(HeaderError::NonFiniteTimestamp(timestamp));
    }
    Ok(build_genesis(genesis_coordinate, timestamp))
}

fn build_genesis(genesis_coordinate: Coordinate, timestamp: f64) -> Block {
    if !genesis_coordinate.is_root() {
        warn!(
            coordinate = %genesis_coordinate,
            "creating a genesis block at a non-standard coordinate"
        );
    }

    let header = BlockHeader::new(ZERO_HASH, timestamp, genesis_coordinate)
        .with_geometric_proof(Some(GENESIS_PROOF_PLACEHOLDER.to_vec()));

    Block::new(header, Vec::new())
}
