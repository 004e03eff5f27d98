//! Binary Merkle trees over hex digest strings.
//!
//! Behavior:
//! - An empty leaf list has no tree (`None`); callers treat that as "no root".
//! - A single leaf is its own root.
//! - Odd levels are padded by duplicating the last node before pairing.
//! - Parents hash the concatenated hex strings of their children, left first.

use crate::canonical::sha256_hex;

/// SHA-256 hex digest of raw bytes or text.
pub fn hash_data(data: impl AsRef<[u8]>) -> String {
    sha256_hex(data)
}

/// Digest of two child digests; order matters.
pub fn hash_pair(left: &str, right: &str) -> String {
    let mut joined = String::with_capacity(left.len() + right.len());
    joined.push_str(left);
    joined.push_str(right);
    hash_data(joined)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleNode {
    value: String,
    left: Option<Box<MerkleNode>>,
    right: Option<Box<MerkleNode>>,
}

impl MerkleNode {
    fn leaf(value: String) -> Self {
        Self {
            value,
            left: None,
            right: None,
        }
    }

    fn branch(left: MerkleNode, right: MerkleNode) -> Self {
        Self {
            value: hash_pair(&left.value, &right.value),
            left: Some(Box::new(left)),
            right: Some(Box::new(right)),
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn left(&self) -> Option<&MerkleNode> {
        self.left.as_deref()
    }

    pub fn right(&self) -> Option<&MerkleNode> {
        self.right.as_deref()
    }

    pub fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }
}

/// Builds the tree for an ordered list of leaf digests.
///
/// Returns `None` when `hashes` is empty.
pub fn build_merkle_tree_from_hashes(hashes: &[String]) -> Option<MerkleNode> {
    let mut level: Vec<MerkleNode> = hashes.iter().cloned().map(MerkleNode::leaf).collect();

    while level.len() > 1 {
        if level.len() % 2 == 1 {
            let last = level[level.len() - 1].clone();
            level.push(last);
        }

        let mut nodes = level.into_iter();
        let mut next = Vec::with_capacity(nodes.len() / 2);
        while let (Some(left), Some(right)) = (nodes.next(), nodes.next()) {
            next.push(MerkleNode::branch(left, right));
        }
        level = next;
    }

    level.pop()
}

/// Root digest for an ordered list of leaf digests, `None` when empty.
pub fn merkle_root(hashes: &[String]) -> Option<String> {
    build_merkle_tree_from_hashes(hashes).map(|root| root.value)
}

/// Which side of the running hash a sibling sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofStep {
    pub sibling: String,
    pub side: Side,
}

/// Collects the sibling digests from `leaf` up to `root`.
///
/// Returns `Some(vec![])` when the root is the leaf itself and `None` when the
/// leaf is not in the tree.
pub fn generate_proof(root: &MerkleNode, leaf: &str) -> Option<Vec<ProofStep>> {
    let mut steps = Vec::new();
    collect_siblings(root, leaf, &mut steps).then_some(steps)
}

fn collect_siblings(node: &MerkleNode, leaf: &str, steps: &mut Vec<ProofStep>) -> bool {
    match (node.left(), node.right()) {
        (Some(left), Some(right)) => {
            if collect_siblings(left, leaf, steps) {
                steps.push(ProofStep {
                    sibling: right.value.clone(),
                    side: Side::Right,
                });
                true
            } else if collect_siblings(right, leaf, steps) {
                steps.push(ProofStep {
                    sibling: left.value.clone(),
                    side: Side::Left,
                });
                true
            } else {
                false
            }
        }
        (None, None) => node.value == leaf,
        // build_merkle_tree_from_hashes never produces half-filled branches
        _ => false,
    }
}

/// Replays `proof` from `leaf` and compares against `expected_root`.
pub fn verify_proof(leaf: &str, proof: &[ProofStep], expected_root: &str) -> bool {
    let computed = proof
        .iter()
        .fold(leaf.to_string(), |current, step| match step.side {
            Side::Left => hash_pair(&step.sibling, &current),
            Side::Right => hash_pair(&current, &step.sibling),
        });
    computed == expected_root
}
