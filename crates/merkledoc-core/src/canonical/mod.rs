//! Order-insensitive canonicalization.
//!
//! The [`json`] and [`xml`] walkers each reduce a parsed document tree to
//! a path→hash map: one entry per leaf, keyed by a deterministic canonical
//! path. Everything downstream is shared and lives here:
//! - leaf order is the lexicographic order of paths (`BTreeMap` iteration)
//! - each `(path, value_hash)` pair is length-prefix encoded into a
//!   Merkle leaf payload
//! - the resulting [`MerkleTree`] yields the root and serves proofs
//!
//! Two documents that differ only in semantically-irrelevant ordering
//! (JSON member or array order, XML attribute or sibling order) produce
//! identical maps and therefore identical roots.

pub mod json;
pub mod xml;

use std::collections::BTreeMap;

use crate::errors::{MerkledocError, MerkledocResult};
use crate::hash::{encode_leaf, value_hash, Hash256};
use crate::merkle::{InclusionProof, MerkleTree};

/// Canonical path → value hash, ordered lexicographically by path.
pub type PathValueHashes = BTreeMap<String, Hash256>;

/// The outcome of canonicalizing one document.
#[derive(Debug, Clone)]
pub struct BuildResult {
    /// Merkle root over the encoded leaves.
    pub root: Hash256,
    /// The tree itself, kept for proof generation.
    pub tree: MerkleTree,
    /// Canonical path → value hash for every leaf.
    pub path_value_hashes: PathValueHashes,
    /// Canonical path → position in the sorted leaf order.
    leaf_indexes: BTreeMap<String, usize>,
}

impl BuildResult {
    pub(crate) fn from_leaves(path_value_hashes: PathValueHashes) -> Self {
        let mut encoded = Vec::with_capacity(path_value_hashes.len());
        let mut leaf_indexes = BTreeMap::new();
        for (index, (path, vhash)) in path_value_hashes.iter().enumerate() {
            encoded.push(encode_leaf(path, vhash));
            leaf_indexes.insert(path.clone(), index);
        }
        let tree = MerkleTree::new(encoded);
        let root = tree.root();
        Self {
            root,
            tree,
            path_value_hashes,
            leaf_indexes,
        }
    }

    /// Lowercase hex of the root.
    pub fn root_hex(&self) -> String {
        hex::encode(self.root)
    }

    /// Leaf index of a canonical path in the sorted leaf order.
    pub fn leaf_index(&self, path: &str) -> MerkledocResult<usize> {
        self.leaf_indexes
            .get(path)
            .copied()
            .ok_or_else(|| MerkledocError::not_found(format!("path not found: {path}")))
    }

    /// Inclusion proof for a canonical path.
    pub fn prove(&self, path: &str) -> MerkledocResult<InclusionProof> {
        let index = self.leaf_index(path)?;
        self.tree.inclusion_proof(index)
    }
}

/// Verify that `normalized_value` sits at `path` in the document whose
/// root is `expected_root`, using an inclusion proof from that document.
pub fn verify_leaf(
    path: &str,
    normalized_value: &str,
    proof: &InclusionProof,
    expected_root: &Hash256,
) -> bool {
    let leaf = encode_leaf(path, &value_hash(normalized_value));
    crate::merkle::verify_inclusion(&leaf, proof, expected_root)
}
