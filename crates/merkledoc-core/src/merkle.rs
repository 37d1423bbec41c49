//! RFC 6962-compatible Merkle hash tree.
//!
//! The tree is built over an immutable sequence of opaque leaf payloads
//! `d(0) .. d(n-1)` and provides:
//! - the Merkle Tree Hash (`MTH`) per RFC 6962 §2.1
//! - inclusion proofs (audit paths, §2.1.1) and their verification
//! - consistency proofs (append-only extension, §2.1.2) and their
//!   verification
//!
//! Subtree hashes are memoized by `(start, size)` behind a mutex, so a
//! tree can be shared across threads; the cache is a pure function of the
//! leaf list, so a poisoned lock is recovered rather than propagated.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use crate::errors::{MerkledocError, MerkledocResult};
use crate::hash::{self, Hash256};

/// One step of an inclusion proof: the sibling subtree hash and the side
/// it sits on. `sibling_on_right == true` means the sibling is to the
/// right of the node being extended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofNode {
    #[serde(with = "hash::serde_hex")]
    pub hash: Hash256,
    pub sibling_on_right: bool,
}

/// Inclusion proof (audit path) for a single leaf.
///
/// `path` is ordered bottom-up: the first entry is the sibling closest to
/// the leaf, the last is the sibling directly under the root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InclusionProof {
    pub leaf_index: u32,
    pub leaf_count: u32,
    pub path: Vec<ProofNode>,
}

/// Consistency proof showing the first `old_size` leaves of a tree of
/// `new_size` leaves form a prefix with the claimed old root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsistencyProof {
    pub old_size: u32,
    pub new_size: u32,
    #[serde(with = "hash::serde_hex_seq")]
    pub nodes: Vec<Hash256>,
}

/// An immutable Merkle tree over raw leaf payloads.
#[derive(Debug)]
pub struct MerkleTree {
    leaves: Vec<Vec<u8>>,
    subtree_cache: Mutex<HashMap<(usize, usize), Hash256>>,
}

impl Clone for MerkleTree {
    fn clone(&self) -> Self {
        // The cache is recomputable; a clone starts cold.
        MerkleTree::new(self.leaves.clone())
    }
}

impl MerkleTree {
    pub fn new(leaves: Vec<Vec<u8>>) -> Self {
        Self {
            leaves,
            subtree_cache: Mutex::new(HashMap::new()),
        }
    }

    /// Number of leaves.
    pub fn size(&self) -> usize {
        self.leaves.len()
    }

    /// Raw payload of the leaf at `index`.
    pub fn leaf(&self, index: usize) -> Option<&[u8]> {
        self.leaves.get(index).map(Vec::as_slice)
    }

    /// Root hash: `MTH(D[0:n])`. The empty tree hashes to `SHA256("")`.
    pub fn root(&self) -> Hash256 {
        self.mth(0, self.size())
    }

    /// Lowercase hex of the root hash.
    pub fn root_hex(&self) -> String {
        hex::encode(self.root())
    }

    /// Inclusion proof for the leaf at index `m`, per RFC 6962 §2.1.1.
    pub fn inclusion_proof(&self, m: usize) -> MerkledocResult<InclusionProof> {
        let n = self.size();
        if m >= n {
            return Err(MerkledocError::invalid_argument(format!(
                "leaf index {m} out of range for tree of {n} leaves"
            )));
        }
        let mut path = Vec::new();
        self.inclusion_path(0, n, m, &mut path);
        Ok(InclusionProof {
            leaf_index: m as u32,
            leaf_count: n as u32,
            path,
        })
    }

    /// Consistency proof from a prefix of `old_size` leaves to the full
    /// tree, per RFC 6962 §2.1.2. Requires `1 <= old_size <= n`.
    pub fn consistency_proof(&self, old_size: usize) -> MerkledocResult<ConsistencyProof> {
        let n = self.size();
        if old_size == 0 || old_size > n {
            return Err(MerkledocError::invalid_argument(format!(
                "old_size must be in 1..={n}, got {old_size}"
            )));
        }
        let mut nodes = Vec::new();
        self.consistency_nodes(0, n, old_size, true, &mut nodes);
        Ok(ConsistencyProof {
            old_size: old_size as u32,
            new_size: n as u32,
            nodes,
        })
    }

    /// `MTH(D[start : start+size])`, memoized.
    fn mth(&self, start: usize, size: usize) -> Hash256 {
        if size == 0 {
            return hash::empty_tree_hash();
        }
        {
            let cache = self.cache();
            if let Some(h) = cache.get(&(start, size)) {
                return *h;
            }
        }

        let result = if size == 1 {
            hash::hash_leaf(&self.leaves[start])
        } else {
            let k = largest_power_of_two_lt(size);
            let left = self.mth(start, k);
            let right = self.mth(start + k, size - k);
            hash::hash_node(&left, &right)
        };

        self.cache().insert((start, size), result);
        result
    }

    /// Audit path, emitted bottom-up: recurse into the half containing
    /// `m`, then record the complementary subtree's hash.
    fn inclusion_path(&self, start: usize, size: usize, m: usize, out: &mut Vec<ProofNode>) {
        if size == 1 {
            return;
        }
        let k = largest_power_of_two_lt(size);
        if m < k {
            self.inclusion_path(start, k, m, out);
            out.push(ProofNode {
                hash: self.mth(start + k, size - k),
                sibling_on_right: true,
            });
        } else {
            self.inclusion_path(start + k, size - k, m - k, out);
            out.push(ProofNode {
                hash: self.mth(start, k),
                sibling_on_right: false,
            });
        }
    }

    fn consistency_nodes(
        &self,
        start: usize,
        size: usize,
        m: usize,
        is_top: bool,
        out: &mut Vec<Hash256>,
    ) {
        if m == size {
            if !is_top {
                out.push(self.mth(start, size));
            }
            return;
        }
        let k = largest_power_of_two_lt(size);
        if m <= k {
            self.consistency_nodes(start, k, m, false, out);
            out.push(self.mth(start + k, size - k));
        } else {
            self.consistency_nodes(start + k, size - k, m - k, false, out);
            out.push(self.mth(start, k));
        }
    }

    fn cache(&self) -> MutexGuard<'_, HashMap<(usize, usize), Hash256>> {
        match self.subtree_cache.lock() {
            Ok(g) => g,
            // Cache entries are a pure function of the leaves; a poisoned
            // lock still holds valid entries.
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Verify an inclusion proof against an expected root.
///
/// Folds the audit path from the leaf upward; a mismatch yields `false`,
/// never an error.
pub fn verify_inclusion(
    leaf_payload: &[u8],
    proof: &InclusionProof,
    expected_root: &Hash256,
) -> bool {
    let mut h = hash::hash_leaf(leaf_payload);
    for step in &proof.path {
        h = if step.sibling_on_right {
            hash::hash_node(&h, &step.hash)
        } else {
            hash::hash_node(&step.hash, &h)
        };
    }
    h == *expected_root
}

/// Verify a consistency proof between a tree of `old_size` leaves with
/// root `old_root` and a tree of `new_size` leaves with root `new_root`.
///
/// Equal sizes are trivial: the roots must match and no nodes are needed.
/// Otherwise this follows the RFC 6962 reconstruction (in the restated
/// form of RFC 9162 §2.1.4.2, adjusted for proofs that always carry the
/// old subtree hash as their first node): two running hashes are folded
/// over the proof nodes while bit-walking `old_size - 1` and
/// `new_size - 1`; the first must land on `old_root`, the second on
/// `new_root`.
pub fn verify_consistency(
    old_root: &Hash256,
    old_size: u32,
    new_root: &Hash256,
    new_size: u32,
    nodes: &[Hash256],
) -> bool {
    let m = old_size as u64;
    let n = new_size as u64;
    if m == n {
        return old_root == new_root;
    }
    if m < 1 || m > n {
        return false;
    }
    let Some((first, rest)) = nodes.split_first() else {
        return false;
    };

    let mut fn_ = m - 1;
    let mut sn = n - 1;
    // Skip the complete right-border subtrees shared by both trees.
    while fn_ & 1 == 1 {
        fn_ >>= 1;
        sn >>= 1;
    }

    let mut fr = *first;
    let mut sr = *first;

    for c in rest {
        if sn == 0 {
            return false;
        }
        if fn_ & 1 == 1 || fn_ == sn {
            fr = hash::hash_node(c, &fr);
            sr = hash::hash_node(c, &sr);
            if fn_ & 1 == 0 {
                while fn_ != 0 && fn_ & 1 == 0 {
                    fn_ >>= 1;
                    sn >>= 1;
                }
            }
        } else {
            sr = hash::hash_node(&sr, c);
        }
        fn_ >>= 1;
        sn >>= 1;
    }

    fr == *old_root && sr == *new_root && sn == 0
}

/// Largest power of two strictly less than `n`, for `n >= 2`: the highest
/// set bit of `n - 1`. This matches RFC 6962's split point, so left
/// subtree sizes are always powers of two.
fn largest_power_of_two_lt(n: usize) -> usize {
    debug_assert!(n >= 2);
    let shift = usize::BITS - 1 - (n - 1).leading_zeros();
    1 << shift
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaves(n: usize) -> Vec<Vec<u8>> {
        (0..n).map(|i| format!("leaf-{i}").into_bytes()).collect()
    }

    #[test]
    fn split_point_is_power_of_two() {
        assert_eq!(largest_power_of_two_lt(2), 1);
        assert_eq!(largest_power_of_two_lt(3), 2);
        assert_eq!(largest_power_of_two_lt(4), 2);
        assert_eq!(largest_power_of_two_lt(5), 4);
        assert_eq!(largest_power_of_two_lt(8), 4);
        assert_eq!(largest_power_of_two_lt(9), 8);
    }

    #[test]
    fn empty_tree_root() {
        let t = MerkleTree::new(Vec::new());
        assert_eq!(t.root(), hash::empty_tree_hash());
    }

    #[test]
    fn single_leaf_root_is_leaf_hash() {
        let t = MerkleTree::new(leaves(1));
        assert_eq!(t.root(), hash::hash_leaf(b"leaf-0"));
        let proof = t.inclusion_proof(0).unwrap();
        assert!(proof.path.is_empty());
        assert!(verify_inclusion(b"leaf-0", &proof, &t.root()));
    }

    #[test]
    fn root_matches_manual_construction_for_three_leaves() {
        let t = MerkleTree::new(leaves(3));
        let l0 = hash::hash_leaf(b"leaf-0");
        let l1 = hash::hash_leaf(b"leaf-1");
        let l2 = hash::hash_leaf(b"leaf-2");
        let expected = hash::hash_node(&hash::hash_node(&l0, &l1), &l2);
        assert_eq!(t.root(), expected);
    }

    #[test]
    fn inclusion_proofs_verify_for_all_leaves() {
        for n in 1..=16 {
            let t = MerkleTree::new(leaves(n));
            let root = t.root();
            for m in 0..n {
                let proof = t.inclusion_proof(m).unwrap();
                assert_eq!(proof.leaf_index, m as u32);
                assert_eq!(proof.leaf_count, n as u32);
                assert!(
                    verify_inclusion(t.leaf(m).unwrap(), &proof, &root),
                    "inclusion failed for leaf {m} of {n}"
                );
            }
        }
    }

    #[test]
    fn inclusion_proof_rejects_wrong_leaf() {
        let t = MerkleTree::new(leaves(5));
        let proof = t.inclusion_proof(2).unwrap();
        assert!(!verify_inclusion(b"not-a-leaf", &proof, &t.root()));
    }

    #[test]
    fn inclusion_proof_rejects_out_of_range_index() {
        let t = MerkleTree::new(leaves(4));
        assert!(t.inclusion_proof(4).is_err());
    }

    #[test]
    fn consistency_proofs_verify_for_all_prefixes() {
        for n in 1..=16 {
            let full = MerkleTree::new(leaves(n));
            let new_root = full.root();
            for m in 1..=n {
                let old = MerkleTree::new(leaves(m));
                let proof = full.consistency_proof(m).unwrap();
                assert!(
                    verify_consistency(&old.root(), m as u32, &new_root, n as u32, &proof.nodes),
                    "consistency failed for {m} -> {n}"
                );
            }
        }
    }

    #[test]
    fn consistency_proof_same_size_needs_no_nodes() {
        let t = MerkleTree::new(leaves(6));
        let proof = t.consistency_proof(6).unwrap();
        assert!(proof.nodes.is_empty());
        assert!(verify_consistency(&t.root(), 6, &t.root(), 6, &proof.nodes));
    }

    #[test]
    fn consistency_proof_rejects_bad_old_size() {
        let t = MerkleTree::new(leaves(4));
        assert!(t.consistency_proof(0).is_err());
        assert!(t.consistency_proof(5).is_err());
    }

    #[test]
    fn consistency_verification_rejects_tampered_nodes() {
        let full = MerkleTree::new(leaves(11));
        let old = MerkleTree::new(leaves(7));
        let proof = full.consistency_proof(7).unwrap();
        for i in 0..proof.nodes.len() {
            let mut bad = proof.nodes.clone();
            bad[i][0] ^= 0x01;
            assert!(
                !verify_consistency(&old.root(), 7, &full.root(), 11, &bad),
                "tampered node {i} was accepted"
            );
        }
    }

    #[test]
    fn proof_serde_roundtrip_uses_hex() {
        let t = MerkleTree::new(leaves(3));
        let proof = t.inclusion_proof(1).unwrap();
        let json = serde_json::to_string(&proof).unwrap();
        assert!(json.contains("leafIndex"));
        assert!(json.contains("siblingOnRight"));
        let back: InclusionProof = serde_json::from_str(&json).unwrap();
        assert_eq!(back, proof);
    }
}
