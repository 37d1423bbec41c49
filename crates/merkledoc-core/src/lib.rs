//! merkledoc-core
//!
//! Core primitives for merkledoc:
//! - SHA-256 hashing with RFC 6962 leaf/node domain separation
//! - Merkle trees with inclusion and consistency proofs
//! - Order-insensitive canonicalization for JSON and XML documents
//! - Structural diffs, collapsed paths, and key/tag summaries
//! - Dot-path (JSON) and XPath (XML) extraction facade
//!
//! The crate performs no filesystem or network I/O and never logs.
//! All failures surface to the caller as [`MerkledocError`].

pub mod canonical;
pub mod diff;
pub mod dom;
pub mod errors;
pub mod extract;
pub mod hash;
pub mod merkle;
pub mod path;

pub use crate::errors::{MerkledocError, MerkledocResult};

/// Domain separation constants.
/// These must remain stable: changing any of them changes every root.
pub mod domain {
    /// Prefix byte for Merkle leaf hashes (RFC 6962 §2.1).
    pub const MERKLE_LEAF: u8 = 0x00;
    /// Prefix byte for Merkle interior node hashes (RFC 6962 §2.1).
    pub const MERKLE_NODE: u8 = 0x01;
    /// Tag prefixed to every normalized leaf value before hashing.
    pub const VALUE: &str = "V|";
}

/// Convenience re-exports.
pub mod prelude {
    pub use crate::canonical::{json, verify_leaf, xml, BuildResult, PathValueHashes};
    pub use crate::diff::{ChangeKind, ChangeSet, Changed, KeySummary, TagSummary};
    pub use crate::dom::{XmlAttribute, XmlChild, XmlDocument, XmlElement};
    pub use crate::extract::{Extracted, JsonExtractConfig, XmlExtractConfig};
    pub use crate::hash::{encode_leaf, value_hash, Hash256};
    pub use crate::merkle::{ConsistencyProof, InclusionProof, MerkleTree, ProofNode};
    pub use crate::{MerkledocError, MerkledocResult};
}
