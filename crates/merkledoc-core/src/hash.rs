//! Hashing primitives and leaf encoding.
//!
//! All hashes are SHA-256. Domain separation follows RFC 6962:
//! - leaf hash: `SHA256(0x00 || payload)`
//! - node hash: `SHA256(0x01 || left || right)`
//! - empty tree: `SHA256("")`
//!
//! Leaf values are hashed through [`value_hash`], which prefixes the
//! normalized value text with `V|` so value hashes can never collide with
//! structural fingerprints (`N|...`), which live in the canonicalizers.

use sha2::{Digest, Sha256};

use crate::domain;

/// A 32-byte SHA-256 digest.
pub type Hash256 = [u8; 32];

/// SHA-256 over a single byte slice.
pub fn sha256(bytes: &[u8]) -> Hash256 {
    let mut h = Sha256::new();
    h.update(bytes);
    h.finalize().into()
}

/// SHA-256 over a sequence of chunks, hashed as one stream.
pub fn sha256_chunks(chunks: &[&[u8]]) -> Hash256 {
    let mut h = Sha256::new();
    for c in chunks {
        h.update(c);
    }
    h.finalize().into()
}

/// RFC 6962 leaf hash: `SHA256(0x00 || payload)`.
pub fn hash_leaf(payload: &[u8]) -> Hash256 {
    sha256_chunks(&[&[domain::MERKLE_LEAF], payload])
}

/// RFC 6962 interior node hash: `SHA256(0x01 || left || right)`.
pub fn hash_node(left: &Hash256, right: &Hash256) -> Hash256 {
    sha256_chunks(&[&[domain::MERKLE_NODE], left, right])
}

/// Hash of the empty tree: `SHA256("")`.
pub fn empty_tree_hash() -> Hash256 {
    sha256(&[])
}

/// Value hash of a normalized leaf value: `SHA256("V|" || utf8(value))`.
///
/// Every leaf value flows through here: JSON scalars, XML attribute values,
/// trimmed text content, and the empty-container marker strings.
pub fn value_hash(normalized: &str) -> Hash256 {
    sha256_chunks(&[domain::VALUE.as_bytes(), normalized.as_bytes()])
}

/// Encode a `(path, value_hash)` pair into a single Merkle leaf payload.
///
/// Layout: 4-byte big-endian length of the UTF-8 path bytes, the path
/// bytes, then the 32-byte value hash. The length prefix keeps the path
/// and hash from being re-split ambiguously.
pub fn encode_leaf(path: &str, value_hash: &Hash256) -> Vec<u8> {
    let p = path.as_bytes();
    let mut out = Vec::with_capacity(4 + p.len() + value_hash.len());
    out.extend_from_slice(&(p.len() as u32).to_be_bytes());
    out.extend_from_slice(p);
    out.extend_from_slice(value_hash);
    out
}

/// Serde adapter: a `Hash256` as a lowercase hex string.
pub mod serde_hex {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::Hash256;

    pub fn serialize<S: Serializer>(h: &Hash256, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&hex::encode(h))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Hash256, D::Error> {
        let s = String::deserialize(d)?;
        let bytes = hex::decode(&s).map_err(serde::de::Error::custom)?;
        bytes
            .try_into()
            .map_err(|_| serde::de::Error::custom("expected a 32-byte hex digest"))
    }
}

/// Serde adapter: a `Vec<Hash256>` as lowercase hex strings.
pub mod serde_hex_seq {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::Hash256;

    pub fn serialize<S: Serializer>(v: &[Hash256], s: S) -> Result<S::Ok, S::Error> {
        s.collect_seq(v.iter().map(hex::encode))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Hash256>, D::Error> {
        let strs = Vec::<String>::deserialize(d)?;
        strs.into_iter()
            .map(|s| {
                let bytes = hex::decode(&s).map_err(serde::de::Error::custom)?;
                bytes
                    .try_into()
                    .map_err(|_| serde::de::Error::custom("expected a 32-byte hex digest"))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaf_and_node_hashes_are_domain_separated() {
        let payload = b"same bytes";
        assert_ne!(hash_leaf(payload), sha256(payload));
        let l = hash_leaf(b"l");
        let r = hash_leaf(b"r");
        assert_ne!(hash_node(&l, &r), hash_node(&r, &l));
    }

    #[test]
    fn empty_tree_hash_is_sha256_of_nothing() {
        assert_eq!(
            hex::encode(empty_tree_hash()),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn value_hash_prefixes_value_tag() {
        assert_eq!(value_hash("null"), sha256(b"V|null"));
        assert_ne!(value_hash("x"), sha256(b"x"));
    }

    #[test]
    fn encode_leaf_length_prefixes_path() {
        let vh = value_hash("1");
        let leaf = encode_leaf("$.a", &vh);
        assert_eq!(&leaf[..4], &[0, 0, 0, 3]);
        assert_eq!(&leaf[4..7], b"$.a");
        assert_eq!(&leaf[7..], &vh[..]);
    }
}
