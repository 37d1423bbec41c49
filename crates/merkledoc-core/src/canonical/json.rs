//! JSON canonicalizer.
//!
//! Walks a parsed `serde_json::Value` and emits one `(canonical path,
//! value hash)` pair per leaf:
//! - object members are visited in sorted name order (`$.field`)
//! - array elements are reordered by structural fingerprint and addressed
//!   by canonical index (`[#k]`), so element order never affects the root
//! - empty containers leave a synthetic marker so their appearance and
//!   disappearance stay observable
//!
//! Numbers keep the parser's textual form (`serde_json` is compiled with
//! `arbitrary_precision`), so numeric leaves are byte-preserving. That
//! rule is part of the interchange contract: maps built under a different
//! numeric normalization are not comparable.

use serde_json::Value;

use crate::canonical::{BuildResult, PathValueHashes};
use crate::errors::{MerkledocError, MerkledocResult};
use crate::hash::{sha256_chunks, value_hash, Hash256};

/// Marker path suffix and value for an empty object.
pub const EMPTY_OBJECT_SUFFIX: &str = ".__emptyObject";
/// Marker path suffix and value for an empty array.
pub const EMPTY_ARRAY_SUFFIX: &str = ".__emptyArray";

/// Canonicalize a parsed JSON value and build its Merkle tree.
pub fn build(value: &Value) -> BuildResult {
    let mut leaves = PathValueHashes::new();
    walk(value, "$", &mut leaves);
    BuildResult::from_leaves(leaves)
}

/// Parse JSON text, then [`build`].
pub fn build_str(text: &str) -> MerkledocResult<BuildResult> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| MerkledocError::malformed_input(format!("invalid JSON: {e}")))?;
    Ok(build(&value))
}

/// Textual normalization of a scalar leaf.
///
/// Strings yield their raw characters, numbers their parsed textual form,
/// booleans `true`/`false`, null the literal `null`. Containers have no
/// scalar text.
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => Some("null".to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        Value::Object(_) | Value::Array(_) => None,
    }
}

fn walk(value: &Value, path: &str, out: &mut PathValueHashes) {
    match value {
        Value::Object(members) => {
            let mut fields: Vec<&String> = members.keys().collect();
            fields.sort();
            if fields.is_empty() {
                out.insert(format!("{path}{EMPTY_OBJECT_SUFFIX}"), value_hash("{}"));
                return;
            }
            for field in fields {
                let child_path = if path == "$" {
                    format!("$.{field}")
                } else {
                    format!("{path}.{field}")
                };
                walk(&members[field], &child_path, out);
            }
        }
        Value::Array(items) => {
            if items.is_empty() {
                out.insert(format!("{path}{EMPTY_ARRAY_SUFFIX}"), value_hash("[]"));
                return;
            }
            let mut ranked: Vec<(Hash256, &Value)> =
                items.iter().map(|item| (fingerprint(item), item)).collect();
            // Sorting the raw digests is the same order as sorting their
            // hex renderings. Duplicates keep distinct canonical indices.
            ranked.sort_by(|a, b| a.0.cmp(&b.0));
            for (i, (_, item)) in ranked.iter().enumerate() {
                walk(item, &format!("{path}[#{i}]"), out);
            }
        }
        _ => {
            let norm = scalar_text(value).unwrap_or_default();
            out.insert(path.to_string(), value_hash(&norm));
        }
    }
}

/// Structural fingerprint used only to order array elements; never a
/// Merkle leaf. Byte layout is fixed for cross-implementation stability:
/// - null: `N|null`
/// - scalar: `N|V|<norm>`
/// - object: `N|O|` then each `(field, fingerprint(child))` in sorted
///   field order
/// - array: `N|A|` then the sorted child fingerprints
fn fingerprint(value: &Value) -> Hash256 {
    match value {
        Value::Null => sha256_chunks(&[b"N|null"]),
        Value::Object(members) => {
            let mut fields: Vec<&String> = members.keys().collect();
            fields.sort();
            let child_hashes: Vec<(&String, Hash256)> = fields
                .into_iter()
                .map(|f| (f, fingerprint(&members[f])))
                .collect();
            let mut chunks: Vec<&[u8]> = vec![b"N|O|"];
            for (field, h) in &child_hashes {
                chunks.push(field.as_bytes());
                chunks.push(h);
            }
            sha256_chunks(&chunks)
        }
        Value::Array(items) => {
            let mut child_hashes: Vec<Hash256> = items.iter().map(fingerprint).collect();
            child_hashes.sort();
            let mut chunks: Vec<&[u8]> = vec![b"N|A|"];
            for h in &child_hashes {
                chunks.push(h);
            }
            sha256_chunks(&chunks)
        }
        _ => {
            let norm = scalar_text(value).unwrap_or_default();
            sha256_chunks(&[b"N|V|", norm.as_bytes()])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn object_member_order_is_irrelevant() {
        let a = build_str(r#"{"x":1,"y":{"p":true,"q":null}}"#).unwrap();
        let b = build_str(r#"{"y":{"q":null,"p":true},"x":1}"#).unwrap();
        assert_eq!(a.root, b.root);
        assert_eq!(a.path_value_hashes, b.path_value_hashes);
    }

    #[test]
    fn array_element_order_is_irrelevant() {
        let a = build_str(r#"{"tags":["x","y","z"]}"#).unwrap();
        let b = build_str(r#"{"tags":["z","x","y"]}"#).unwrap();
        assert_eq!(a.root, b.root);
    }

    #[test]
    fn scalar_change_moves_the_root() {
        let a = build_str(r#"{"pin":411045}"#).unwrap();
        let b = build_str(r#"{"pin":411046}"#).unwrap();
        assert_ne!(a.root, b.root);
    }

    #[test]
    fn paths_cover_all_leaves() {
        let r = build(&json!({"id": 1, "addr": {"pin": 411045}, "tags": ["x", "y"]}));
        let paths: Vec<&String> = r.path_value_hashes.keys().collect();
        assert!(paths.contains(&&"$.id".to_string()));
        assert!(paths.contains(&&"$.addr.pin".to_string()));
        assert!(paths.contains(&&"$.tags[#0]".to_string()));
        assert!(paths.contains(&&"$.tags[#1]".to_string()));
        assert_eq!(paths.len(), 4);
    }

    #[test]
    fn empty_containers_emit_markers() {
        let r = build(&json!({"o": {}, "a": []}));
        assert_eq!(
            r.path_value_hashes.get("$.a.__emptyArray"),
            Some(&value_hash("[]"))
        );
        assert_eq!(
            r.path_value_hashes.get("$.o.__emptyObject"),
            Some(&value_hash("{}"))
        );
    }

    #[test]
    fn duplicate_array_elements_keep_distinct_indices() {
        let r = build(&json!({"a": [1, 1]}));
        assert!(r.path_value_hashes.contains_key("$.a[#0]"));
        assert!(r.path_value_hashes.contains_key("$.a[#1]"));
        assert_eq!(
            r.path_value_hashes["$.a[#0]"],
            r.path_value_hashes["$.a[#1]"]
        );
    }

    #[test]
    fn number_normalization_preserves_parser_text() {
        let v: Value = serde_json::from_str("2.50").unwrap();
        assert_eq!(scalar_text(&v).unwrap(), "2.50");
    }

    #[test]
    fn root_scalar_document() {
        let r = build(&json!(42));
        assert_eq!(r.path_value_hashes.get("$"), Some(&value_hash("42")));
        assert_eq!(r.tree.size(), 1);
    }

    #[test]
    fn malformed_json_is_reported() {
        let err = build_str("{not json").unwrap_err();
        assert!(err.to_string().contains("malformed"));
    }
}
