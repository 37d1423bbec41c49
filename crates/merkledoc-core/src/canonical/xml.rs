//! XML canonicalizer.
//!
//! Walks an [`XmlDocument`] and emits one `(canonical path, value hash)`
//! pair per leaf. Only attributes and non-empty trimmed text carry
//! values; elements contribute structure:
//! - attributes sort by qualified name and land at `path.@qname`
//! - siblings (text and elements together) are reordered by
//!   `(node type, qname, structural fingerprint)` and addressed by
//!   canonical index, so document order never affects the root
//! - text lands at `path.#text[#k]`, trimmed; whitespace-only runs are
//!   discarded before sibling canonicalization
//! - an element with no attributes and no surviving children leaves an
//!   `.__emptyElement` marker
//!
//! Qualified names render as `localName` or `namespaceURI|localName`; the
//! URI is opaque text, with no prefix rewriting.

use std::collections::BTreeMap;

use crate::canonical::{BuildResult, PathValueHashes};
use crate::dom::{XmlChild, XmlDocument, XmlElement};
use crate::errors::MerkledocResult;
use crate::hash::{sha256_chunks, value_hash, Hash256};

/// Marker path suffix for an element with no attributes and no children.
pub const EMPTY_ELEMENT_SUFFIX: &str = ".__emptyElement";
/// Marker value hashed for empty elements.
pub const EMPTY_ELEMENT_VALUE: &str = "<empty>";

/// Canonicalize a parsed XML document and build its Merkle tree.
pub fn build(doc: &XmlDocument) -> BuildResult {
    let mut leaves = PathValueHashes::new();
    let root_path = format!("/{}", doc.root.qname());
    walk_element(&doc.root, &root_path, &mut leaves);
    BuildResult::from_leaves(leaves)
}

/// Parse XML text, then [`build`].
pub fn build_str(text: &str) -> MerkledocResult<BuildResult> {
    let doc = XmlDocument::parse(text)?;
    Ok(build(&doc))
}

/// A child unit awaiting canonical ordering.
enum Unit<'a> {
    Text { trimmed: &'a str, fp: Hash256 },
    Element { el: &'a XmlElement, qname: String, fp: Hash256 },
}

impl Unit<'_> {
    fn type_order(&self) -> u8 {
        match self {
            Unit::Text { .. } => 0,
            Unit::Element { .. } => 1,
        }
    }

    fn qname_or_empty(&self) -> &str {
        match self {
            Unit::Text { .. } => "",
            Unit::Element { qname, .. } => qname,
        }
    }

    fn fp(&self) -> &Hash256 {
        match self {
            Unit::Text { fp, .. } | Unit::Element { fp, .. } => fp,
        }
    }
}

fn walk_element(el: &XmlElement, path: &str, out: &mut PathValueHashes) {
    // Attributes first, sorted by qualified name.
    let mut attrs: Vec<(String, &str)> = el
        .attributes
        .iter()
        .map(|a| (a.qname(), a.value.as_str()))
        .collect();
    attrs.sort_by(|a, b| a.0.cmp(&b.0));
    for (qname, value) in &attrs {
        out.insert(format!("{path}.@{qname}"), value_hash(value));
    }

    // Children: non-empty trimmed text and elements.
    let mut units: Vec<Unit<'_>> = Vec::new();
    for child in &el.children {
        match child {
            XmlChild::Text(t) => {
                let trimmed = t.trim();
                if !trimmed.is_empty() {
                    units.push(Unit::Text {
                        trimmed,
                        fp: fingerprint_text(trimmed),
                    });
                }
            }
            XmlChild::Element(c) => units.push(Unit::Element {
                el: c,
                qname: c.qname(),
                fp: fingerprint_element(c),
            }),
        }
    }

    if attrs.is_empty() && units.is_empty() {
        out.insert(
            format!("{path}{EMPTY_ELEMENT_SUFFIX}"),
            value_hash(EMPTY_ELEMENT_VALUE),
        );
        return;
    }

    // Canonical sibling order: text before elements, then by name, then
    // by fingerprint. The sort is stable, so equal units keep their
    // relative document order and indices stay reproducible.
    units.sort_by(|a, b| {
        (a.type_order(), a.qname_or_empty(), a.fp())
            .cmp(&(b.type_order(), b.qname_or_empty(), b.fp()))
    });

    let mut text_counter = 0usize;
    let mut element_counters: BTreeMap<&str, usize> = BTreeMap::new();
    for unit in &units {
        match unit {
            Unit::Text { trimmed, .. } => {
                out.insert(
                    format!("{path}.#text[#{text_counter}]"),
                    value_hash(trimmed),
                );
                text_counter += 1;
            }
            Unit::Element { el, qname, .. } => {
                let counter = element_counters.entry(qname.as_str()).or_insert(0);
                let index = *counter;
                *counter += 1;
                walk_element(el, &format!("{path}/{qname}[#{index}]"), out);
            }
        }
    }
}

/// Structural fingerprint of an element, used only to order siblings.
/// Byte layout: `N|EL|<qname>|`, then `@<qname>=<value>|` per attribute
/// in sorted order, then the sorted child fingerprints.
fn fingerprint_element(el: &XmlElement) -> Hash256 {
    let lead = format!("N|EL|{}|", el.qname());

    let mut attrs: Vec<String> = el
        .attributes
        .iter()
        .map(|a| (a.qname(), a.value.as_str()))
        .map(|(q, v)| format!("@{q}={v}|"))
        .collect();
    attrs.sort();

    let mut child_hashes: Vec<Hash256> = Vec::new();
    for child in &el.children {
        match child {
            XmlChild::Text(t) => {
                let trimmed = t.trim();
                if !trimmed.is_empty() {
                    child_hashes.push(fingerprint_text(trimmed));
                }
            }
            XmlChild::Element(c) => child_hashes.push(fingerprint_element(c)),
        }
    }
    child_hashes.sort();

    let mut chunks: Vec<&[u8]> = vec![lead.as_bytes()];
    for a in &attrs {
        chunks.push(a.as_bytes());
    }
    for h in &child_hashes {
        chunks.push(h);
    }
    sha256_chunks(&chunks)
}

/// Structural fingerprint of a trimmed text run: `N|TEXT|<trimmed>`.
fn fingerprint_text(trimmed: &str) -> Hash256 {
    sha256_chunks(&[b"N|TEXT|", trimmed.as_bytes()])
}
