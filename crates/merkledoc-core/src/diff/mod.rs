//! Structural diffs over path→hash maps.
//!
//! A diff walks the union of canonical paths from two documents in
//! lexicographic order and buckets them:
//! - present only in the new map → *added*
//! - present only in the old map → *removed*
//! - present in both with differing hashes → *changed*, but only when
//!   the path is a value leaf; empty-container markers change roots, not
//!   the changed list
//!
//! The flavor modules ([`json`], [`xml`]) supply the value-leaf filter,
//! path normalization, summaries, and the loggable payload records.

pub mod json;
pub mod xml;

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::canonical::PathValueHashes;

/// Operation attributed to a path, key, or tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ChangeKind {
    Added,
    Changed,
    Removed,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Added => "ADDED",
            ChangeKind::Changed => "CHANGED",
            ChangeKind::Removed => "REMOVED",
        }
    }
}

/// A value leaf present in both documents with differing hashes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Changed {
    pub path: String,
    #[serde(rename = "oldHash")]
    pub old_hash_hex: String,
    #[serde(rename = "newHash")]
    pub new_hash_hex: String,
}

/// The structured diff between two documents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub changed: Vec<Changed>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }
}

/// Summary of affected JSON keys: key → set of operations.
#[derive(Debug, Clone, Default)]
pub struct KeySummary {
    pub keys: BTreeMap<String, BTreeSet<ChangeKind>>,
}

impl KeySummary {
    pub fn mark(&mut self, key: impl Into<String>, kind: ChangeKind) {
        self.keys.entry(key.into()).or_default().insert(kind);
    }

    /// Render as key → sorted operation names.
    pub fn to_sorted_lists(&self) -> BTreeMap<String, Vec<String>> {
        to_sorted_lists(&self.keys)
    }
}

/// Summary of affected XML tags, split into elements and attributes.
#[derive(Debug, Clone, Default)]
pub struct TagSummary {
    pub elements: BTreeMap<String, BTreeSet<ChangeKind>>,
    pub attributes: BTreeMap<String, BTreeSet<ChangeKind>>,
}

impl TagSummary {
    pub fn mark_element(&mut self, tag: impl Into<String>, kind: ChangeKind) {
        self.elements.entry(tag.into()).or_default().insert(kind);
    }

    pub fn mark_attribute(&mut self, attr: impl Into<String>, kind: ChangeKind) {
        self.attributes.entry(attr.into()).or_default().insert(kind);
    }

    pub fn elements_sorted(&self) -> BTreeMap<String, Vec<String>> {
        to_sorted_lists(&self.elements)
    }

    pub fn attributes_sorted(&self) -> BTreeMap<String, Vec<String>> {
        to_sorted_lists(&self.attributes)
    }
}

fn to_sorted_lists(
    marks: &BTreeMap<String, BTreeSet<ChangeKind>>,
) -> BTreeMap<String, Vec<String>> {
    marks
        .iter()
        .map(|(k, kinds)| {
            (
                k.clone(),
                kinds.iter().map(|c| c.as_str().to_string()).collect(),
            )
        })
        .collect()
}

/// Diff two path→hash maps. `old == None` is the empty baseline: every
/// path in the new map is reported as added.
pub fn diff_maps(
    old: Option<&PathValueHashes>,
    new: &PathValueHashes,
    is_value_leaf: impl Fn(&str) -> bool,
) -> ChangeSet {
    let mut cs = ChangeSet::default();
    let Some(old) = old else {
        cs.added = new.keys().cloned().collect();
        return cs;
    };

    let mut all: BTreeSet<&String> = old.keys().collect();
    all.extend(new.keys());

    for path in all {
        match (old.get(path), new.get(path)) {
            (None, Some(_)) => cs.added.push(path.clone()),
            (Some(_), None) => cs.removed.push(path.clone()),
            (Some(oh), Some(nh)) if oh != nh => {
                if is_value_leaf(path) {
                    cs.changed.push(Changed {
                        path: path.clone(),
                        old_hash_hex: hex::encode(oh),
                        new_hash_hex: hex::encode(nh),
                    });
                }
            }
            _ => {}
        }
    }
    cs
}

/// Summary buckets serialized as `{changed, added, removed}` lists, the
/// order the original payloads used.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SummaryOps {
    pub changed: Vec<String>,
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

impl SummaryOps {
    pub(crate) fn from_marks(marks: &BTreeMap<String, BTreeSet<ChangeKind>>) -> Self {
        let mut out = SummaryOps::default();
        for (name, kinds) in marks {
            if kinds.contains(&ChangeKind::Changed) {
                out.changed.push(name.clone());
            }
            if kinds.contains(&ChangeKind::Added) {
                out.added.push(name.clone());
            }
            if kinds.contains(&ChangeKind::Removed) {
                out.removed.push(name.clone());
            }
        }
        out
    }

    /// Merge two mark maps into one bucket set (XML merges element and
    /// attribute summaries this way).
    pub(crate) fn from_merged_marks(
        first: &BTreeMap<String, BTreeSet<ChangeKind>>,
        second: &BTreeMap<String, BTreeSet<ChangeKind>>,
    ) -> Self {
        let a = Self::from_marks(first);
        let b = Self::from_marks(second);
        SummaryOps {
            changed: [a.changed, b.changed].concat(),
            added: [a.added, b.added].concat(),
            removed: [a.removed, b.removed].concat(),
        }
    }
}

/// Normalized path buckets for a change summary.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SummaryPaths {
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub changed: Vec<String>,
}
