//! JSON diff flavor: value-leaf filter, collapsed paths, key summary,
//! and the loggable payload/summary records.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::canonical::{json as canonical_json, BuildResult};
use crate::diff::{diff_maps, ChangeKind, ChangeSet, Changed, KeySummary, SummaryOps, SummaryPaths};
use crate::errors::MerkledocResult;
use crate::extract::Extracted;
use crate::path;

/// Every path is a value leaf except the empty-container markers.
pub fn is_value_leaf(path: &str) -> bool {
    !(path.ends_with(canonical_json::EMPTY_OBJECT_SUFFIX)
        || path.ends_with(canonical_json::EMPTY_ARRAY_SUFFIX))
}

/// Diff two canonicalized JSON documents. `old == None` is the empty
/// baseline.
pub fn diff(old: Option<&BuildResult>, new: &BuildResult) -> ChangeSet {
    diff_maps(
        old.map(|r| &r.path_value_hashes),
        &new.path_value_hashes,
        is_value_leaf,
    )
}

/// Build both documents from text and diff them. A blank `old` is the
/// empty baseline.
pub fn diff_str(
    old_text: Option<&str>,
    new_text: &str,
) -> MerkledocResult<(Option<BuildResult>, BuildResult, ChangeSet)> {
    let old = match old_text {
        Some(t) if !t.trim().is_empty() => Some(canonical_json::build_str(t)?),
        _ => None,
    };
    let new = canonical_json::build_str(new_text)?;
    let cs = diff(old.as_ref(), &new);
    Ok((old, new, cs))
}

/// Normalized (index-free) paths of every entry in the change set. With
/// `include_ancestors`, every non-empty ancestor prefix is added too.
/// The bare root `$` is never reported.
pub fn collapsed_paths(cs: &ChangeSet, include_ancestors: bool) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    let all = cs
        .added
        .iter()
        .chain(cs.removed.iter())
        .chain(cs.changed.iter().map(|c| &c.path));
    for p in all {
        let normalized = path::normalize_json(p);
        if include_ancestors {
            path::add_json_with_ancestors(&normalized, &mut out);
        } else {
            out.insert(normalized);
        }
    }
    out.remove("$");
    out
}

/// Attribute each change to the last dot-segment of its normalized path.
pub fn key_summary(cs: &ChangeSet) -> KeySummary {
    let mut ks = KeySummary::default();
    for p in &cs.added {
        ks.mark(last_key(p), ChangeKind::Added);
    }
    for p in &cs.removed {
        ks.mark(last_key(p), ChangeKind::Removed);
    }
    for c in &cs.changed {
        ks.mark(last_key(&c.path), ChangeKind::Changed);
    }
    ks
}

fn last_key(raw_path: &str) -> String {
    path::json_last_segment(&path::normalize_json(raw_path)).to_string()
}

/// Loggable payload for a JSON diff.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffPayload {
    /// Old root hex, or `"<empty>"` for the empty baseline.
    pub root_old: String,
    pub root_new: String,
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub changed: Vec<Changed>,
    /// Direct (ancestor-free) collapsed paths.
    pub collapsed_paths: Vec<String>,
    /// Key → sorted operation names.
    pub key_summary: BTreeMap<String, Vec<String>>,
}

/// Assemble the payload record for a diff.
pub fn payload(old: Option<&BuildResult>, new: &BuildResult, cs: &ChangeSet) -> DiffPayload {
    DiffPayload {
        root_old: old
            .map(BuildResult::root_hex)
            .unwrap_or_else(|| "<empty>".to_string()),
        root_new: new.root_hex(),
        added: cs.added.clone(),
        removed: cs.removed.clone(),
        changed: cs.changed.clone(),
        collapsed_paths: collapsed_paths(cs, false).into_iter().collect(),
        key_summary: key_summary(cs).to_sorted_lists(),
    }
}

/// Structured change summary: normalized path buckets, key buckets, and
/// optionally the extracted identifiers from the new document.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeSummary {
    pub paths: SummaryPaths,
    pub key_summary: SummaryOps,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extracted: Option<Extracted>,
}

/// Build a change summary. With `direct_paths`, buckets hold normalized
/// paths only; otherwise each bucket also carries ancestor prefixes.
pub fn change_summary(
    cs: &ChangeSet,
    direct_paths: bool,
    extracted: Option<Extracted>,
) -> ChangeSummary {
    let normalize_bucket = |raw: &[String]| -> Vec<String> {
        let mut out = BTreeSet::new();
        for p in raw {
            let normalized = path::normalize_json(p);
            if direct_paths {
                out.insert(normalized);
            } else {
                path::add_json_with_ancestors(&normalized, &mut out);
            }
        }
        out.remove("$");
        out.into_iter().collect()
    };

    let changed_raw: Vec<String> = cs.changed.iter().map(|c| c.path.clone()).collect();
    let paths = SummaryPaths {
        added: normalize_bucket(&cs.added),
        removed: normalize_bucket(&cs.removed),
        changed: normalize_bucket(&changed_raw),
    };

    ChangeSummary {
        paths,
        key_summary: SummaryOps::from_marks(&key_summary(cs).keys),
        extracted,
    }
}
