//! XML diff flavor: value-leaf filter, collapsed paths, tag summary, and
//! the loggable payload/summary records.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::canonical::{xml as canonical_xml, BuildResult};
use crate::diff::{diff_maps, ChangeKind, ChangeSet, Changed, SummaryOps, SummaryPaths, TagSummary};
use crate::errors::MerkledocResult;
use crate::extract::Extracted;
use crate::path;

/// Value leaves are attributes and text segments; element paths and
/// empty markers only shape the tree.
pub fn is_value_leaf(path: &str) -> bool {
    path.contains(".@") || path.contains(".#text[")
}

/// Diff two canonicalized XML documents. `old == None` is the empty
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
        Some(t) if !t.trim().is_empty() => Some(canonical_xml::build_str(t)?),
        _ => None,
    };
    let new = canonical_xml::build_str(new_text)?;
    let cs = diff(old.as_ref(), &new);
    Ok((old, new, cs))
}

/// Normalized (index-free, text-free) paths of every entry in the change
/// set. With `include_ancestors`, every non-empty ancestor prefix is
/// added, and the document root segment is guaranteed present whenever
/// the set is non-empty.
pub fn collapsed_paths(cs: &ChangeSet, include_ancestors: bool) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    let all = cs
        .added
        .iter()
        .chain(cs.removed.iter())
        .chain(cs.changed.iter().map(|c| &c.path));
    for p in all {
        let normalized = path::normalize_xml(p);
        if include_ancestors {
            path::add_xml_with_ancestors(&normalized, &mut out);
        } else {
            out.insert(normalized);
        }
    }
    if include_ancestors {
        if let Some(root) = out
            .iter()
            .next()
            .and_then(|p| path::xml_root_segment(p))
            .map(str::to_string)
        {
            out.insert(root);
        }
    }
    out.remove("");
    out.remove("/");
    out
}

/// Attribute each change to the tags along its normalized path.
///
/// Every element segment of the path is marked with the operation; a
/// trailing `@attr` segment is recorded as an attribute and additionally
/// marks its parent element CHANGED.
pub fn tag_summary(cs: &ChangeSet) -> TagSummary {
    let mut ts = TagSummary::default();
    for p in &cs.added {
        mark_tags(&mut ts, &path::normalize_xml(p), ChangeKind::Added);
    }
    for p in &cs.removed {
        mark_tags(&mut ts, &path::normalize_xml(p), ChangeKind::Removed);
    }
    for c in &cs.changed {
        mark_tags(&mut ts, &path::normalize_xml(&c.path), ChangeKind::Changed);
    }
    ts
}

fn mark_tags(ts: &mut TagSummary, normalized_path: &str, kind: ChangeKind) {
    if normalized_path.is_empty() {
        return;
    }
    let segments: Vec<&str> = normalized_path.split('/').filter(|s| !s.is_empty()).collect();
    let Some((last, parents)) = segments.split_last() else {
        return;
    };
    for parent in parents {
        ts.mark_element(*parent, kind);
    }
    if last.starts_with('@') {
        ts.mark_attribute(*last, kind);
        if let Some(parent) = parents.last() {
            ts.mark_element(*parent, ChangeKind::Changed);
        }
    } else {
        ts.mark_element(*last, kind);
    }
}

/// Loggable payload for an XML diff.
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
    /// Element tag → sorted operation names.
    pub tag_summary_elements: BTreeMap<String, Vec<String>>,
    /// Attribute tag → sorted operation names.
    pub tag_summary_attributes: BTreeMap<String, Vec<String>>,
}

/// Assemble the payload record for a diff.
pub fn payload(old: Option<&BuildResult>, new: &BuildResult, cs: &ChangeSet) -> DiffPayload {
    let ts = tag_summary(cs);
    DiffPayload {
        root_old: old
            .map(BuildResult::root_hex)
            .unwrap_or_else(|| "<empty>".to_string()),
        root_new: new.root_hex(),
        added: cs.added.clone(),
        removed: cs.removed.clone(),
        changed: cs.changed.clone(),
        collapsed_paths: collapsed_paths(cs, false).into_iter().collect(),
        tag_summary_elements: ts.elements_sorted(),
        tag_summary_attributes: ts.attributes_sorted(),
    }
}

/// Structured change summary: normalized path buckets, merged tag
/// buckets, and optionally the extracted identifiers from the new
/// document.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeSummary {
    pub paths: SummaryPaths,
    pub tag_summary: SummaryOps,
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
            let normalized = path::normalize_xml(p);
            if normalized.is_empty() {
                continue;
            }
            if direct_paths {
                out.insert(normalized);
            } else {
                path::add_xml_with_ancestors(&normalized, &mut out);
            }
        }
        out.remove("");
        out.remove("/");
        out.into_iter().collect()
    };

    let changed_raw: Vec<String> = cs.changed.iter().map(|c| c.path.clone()).collect();
    let paths = SummaryPaths {
        added: normalize_bucket(&cs.added),
        removed: normalize_bucket(&cs.removed),
        changed: normalize_bucket(&changed_raw),
    };

    let ts = tag_summary(cs);
    ChangeSummary {
        paths,
        tag_summary: SummaryOps::from_merged_marks(&ts.elements, &ts.attributes),
        extracted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OLD: &str = concat!(
        r#"<Order xmlns="urn:ex">"#,
        r#"<Item sku="A"><Qty>2</Qty></Item>"#,
        r#"<Item sku="B"><Qty>1</Qty></Item>"#,
        "</Order>"
    );

    const NEW: &str = concat!(
        r#"<Order xmlns="urn:ex">"#,
        r#"<Item sku="B"><Qty>3</Qty></Item>"#,
        r#"<Item sku="A"><Qty>2</Qty></Item>"#,
        "</Order>"
    );

    fn diff_docs(old: &str, new: &str) -> (BuildResult, BuildResult, ChangeSet) {
        let (old, new, cs) = diff_str(Some(old), new).unwrap();
        (old.unwrap(), new, cs)
    }

    #[test]
    fn sibling_reorder_plus_value_change() {
        let (_, _, cs) = diff_docs(OLD, NEW);
        assert!(cs.added.is_empty());
        assert!(cs.removed.is_empty());
        assert_eq!(cs.changed.len(), 1);
        assert!(cs.changed[0].path.contains("urn:ex|Qty"));
    }

    #[test]
    fn collapsed_with_ancestors_holds_full_chain() {
        let (_, _, cs) = diff_docs(OLD, NEW);
        let collapsed = collapsed_paths(&cs, true);
        assert!(collapsed.contains("/urn:ex|Order"));
        assert!(collapsed.contains("/urn:ex|Order/urn:ex|Item"));
        assert!(collapsed.contains("/urn:ex|Order/urn:ex|Item/urn:ex|Qty"));
        for p in &collapsed {
            assert!(!p.contains("#text"));
            assert!(!p.contains("[#"));
        }
    }

    #[test]
    fn tag_summary_marks_path_elements() {
        let (_, _, cs) = diff_docs(OLD, NEW);
        let ts = tag_summary(&cs);
        for tag in ["urn:ex|Order", "urn:ex|Item", "urn:ex|Qty"] {
            assert!(
                ts.elements[tag].contains(&ChangeKind::Changed),
                "missing CHANGED for {tag}"
            );
        }
    }

    #[test]
    fn empty_baseline_marks_everything_added() {
        let (_, new, cs) = diff_str(Some(""), NEW).unwrap();
        assert!(cs.removed.is_empty());
        assert!(cs.changed.is_empty());
        assert_eq!(
            cs.added,
            new.path_value_hashes.keys().cloned().collect::<Vec<_>>()
        );

        let ts = tag_summary(&cs);
        for tag in ["urn:ex|Order", "urn:ex|Item", "urn:ex|Qty"] {
            assert!(
                ts.elements[tag].contains(&ChangeKind::Added),
                "missing ADDED for {tag}"
            );
        }
        assert!(ts.attributes["@sku"].contains(&ChangeKind::Added));
    }

    #[test]
    fn attribute_change_marks_parent_changed() {
        let old = r#"<a><b k="1">t</b></a>"#;
        let new = r#"<a><b k="2">t</b></a>"#;
        let (_, _, cs) = diff_docs(old, new);
        assert_eq!(cs.changed.len(), 1);
        let ts = tag_summary(&cs);
        assert!(ts.attributes["@k"].contains(&ChangeKind::Changed));
        assert!(ts.elements["b"].contains(&ChangeKind::Changed));
    }

    #[test]
    fn payload_shape() {
        let (old, new, cs) = diff_docs(OLD, NEW);
        let p = payload(Some(&old), &new, &cs);
        assert_eq!(p.root_old, old.root_hex());
        assert_eq!(p.root_new, new.root_hex());
        assert!(p
            .collapsed_paths
            .contains(&"/urn:ex|Order/urn:ex|Item/urn:ex|Qty".to_string()));
        let text = serde_json::to_string(&p).unwrap();
        assert!(text.contains("\"tagSummaryElements\""));
        assert!(text.contains("\"tagSummaryAttributes\""));
    }

    #[test]
    fn change_summary_merges_tag_buckets() {
        let (_, _, cs) = diff_str(Some(""), NEW).unwrap();
        let summary = change_summary(&cs, true, None);
        assert!(summary.tag_summary.added.contains(&"urn:ex|Qty".to_string()));
        assert!(summary.tag_summary.added.contains(&"@sku".to_string()));
        assert!(summary
            .paths
            .added
            .contains(&"/urn:ex|Order/urn:ex|Item/@sku".to_string()));
    }
}
