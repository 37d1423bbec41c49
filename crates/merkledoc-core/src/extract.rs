//! Extraction facade.
//!
//! Pulls an identifier, a list of types, and a key→value map out of the
//! *new* document, driven entirely by configuration. This is a thin
//! adapter for reporting pipelines; it never touches the change set.
//!
//! - JSON configs use simple dotted paths (`$.order.id` or `order.id`),
//!   no wildcards or filters.
//! - XML configs hold XPath expressions, evaluated by `sxd-xpath`, with
//!   an optional prefix→URI namespace table.
//!
//! Unconfigured fields yield `None`, `[]`, and `{}`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sxd_document::parser;
use sxd_xpath::{Context, Factory, Value as XPathValue, XPath};

use crate::errors::{MerkledocError, MerkledocResult};

/// The extracted record attached to change summaries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extracted {
    #[serde(rename = "Id")]
    pub id: Option<String>,
    pub types: Vec<String>,
    pub key: BTreeMap<String, String>,
}

/// Key-map extraction from a JSON array: which array to iterate and which
/// member fields carry the key and value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonKeyMapConfig {
    pub entry_array_path: String,
    pub key_field: String,
    pub value_field: String,
}

/// Config for extracting from a JSON document via dotted paths.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonExtractConfig {
    /// Dotted path to the identifier, e.g. `$.order.id`.
    pub id_path: Option<String>,
    /// Dotted path to an array feeding the types list.
    pub types_array_path: Option<String>,
    /// When array elements are objects, the member to read per element.
    pub types_value_field: Option<String>,
    pub key_map: Option<JsonKeyMapConfig>,
}

/// Key-map extraction from an XML nodeset: which entries to iterate and
/// which relative expressions compute key and value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct XmlKeyMapConfig {
    /// Nodeset of entries, e.g. `//ex:Item`.
    pub entry_xpath: String,
    /// Relative expression for the map key, e.g. `string(@sku)`.
    pub key_expr: String,
    /// Relative expression for the map value, e.g. `string(ex:Qty)`.
    pub value_expr: String,
}

/// Config for extracting from an XML document via XPath.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct XmlExtractConfig {
    /// String-result expression for the identifier,
    /// e.g. `string(/ex:Order/@id)`.
    pub id_xpath: Option<String>,
    /// Nodeset expression for the types list, e.g. `//ex:Item/@type`.
    pub types_xpath: Option<String>,
    pub key_map: Option<XmlKeyMapConfig>,
    /// Prefix → namespace URI bindings for the expressions above.
    pub namespaces: Vec<(String, String)>,
}

/// Extract from a parsed JSON document. Total: missing paths simply
/// leave their field empty.
pub fn extract_json(root: &Value, cfg: &JsonExtractConfig) -> Extracted {
    let mut out = Extracted::default();

    if let Some(id_path) = nonblank(&cfg.id_path) {
        out.id = read_string_at(root, id_path).filter(|s| !s.is_empty());
    }

    if let Some(types_path) = nonblank(&cfg.types_array_path) {
        if let Some(Value::Array(items)) = read_at(root, types_path) {
            for item in items {
                let picked = match (&cfg.types_value_field, item) {
                    (Some(field), Value::Object(members)) => members.get(field),
                    _ => Some(item),
                };
                if let Some(v) = picked {
                    if !v.is_null() {
                        out.types.push(value_text(v));
                    }
                }
            }
        }
    }

    if let Some(km) = &cfg.key_map {
        if let Some(Value::Array(items)) = read_at(root, &km.entry_array_path) {
            for item in items {
                let Value::Object(members) = item else {
                    continue;
                };
                let key = members
                    .get(&km.key_field)
                    .filter(|v| !v.is_null())
                    .map(value_text);
                let value = members
                    .get(&km.value_field)
                    .filter(|v| !v.is_null())
                    .map(value_text);
                if let Some(k) = key.filter(|k| !k.is_empty()) {
                    out.key.insert(k, value.unwrap_or_default());
                }
            }
        }
    }

    out
}

/// Extract from XML text. Fails on malformed documents or expressions;
/// expressions that match nothing leave their field empty.
pub fn extract_xml(xml: &str, cfg: &XmlExtractConfig) -> MerkledocResult<Extracted> {
    let package = parser::parse(xml)
        .map_err(|e| MerkledocError::malformed_input(format!("invalid XML: {e:?}")))?;
    let document = package.as_document();

    let factory = Factory::new();
    let mut context = Context::new();
    for (prefix, uri) in &cfg.namespaces {
        context.set_namespace(prefix, uri);
    }

    let mut out = Extracted::default();

    if let Some(expr) = nonblank(&cfg.id_xpath) {
        let xpath = compile(&factory, expr)?;
        let value = evaluate(&xpath, &context, document.root())?;
        let id = xpath_string(value);
        if !id.is_empty() {
            out.id = Some(id);
        }
    }

    if let Some(expr) = nonblank(&cfg.types_xpath) {
        let xpath = compile(&factory, expr)?;
        if let XPathValue::Nodeset(nodes) = evaluate(&xpath, &context, document.root())? {
            for node in nodes.document_order() {
                let v = node.string_value();
                if !v.is_empty() {
                    out.types.push(v);
                }
            }
        }
    }

    if let Some(km) = &cfg.key_map {
        let entries = compile(&factory, &km.entry_xpath)?;
        let key_expr = compile(&factory, &km.key_expr)?;
        let value_expr = compile(&factory, &km.value_expr)?;
        if let XPathValue::Nodeset(nodes) = evaluate(&entries, &context, document.root())? {
            for entry in nodes.document_order() {
                let key = xpath_string(evaluate(&key_expr, &context, entry)?);
                if key.is_empty() {
                    continue;
                }
                let value = xpath_string(evaluate(&value_expr, &context, entry)?);
                out.key.insert(key, value);
            }
        }
    }

    Ok(out)
}

fn nonblank(opt: &Option<String>) -> Option<&str> {
    opt.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Walk a dotted path (`$.a.b`, `a.b`) through nested objects.
fn read_at<'a>(root: &'a Value, dotted: &str) -> Option<&'a Value> {
    let mut p = dotted.trim();
    if let Some(rest) = p.strip_prefix("$.") {
        p = rest;
    } else if let Some(rest) = p.strip_prefix('$') {
        p = rest;
    }
    let mut cur = root;
    for key in p.split('.').filter(|k| !k.is_empty()) {
        cur = cur.as_object()?.get(key)?;
    }
    Some(cur)
}

/// Dotted-path read that only yields scalar text.
fn read_string_at(root: &Value, dotted: &str) -> Option<String> {
    let v = read_at(root, dotted)?;
    match v {
        Value::Null | Value::Object(_) | Value::Array(_) => None,
        _ => Some(value_text(v)),
    }
}

fn value_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn compile(factory: &Factory, expr: &str) -> MerkledocResult<XPath> {
    factory
        .build(expr)
        .map_err(|e| MerkledocError::invalid_argument(format!("invalid XPath {expr:?}: {e:?}")))?
        .ok_or_else(|| MerkledocError::invalid_argument(format!("empty XPath: {expr:?}")))
}

fn evaluate<'d, N>(
    xpath: &XPath,
    context: &Context<'d>,
    node: N,
) -> MerkledocResult<XPathValue<'d>>
where
    N: Into<sxd_xpath::nodeset::Node<'d>>,
{
    xpath
        .evaluate(context, node)
        .map_err(|e| MerkledocError::invalid_argument(format!("XPath evaluation failed: {e:?}")))
}

/// XPath string-value of an evaluation result.
fn xpath_string(value: XPathValue<'_>) -> String {
    match value {
        XPathValue::String(s) => s,
        XPathValue::Boolean(b) => b.to_string(),
        XPathValue::Number(n) => {
            if n.fract() == 0.0 && n.is_finite() {
                format!("{}", n as i64)
            } else {
                n.to_string()
            }
        }
        XPathValue::Nodeset(nodes) => nodes
            .document_order_first()
            .map(|n| n.string_value())
            .unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_extraction_end_to_end() {
        let doc = json!({
            "order": {"id": "ORD-9"},
            "items": [
                {"sku": "B", "type": "wholesale", "qty": 3},
                {"sku": "A", "type": "retail", "qty": 2}
            ],
            "extra": 42
        });
        let cfg = JsonExtractConfig {
            id_path: Some("$.order.id".to_string()),
            types_array_path: Some("$.items".to_string()),
            types_value_field: Some("type".to_string()),
            key_map: Some(JsonKeyMapConfig {
                entry_array_path: "$.items".to_string(),
                key_field: "sku".to_string(),
                value_field: "qty".to_string(),
            }),
        };
        let e = extract_json(&doc, &cfg);
        assert_eq!(e.id.as_deref(), Some("ORD-9"));
        assert_eq!(e.types, vec!["wholesale", "retail"]);
        assert_eq!(e.key.get("A").map(String::as_str), Some("2"));
        assert_eq!(e.key.get("B").map(String::as_str), Some("3"));
    }

    #[test]
    fn json_extraction_defaults_when_unconfigured() {
        let e = extract_json(&json!({"a": 1}), &JsonExtractConfig::default());
        assert_eq!(e, Extracted::default());
    }

    #[test]
    fn json_id_path_accepts_bare_and_rooted_forms() {
        let doc = json!({"order": {"id": "X"}});
        for p in ["$.order.id", "order.id"] {
            let cfg = JsonExtractConfig {
                id_path: Some(p.to_string()),
                ..Default::default()
            };
            assert_eq!(extract_json(&doc, &cfg).id.as_deref(), Some("X"));
        }
    }

    #[test]
    fn json_id_missing_or_container_is_none() {
        let doc = json!({"order": {"id": {"nested": true}}});
        let cfg = JsonExtractConfig {
            id_path: Some("$.order.id".to_string()),
            ..Default::default()
        };
        assert_eq!(extract_json(&doc, &cfg).id, None);
        let cfg = JsonExtractConfig {
            id_path: Some("$.missing".to_string()),
            ..Default::default()
        };
        assert_eq!(extract_json(&doc, &cfg).id, None);
    }

    #[test]
    fn xml_extraction_end_to_end() {
        let xml = concat!(
            r#"<Order xmlns="urn:ex" id="ORD-7">"#,
            r#"<Item sku="A" type="retail"><Qty>2</Qty></Item>"#,
            r#"<Item sku="B" type="wholesale"><Qty>3</Qty></Item>"#,
            "</Order>"
        );
        let cfg = XmlExtractConfig {
            id_xpath: Some("string(/ex:Order/@id)".to_string()),
            types_xpath: Some("//ex:Item/@type".to_string()),
            key_map: Some(XmlKeyMapConfig {
                entry_xpath: "//ex:Item".to_string(),
                key_expr: "string(@sku)".to_string(),
                value_expr: "string(ex:Qty)".to_string(),
            }),
            namespaces: vec![("ex".to_string(), "urn:ex".to_string())],
        };
        let e = extract_xml(xml, &cfg).unwrap();
        assert_eq!(e.id.as_deref(), Some("ORD-7"));
        assert_eq!(e.types, vec!["retail", "wholesale"]);
        assert_eq!(e.key.get("A").map(String::as_str), Some("2"));
        assert_eq!(e.key.get("B").map(String::as_str), Some("3"));
    }

    #[test]
    fn xml_extraction_defaults_when_unconfigured() {
        let e = extract_xml("<a/>", &XmlExtractConfig::default()).unwrap();
        assert_eq!(e, Extracted::default());
    }

    #[test]
    fn xml_bad_expression_is_invalid_argument() {
        let cfg = XmlExtractConfig {
            id_xpath: Some("string(///".to_string()),
            ..Default::default()
        };
        assert!(extract_xml("<a/>", &cfg).is_err());
    }
}
