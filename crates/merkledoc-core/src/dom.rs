//! Owned, namespace-aware XML document tree.
//!
//! The canonicalizer consumes this tree rather than a parser's borrowed
//! view, so callers may build documents programmatically or parse them
//! from text via [`XmlDocument::parse`] (backed by `sxd-document`).
//!
//! Shape notes:
//! - comments and processing instructions are dropped at parse time
//! - namespace declarations are namespaces, not attributes
//! - adjacent character data is kept as the parser reports it; the
//!   canonicalizer trims and discards whitespace-only runs

use sxd_document::dom::{ChildOfElement, ChildOfRoot, Element};
use sxd_document::parser;

use crate::errors::{MerkledocError, MerkledocResult};

/// A parsed XML document: exactly one root element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlDocument {
    pub root: XmlElement,
}

/// An element with its expanded name, attributes, and ordered children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    pub namespace: Option<String>,
    pub local_name: String,
    pub attributes: Vec<XmlAttribute>,
    pub children: Vec<XmlChild>,
}

/// An attribute with its expanded name and value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlAttribute {
    pub namespace: Option<String>,
    pub local_name: String,
    pub value: String,
}

/// A child node: a nested element or a run of character data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlChild {
    Element(XmlElement),
    Text(String),
}

impl XmlDocument {
    /// Parse XML text into an owned document tree.
    pub fn parse(text: &str) -> MerkledocResult<Self> {
        if text.trim().is_empty() {
            return Err(MerkledocError::malformed_input("empty XML document"));
        }
        let package = parser::parse(text)
            .map_err(|e| MerkledocError::malformed_input(format!("invalid XML: {e:?}")))?;
        let document = package.as_document();
        let root = document
            .root()
            .children()
            .into_iter()
            .find_map(|c| match c {
                ChildOfRoot::Element(e) => Some(e),
                _ => None,
            })
            .ok_or_else(|| MerkledocError::malformed_input("XML document has no root element"))?;
        Ok(XmlDocument {
            root: convert_element(root),
        })
    }
}

impl XmlElement {
    pub fn new(local_name: impl Into<String>) -> Self {
        Self {
            namespace: None,
            local_name: local_name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_namespace(mut self, uri: impl Into<String>) -> Self {
        self.namespace = Some(uri.into());
        self
    }

    pub fn with_attribute(mut self, attribute: XmlAttribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn with_child(mut self, child: XmlChild) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.with_child(XmlChild::Text(text.into()))
    }

    /// Qualified name: `localName` or `namespaceURI|localName`.
    pub fn qname(&self) -> String {
        qname_of(self.namespace.as_deref(), &self.local_name)
    }
}

impl XmlAttribute {
    pub fn new(local_name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            namespace: None,
            local_name: local_name.into(),
            value: value.into(),
        }
    }

    pub fn with_namespace(mut self, uri: impl Into<String>) -> Self {
        self.namespace = Some(uri.into());
        self
    }

    /// Qualified name: `localName` or `namespaceURI|localName`.
    pub fn qname(&self) -> String {
        qname_of(self.namespace.as_deref(), &self.local_name)
    }
}

/// Render an expanded name. The namespace URI is treated as opaque text.
pub fn qname_of(namespace: Option<&str>, local_name: &str) -> String {
    match namespace {
        Some(ns) => format!("{ns}|{local_name}"),
        None => local_name.to_string(),
    }
}

fn convert_element(el: Element<'_>) -> XmlElement {
    let name = el.name();
    let attributes = el
        .attributes()
        .into_iter()
        .map(|a| XmlAttribute {
            namespace: a.name().namespace_uri().map(str::to_string),
            local_name: a.name().local_part().to_string(),
            value: a.value().to_string(),
        })
        .collect();
    // Adjacent character-data runs (plain text next to CDATA) coalesce
    // into a single text child.
    let mut children: Vec<XmlChild> = Vec::new();
    for c in el.children() {
        match c {
            ChildOfElement::Element(e) => children.push(XmlChild::Element(convert_element(e))),
            ChildOfElement::Text(t) => {
                if let Some(XmlChild::Text(prev)) = children.last_mut() {
                    prev.push_str(t.text());
                } else {
                    children.push(XmlChild::Text(t.text().to_string()));
                }
            }
            _ => {}
        }
    }
    XmlElement {
        namespace: name.namespace_uri().map(str::to_string),
        local_name: name.local_part().to_string(),
        attributes,
        children,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_namespaced_document() {
        let doc = XmlDocument::parse(r#"<Order xmlns="urn:ex"><Item sku="A">2</Item></Order>"#)
            .unwrap();
        assert_eq!(doc.root.qname(), "urn:ex|Order");
        let item = match &doc.root.children[0] {
            XmlChild::Element(e) => e,
            other => panic!("expected element child, got {other:?}"),
        };
        assert_eq!(item.qname(), "urn:ex|Item");
        assert_eq!(item.attributes.len(), 1);
        assert_eq!(item.attributes[0].qname(), "sku");
        assert_eq!(item.attributes[0].value, "A");
        assert_eq!(item.children, vec![XmlChild::Text("2".to_string())]);
    }

    #[test]
    fn namespace_declarations_are_not_attributes() {
        let doc = XmlDocument::parse(r#"<a xmlns="urn:x" xmlns:p="urn:y"/>"#).unwrap();
        assert!(doc.root.attributes.is_empty());
    }

    #[test]
    fn comments_are_dropped() {
        let doc = XmlDocument::parse("<a><!-- note --><b/></a>").unwrap();
        assert_eq!(doc.root.children.len(), 1);
        assert!(matches!(doc.root.children[0], XmlChild::Element(_)));
    }

    #[test]
    fn empty_input_is_malformed() {
        let err = XmlDocument::parse("   ").unwrap_err();
        assert!(err.to_string().contains("malformed"));
    }

    #[test]
    fn unclosed_tag_is_malformed() {
        assert!(XmlDocument::parse("<a><b></a>").is_err());
    }
}
