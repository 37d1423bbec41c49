use std::fs;
use std::path::Path;

use anyhow::{anyhow, Result};

use crate::args::Format;

/// Read a document file as UTF-8 text.
pub fn read_document<P: AsRef<Path>>(path: P) -> Result<String> {
    fs::read_to_string(path.as_ref())
        .map_err(|e| anyhow!("failed to read {}: {e}", path.as_ref().display()))
}

/// Resolve the document format: an explicit flag wins, then the file
/// extension, then a sniff of the first non-whitespace character.
pub fn detect_format(flag: Option<Format>, file_name: &str, text: &str) -> Result<Format> {
    if let Some(f) = flag {
        return Ok(f);
    }
    let lower = file_name.to_ascii_lowercase();
    if lower.ends_with(".json") {
        return Ok(Format::Json);
    }
    if lower.ends_with(".xml") {
        return Ok(Format::Xml);
    }
    match text.trim_start().chars().next() {
        Some('<') => Ok(Format::Xml),
        Some(_) => Ok(Format::Json),
        None => Err(anyhow!("cannot detect format of empty document: {file_name}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_beats_extension_and_sniffing() {
        let f = detect_format(Some(Format::Xml), "doc.json", "{}").unwrap();
        assert_eq!(f, Format::Xml);
    }

    #[test]
    fn extension_beats_sniffing() {
        assert_eq!(detect_format(None, "doc.json", "<a/>").unwrap(), Format::Json);
        assert_eq!(detect_format(None, "doc.xml", "{}").unwrap(), Format::Xml);
    }

    #[test]
    fn sniffing_falls_back_to_first_character() {
        assert_eq!(detect_format(None, "doc", "  <a/>").unwrap(), Format::Xml);
        assert_eq!(detect_format(None, "doc", r#"{"a":1}"#).unwrap(), Format::Json);
        assert!(detect_format(None, "doc", "   ").is_err());
    }
}
