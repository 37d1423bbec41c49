use anyhow::Result;
use serde::Serialize;

use merkledoc_core::canonical::{json, xml, BuildResult};

use crate::args::Format;
use crate::io::input;
use crate::output;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RootOut {
    pub format: &'static str,
    pub root: String,
    pub leaf_count: usize,
}

pub fn run(format: Option<Format>, input_path: &str) -> Result<()> {
    let text = input::read_document(input_path)?;
    let format = input::detect_format(format, input_path, &text)?;
    let result = build(format, &text)?;
    output::print(&RootOut {
        format: format.as_str(),
        root: result.root_hex(),
        leaf_count: result.tree.size(),
    })
}

pub fn build(format: Format, text: &str) -> Result<BuildResult> {
    let result = match format {
        Format::Json => json::build_str(text)?,
        Format::Xml => xml::build_str(text)?,
    };
    Ok(result)
}
