use anyhow::Result;
use serde::Serialize;

use merkledoc_core::merkle::InclusionProof;

use crate::args::Format;
use crate::cmd::root;
use crate::io::input;
use crate::output;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProveOut {
    pub root: String,
    pub path: String,
    pub proof: InclusionProof,
}

pub fn run(format: Option<Format>, input_path: &str, canonical_path: &str) -> Result<()> {
    let text = input::read_document(input_path)?;
    let format = input::detect_format(format, input_path, &text)?;
    let result = root::build(format, &text)?;
    let proof = result.prove(canonical_path)?;
    output::print(&ProveOut {
        root: result.root_hex(),
        path: canonical_path.to_string(),
        proof,
    })
}
