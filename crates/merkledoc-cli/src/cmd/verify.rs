use anyhow::{anyhow, Result};
use serde::Serialize;

use merkledoc_core::canonical::verify_leaf;
use merkledoc_core::merkle::InclusionProof;

use crate::io::input;
use crate::output;

#[derive(Debug, Serialize)]
pub struct VerifyOut {
    pub ok: bool,
}

pub fn run(root_hex: &str, path: &str, value: &str, proof_path: &str) -> Result<()> {
    let proof_json = input::read_document(proof_path)?;
    let proof: InclusionProof =
        serde_json::from_str(&proof_json).map_err(|e| anyhow!("invalid proof json: {e}"))?;

    let root_bytes = hex::decode(root_hex).map_err(|_| anyhow!("root must be hex"))?;
    if root_bytes.len() != 32 {
        return Err(anyhow!("root must be 32 bytes"));
    }
    let mut root = [0u8; 32];
    root.copy_from_slice(&root_bytes);

    let ok = verify_leaf(path, value, &proof, &root);
    output::status_line(ok, path)?;
    output::print(&VerifyOut { ok })
}
