use anyhow::Result;

use merkledoc_core::diff;

use crate::args::Format;
use crate::io::input;
use crate::output;

pub fn run(format: Option<Format>, old_path: Option<&str>, new_path: &str) -> Result<()> {
    let new_text = input::read_document(new_path)?;
    let old_text = old_path.map(input::read_document).transpose()?;
    let format = input::detect_format(format, new_path, &new_text)?;

    match format {
        Format::Json => {
            let (old, new, cs) = diff::json::diff_str(old_text.as_deref(), &new_text)?;
            output::print(&diff::json::payload(old.as_ref(), &new, &cs))
        }
        Format::Xml => {
            let (old, new, cs) = diff::xml::diff_str(old_text.as_deref(), &new_text)?;
            output::print(&diff::xml::payload(old.as_ref(), &new, &cs))
        }
    }
}
