use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "merkledoc",
    version,
    about = "Order-insensitive Merkle commitments and diffs for JSON/XML documents"
)]
pub struct Cli {
    /// Force the document format instead of sniffing it.
    #[arg(long, global = true, value_enum)]
    pub format: Option<Format>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Xml,
}

impl Format {
    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::Xml => "xml",
        }
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Canonicalize a document and print its Merkle root.
    Root {
        /// Document file.
        input: String,
    },

    /// Diff two document versions and print the payload record.
    Diff {
        /// New document file.
        new: String,

        /// Old document file; omit for the empty baseline.
        #[arg(long)]
        old: Option<String>,
    },

    /// Produce an inclusion proof for a canonical path.
    Prove {
        /// Document file.
        input: String,

        /// Canonical path of the leaf, e.g. "$.addr.pin".
        #[arg(long)]
        path: String,
    },

    /// Verify an inclusion proof against a root.
    Verify {
        /// Expected root, lowercase hex.
        #[arg(long)]
        root: String,

        /// Canonical path of the leaf.
        #[arg(long)]
        path: String,

        /// Normalized leaf value.
        #[arg(long)]
        value: String,

        /// Proof JSON file (InclusionProof structure).
        #[arg(long)]
        proof: String,
    },
}
