use anyhow::Result;

use crate::args::{Cli, Command};

mod diff;
mod prove;
mod root;
mod verify;

pub fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Root { input } => root::run(cli.format, &input),
        Command::Diff { new, old } => diff::run(cli.format, old.as_deref(), &new),
        Command::Prove { input, path } => prove::run(cli.format, &input, &path),
        Command::Verify {
            root,
            path,
            value,
            proof,
        } => verify::run(&root, &path, &value, &proof),
    }
}
