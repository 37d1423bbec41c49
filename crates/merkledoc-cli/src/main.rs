use anyhow::Result;
use clap::Parser;

mod args;
mod cmd;
mod io;
mod output;

fn main() -> Result<()> {
    let cli = args::Cli::parse();
    cmd::dispatch(cli)
}
