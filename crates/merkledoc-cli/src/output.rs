use std::io::Write;

use serde::Serialize;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Print a result record as pretty JSON on stdout.
pub fn print<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    println!("{s}");
    Ok(())
}

/// Print a colored status line on stderr.
pub fn status_line(ok: bool, msg: &str) -> anyhow::Result<()> {
    let mut out = StandardStream::stderr(ColorChoice::Auto);
    let mut spec = ColorSpec::new();
    spec.set_fg(Some(if ok { Color::Green } else { Color::Red }))
        .set_bold(true);
    out.set_color(&spec)?;
    write!(out, "{}", if ok { "ok" } else { "failed" })?;
    out.reset()?;
    writeln!(out, " {msg}")?;
    Ok(())
}
