//! Stdout rendering. Stdout carries exactly one JSON document; diagnostics
//! and logs go to stderr.

use std::io::Write;

use serde::Serialize;

use crate::error::CliError;

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    let mut out = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, value)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}
