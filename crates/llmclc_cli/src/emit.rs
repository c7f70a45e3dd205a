//! Prints the requested artifact of a compilation

use crate::args::Emit;
use llmclc::Compilation;
use serde::Serialize;
use std::io::Write;

/// Writes one artifact. Everything but generated code is written as pretty JSON.
pub fn write_artifact<W: Write>(
    out: &mut W,
    emit: Emit,
    compilation: &Compilation,
) -> eyre::Result<()> {
    match emit {
        Emit::Code => out.write_all(compilation.output.as_bytes())?,
        Emit::Tokens => write_json(out, &compilation.tokens)?,
        Emit::Ast => write_json(out, &compilation.tree)?,
        Emit::Ir => write_json(out, &compilation.ir)?,
        Emit::Normalized => write_json(out, &compilation.normalized)?,
    }
    Ok(())
}

fn write_json<W: Write, T: Serialize + ?Sized>(out: &mut W, value: &T) -> eyre::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}
