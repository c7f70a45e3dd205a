use crate::args::Args;
use crate::emit::write_artifact;
use crate::sources::collect_sources;
use clap::{CommandFactory, Parser};
use llmclc::{collect_all, Compilation, LlmclC};
use owo_colors::{OwoColorize, Stream};
use std::io::{stdout, Write};
use tokio::io::AsyncReadExt;
use tracing::{debug, trace};

mod args;
mod emit;
mod sources;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    let args = Args::parse();
    args.logging().init_logging()?;
    trace!("starting llmclc with args: {args:?}");
    debug!("llmclc version: {}", env!("CARGO_PKG_VERSION"));

    if let Some(shell) = args.completions {
        clap_complete::generate(shell, &mut Args::command(), "llmclc", &mut stdout());
        return Ok(());
    }

    let llmclc = LlmclC::builder()
        .mode(args.mode())
        .ids(args.ids.into())
        .indent_width(args.indent)
        .build()?;

    let compilations = if args.files.is_empty() {
        let mut source = String::new();
        tokio::io::stdin().read_to_string(&mut source).await?;
        vec![llmclc.compile(&source)?]
    } else {
        let to_compile = collect_sources(args.files.as_slice())?;
        debug!("paths to compile: {to_compile:#?}");
        collect_all(llmclc.compile_all(to_compile).await)?
    };

    let mut out = stdout().lock();
    for compilation in &compilations {
        write_artifact(&mut out, args.emit, compilation)?;
    }
    out.flush()?;

    report(&compilations);
    Ok(())
}

/// Lists what lenient compilation skipped past on stderr
fn report(compilations: &[Compilation]) {
    for compilation in compilations {
        let name = compilation
            .path
            .as_ref()
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "<stdin>".to_string());
        for diagnostic in &compilation.diagnostics {
            eprintln!(
                "{}: {name}: {diagnostic}",
                "diagnostic".if_supports_color(Stream::Stderr, |text| text.yellow())
            );
        }
        for finding in &compilation.findings {
            let label = if finding.is_error() {
                "finding".if_supports_color(Stream::Stderr, |text| text.red()).to_string()
            } else {
                "finding"
                    .if_supports_color(Stream::Stderr, |text| text.yellow())
                    .to_string()
            };
            eprintln!("{label}: {name}: {finding}");
        }
    }
}
