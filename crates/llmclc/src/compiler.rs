//! Responsible with compiling llmcl source into normalized notation

use analysis::{analyze, AnalysisError, Finding};
use llmcl_ir::ids::IdStrategy;
use llmcl_ir::ir::IrNode;
use llmcl_ir::lower::lower_message;
use llmcl_ir::normalize::Normalizer;
use llmcl_ir::printer::{Printer, DEFAULT_INDENT_WIDTH};
use llmcl_syntax::lexer::{scan, Scan};
use llmcl_syntax::parser::{Diagnostic, Parsed, Parser};
use llmcl_syntax::tree::Node;
use llmcl_syntax::Mode;
use llmcl_tokens::token::Token;
use serde::Serialize;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{debug, error, error_span, instrument, Instrument};

pub mod analysis;
pub mod error;

pub use error::{LlmclCError, LlmclCErrorKind, LlmclCResult};

/// The indent widths [LlmclCBuilder::build] accepts
pub const INDENT_WIDTHS: RangeInclusive<usize> = 1..=8;

/// Every artifact of compiling one source
#[derive(Debug, Clone, Serialize)]
pub struct Compilation {
    /// The file the source was read from, if any
    pub path: Option<PathBuf>,
    pub tokens: Vec<Token>,
    pub tree: Node,
    pub ir: IrNode,
    pub normalized: IrNode,
    /// The generated notation
    pub output: String,
    /// Everything the lexer and parser tolerated
    pub diagnostics: Vec<Diagnostic>,
    pub findings: Vec<Finding>,
}

/// Responsible with compiling llmcl source.
///
/// Must be configured using an [LlmclCBuilder].
#[derive(Debug, Clone)]
pub struct LlmclC {
    mode: Mode,
    ids: IdStrategy,
    printer: Printer,
    max_jobs: usize,
}

impl LlmclC {
    /// Creates the default LlmclCBuilder
    #[inline]
    pub fn builder() -> LlmclCBuilder {
        LlmclCBuilder::new()
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn id_strategy(&self) -> IdStrategy {
        self.ids
    }

    /// Runs every stage of the pipeline on a source string
    #[instrument(level = "debug", skip_all, fields(mode = ?self.mode, len = source.len()))]
    pub fn compile(&self, source: &str) -> LlmclCResult<Compilation> {
        let Scan {
            tokens,
            mut diagnostics,
        } = scan(source);
        self.mode.check(diagnostics.clone())?;
        debug!("lexed {} tokens", tokens.len());

        let Parsed {
            tree,
            diagnostics: parse_diagnostics,
        } = Parser::from_iter(tokens.iter().cloned()).finish();
        self.mode.check(parse_diagnostics.clone())?;
        diagnostics.extend(parse_diagnostics);
        diagnostics.sort_by_key(|diagnostic| diagnostic.position);
        debug!("parsed {} nodes", tree.node_count());

        let findings = analyze(&tree);
        self.check_findings(&findings)?;

        let ir = IrNode::Message(lower_message(&tree));
        let normalized = Normalizer::new(self.ids.generator()).normalize(&ir);
        let output = self.printer.generate(&normalized);
        debug!("generated {} bytes of notation", output.len());

        Ok(Compilation {
            path: None,
            tokens,
            tree,
            ir,
            normalized,
            output,
            diagnostics,
            findings,
        })
    }

    fn check_findings(&self, findings: &[Finding]) -> Result<(), AnalysisError> {
        match self.mode {
            Mode::Lenient => {
                for finding in findings {
                    debug!("tolerated {finding}");
                }
                Ok(())
            }
            Mode::Strict => AnalysisError::from_findings(findings).map_or(Ok(()), Err),
        }
    }

    /// Compile a file at a given path
    pub fn compile_file(&self, path: &Path) -> LlmclCResult<Compilation> {
        std::fs::read_to_string(path)
            .map_err(LlmclCError::from)
            .and_then(|source| self.compile(&source))
            .map(|compilation| Compilation {
                path: Some(path.to_path_buf()),
                ..compilation
            })
            .map_err(|e| e.in_file(path))
    }

    /// Compile many files at once, at most `jobs` at a time.
    ///
    /// Results are returned in the same order as the paths.
    pub async fn compile_all(&self, paths: Vec<PathBuf>) -> Vec<LlmclCResult<Compilation>> {
        let mut results = Vec::with_capacity(paths.len());
        results.resize_with(paths.len(), || None);
        let mut join_set = JoinSet::new();

        for (index, path) in paths.iter().cloned().enumerate() {
            if join_set.len() >= self.max_jobs {
                if let Some(joined) = join_set.join_next().await {
                    Self::store(&mut results, joined);
                }
            }
            let compiler = self.clone();
            let path_clone = path.clone();
            join_set.spawn(
                async move {
                    let compiled = match tokio::fs::read_to_string(&path_clone).await {
                        Ok(source) => compiler.compile(&source).map(|compilation| Compilation {
                            path: Some(path_clone.clone()),
                            ..compilation
                        }),
                        Err(e) => Err(LlmclCError::from(e)),
                    };
                    (index, compiled.map_err(|e| e.in_file(&path_clone)))
                }
                .instrument(error_span!("compile", path = ?path)),
            );
        }
        while let Some(joined) = join_set.join_next().await {
            Self::store(&mut results, joined);
        }

        results
            .into_iter()
            .zip(paths)
            .map(|(result, path)| {
                result.unwrap_or_else(|| Err(LlmclCErrorKind::Unfinished(path).into()))
            })
            .collect()
    }

    fn store(
        results: &mut [Option<LlmclCResult<Compilation>>],
        joined: Result<(usize, LlmclCResult<Compilation>), tokio::task::JoinError>,
    ) {
        match joined {
            Ok((index, result)) => results[index] = Some(result),
            Err(e) => error!("compile job failed: {e}"),
        }
    }
}

/// Folds per-file results into every compilation, or a single error holding every failure
pub fn collect_all(
    results: Vec<LlmclCResult<Compilation>>,
) -> LlmclCResult<Vec<Compilation>> {
    let (compilations, errors): (Vec<_>, Vec<_>) =
        results.into_iter().partition(|result| result.is_ok());
    let errors = errors
        .into_iter()
        .filter_map(Result::err)
        .collect::<Vec<_>>();
    if errors.is_empty() {
        Ok(compilations.into_iter().filter_map(Result::ok).collect())
    } else {
        Err(errors.into())
    }
}

/// Builder for creating a [LlmclC] instance.
#[derive(Debug)]
pub struct LlmclCBuilder {
    pub mode: Mode,
    pub ids: IdStrategy,
    /// Spaces per nesting level in generated notation
    pub indent_width: usize,
    /// Number of files to compile at once
    pub jobs: usize,
}

impl LlmclCBuilder {
    /// Creates an LlmclCBuilder with default settings
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// Shorthand for `mode(Mode::Strict)`
    pub fn strict(self) -> Self {
        self.mode(Mode::Strict)
    }

    pub fn ids(mut self, ids: IdStrategy) -> Self {
        self.ids = ids;
        self
    }

    pub fn indent_width(mut self, indent_width: usize) -> Self {
        self.indent_width = indent_width;
        self
    }

    pub fn jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs;
        self
    }

    /// Builds an [LlmclC] instance from this builder
    pub fn build(self) -> Result<LlmclC, BuildLlmclCError> {
        if self.jobs == 0 {
            return Err(BuildLlmclCError::ZeroJobs);
        }
        if !INDENT_WIDTHS.contains(&self.indent_width) {
            return Err(BuildLlmclCError::IndentWidthOutOfRange(self.indent_width));
        }
        Ok(LlmclC {
            mode: self.mode,
            ids: self.ids,
            printer: Printer::new(self.indent_width),
            max_jobs: self.jobs,
        })
    }
}

impl Default for LlmclCBuilder {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            ids: IdStrategy::default(),
            indent_width: DEFAULT_INDENT_WIDTH,
            jobs: num_cpus::get(),
        }
    }
}

/// An error occurred while building an [LlmclC] instance
#[derive(Debug, Error)]
pub enum BuildLlmclCError {
    #[error("indent width must be between 1 and 8, got {0}")]
    IndentWidthOutOfRange(usize),
    #[error("Compilation can't occur if no jobs are allowed")]
    ZeroJobs,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::analysis::FindingKind;
    use llmcl_syntax::parser::{Brace, DiagnosticKind};
    use parking_lot::Mutex;
    use std::io;
    use std::sync::Arc;
    use test_log::test;

    fn compiler() -> LlmclC {
        LlmclC::builder().build().expect("default builder is valid")
    }

    #[test]
    fn test_keeps_every_artifact() {
        let compilation = compiler()
            .compile("@v1.0{#c1~a $q ^prev1.p}")
            .expect("lenient compile");
        assert_eq!(compilation.tokens.len(), 6);
        assert_eq!(compilation.tree.children().len(), 2);
        assert_eq!(compilation.ir, compilation.normalized);
        assert_eq!(compilation.output, "@v1.0{\n  #c1~a{\n    $q{\n      ^prev1.p\n    }\n  }\n}\n");
        assert!(compilation.diagnostics.is_empty());
        assert!(compilation.findings.is_empty());
        assert!(compilation.path.is_none());
    }

    #[test]
    fn test_lenient_keeps_diagnostics_and_findings() {
        let compilation = compiler().compile("#c1{ % ^nowhere").expect("lenient compile");
        assert_eq!(
            compilation
                .diagnostics
                .iter()
                .map(|d| d.kind.clone())
                .collect::<Vec<_>>(),
            [
                DiagnosticKind::UnbalancedBrace(Brace::Open),
                DiagnosticKind::UnrecognizedCharacter('%'),
            ]
        );
        let kinds = compilation
            .findings
            .iter()
            .map(|f| f.kind.clone())
            .collect::<Vec<_>>();
        assert_eq!(
            kinds,
            [
                FindingKind::MissingVersion,
                FindingKind::UnusualReferenceSource("^nowhere".to_string())
            ]
        );
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_lenient_tolerance_is_not_warned_about() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_writer(move || writer.clone())
            .finish();
        let compilation = tracing::subscriber::with_default(subscriber, || {
            compiler().compile("#c1{ % ^nowhere")
        })
        .expect("lenient compile");
        assert_eq!(compilation.diagnostics.len(), 2);
        assert_eq!(compilation.findings.len(), 2);
        assert!(captured.0.lock().is_empty());
    }

    #[test]
    fn test_strict_fails_on_lexing() {
        let compiler = LlmclC::builder().strict().build().expect("valid");
        let err = compiler.compile("@v1.0{#c1 %}").expect_err("bad character");
        assert!(matches!(err.kind(), LlmclCErrorKind::Syntax(_)));
    }

    #[test]
    fn test_strict_fails_on_braces() {
        let compiler = LlmclC::builder().strict().build().expect("valid");
        let err = compiler.compile("@v1.0{#c1").expect_err("unclosed");
        assert!(matches!(err.kind(), LlmclCErrorKind::Syntax(_)));
    }

    #[test]
    fn test_strict_fails_on_error_findings() {
        let compiler = LlmclC::builder().strict().build().expect("valid");
        let err = compiler.compile("{#c1{^prevx}}").expect_err("no version");
        let LlmclCErrorKind::Analysis(analysis) = err.kind() else {
            panic!("expected an analysis error, got {err}");
        };
        assert_eq!(analysis.findings().len(), 2);
    }

    #[test]
    fn test_strict_accepts_warnings() {
        let compiler = LlmclC::builder().strict().build().expect("valid");
        let compilation = compiler.compile("@v1.0{^elsewhere}").expect("only a warning");
        assert_eq!(compilation.findings.len(), 1);
    }

    #[test]
    fn test_strict_accepts_bare_reference() {
        let compiler = LlmclC::builder().strict().build().expect("valid");
        let compilation = compiler.compile("@v1.0{#c1 ^}").expect("only a warning");
        assert_eq!(
            compilation.findings[0].kind,
            FindingKind::UnusualReferenceSource("^".to_string())
        );
        assert_eq!(compilation.output, "@v1.0{\n  #c1{\n    ^\n  }\n}\n");
    }

    #[test]
    fn test_sequential_ids() {
        let compiler = LlmclC::builder()
            .ids(IdStrategy::Sequential)
            .build()
            .expect("valid");
        let compilation = compiler.compile("@v1.0{#x1~a}} #y2").expect("lenient");
        assert_eq!(
            compilation.output,
            "@v1.0{\n  #concept_0~a\n  #concept_1\n}\n"
        );
    }

    #[test]
    fn test_indent_width() {
        let compiler = LlmclC::builder().indent_width(4).build().expect("valid");
        let compilation = compiler.compile("@v1.0{#c1{~r}}").expect("lenient");
        assert_eq!(compilation.output, "@v1.0{\n    #c1{\n        ~r\n    }\n}\n");
    }

    #[test]
    fn test_builder_validation() {
        assert!(matches!(
            LlmclC::builder().indent_width(0).build(),
            Err(BuildLlmclCError::IndentWidthOutOfRange(0))
        ));
        assert!(matches!(
            LlmclC::builder().indent_width(9).build(),
            Err(BuildLlmclCError::IndentWidthOutOfRange(9))
        ));
        assert!(matches!(
            LlmclC::builder().jobs(0).build(),
            Err(BuildLlmclCError::ZeroJobs)
        ));
    }

    #[test]
    fn test_collect_all() {
        let ok = compiler().compile("@v1.0{#c1}").expect("lenient");
        let err = LlmclCError::from(std::io::Error::other("boom"));
        assert_eq!(collect_all(vec![Ok(ok.clone())]).expect("all ok").len(), 1);
        let collected = collect_all(vec![Ok(ok), Err(err)]).expect_err("one failed");
        assert!(matches!(collected.kind(), LlmclCErrorKind::Multi(errors) if errors.len() == 1));
    }
}
