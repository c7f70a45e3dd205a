//! Semantic checks run on the parse tree before lowering

use itertools::Itertools as _;
use llmcl_syntax::tree::{Node, NodeKind};
use serde::Serialize;
use std::fmt::{Display, Formatter};
use thiserror::Error;
use tracing::trace;

/// Reference sources that need no index
pub const KNOWN_REFERENCE_SOURCES: [&str; 2] = ["self", "shared"];

/// Prefix of reference sources that index earlier messages, as in `^prev1`
pub const PREV_SOURCE_PREFIX: &str = "prev";

/// How bad a finding is
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Error,
}

impl Display for Severity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// What semantic analysis found
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", content = "subject", rename_all = "snake_case")]
pub enum FindingKind {
    #[error("message has no version marker")]
    MissingVersion,
    #[error("message has no content")]
    EmptyMessage,
    #[error("reference {0:?} has an unusual source")]
    UnusualReferenceSource(String),
    #[error("reference {0:?} has an invalid prev index")]
    InvalidPrevIndex(String),
}

impl FindingKind {
    pub fn severity(&self) -> Severity {
        match self {
            FindingKind::EmptyMessage | FindingKind::UnusualReferenceSource(_) => Severity::Warning,
            FindingKind::MissingVersion | FindingKind::InvalidPrevIndex(_) => Severity::Error,
        }
    }
}

/// A single finding of semantic analysis
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub severity: Severity,
    #[serde(flatten)]
    pub kind: FindingKind,
}

impl Finding {
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl From<FindingKind> for Finding {
    fn from(kind: FindingKind) -> Self {
        Self {
            severity: kind.severity(),
            kind,
        }
    }
}

impl Display for Finding {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.severity, self.kind)
    }
}

/// The error findings that stopped a strict compilation
#[derive(Debug, Error)]
#[error("semantic analysis failed:\n{}", .0.iter().join("\n"))]
pub struct AnalysisError(Vec<Finding>);

impl AnalysisError {
    /// Collects the error findings, returning `None` if there are none
    pub fn from_findings(findings: &[Finding]) -> Option<Self> {
        let errors = findings
            .iter()
            .filter(|finding| finding.is_error())
            .cloned()
            .collect::<Vec<_>>();
        if errors.is_empty() {
            None
        } else {
            Some(Self(errors))
        }
    }

    pub fn findings(&self) -> &[Finding] {
        &self.0
    }
}

/// Walks the parse tree, collecting findings in tree order
pub fn analyze(tree: &Node) -> Vec<Finding> {
    let mut findings = vec![];
    analyze_node(tree, &mut findings);
    findings
}

fn analyze_node(node: &Node, findings: &mut Vec<Finding>) {
    match node.kind() {
        NodeKind::Message => check_message(node, findings),
        NodeKind::Reference(text) => check_reference(text, findings),
        _ => {}
    }
    for child in node.children() {
        analyze_node(child, findings);
    }
}

fn check_message(node: &Node, findings: &mut Vec<Finding>) {
    let (versions, content): (Vec<_>, Vec<_>) = node
        .children()
        .iter()
        .partition(|child| matches!(child.kind(), NodeKind::Version(_)));
    if versions.is_empty() {
        findings.push(FindingKind::MissingVersion.into());
    }
    if content.is_empty() {
        findings.push(FindingKind::EmptyMessage.into());
    }
}

fn check_reference(text: &str, findings: &mut Vec<Finding>) {
    let body = text.strip_prefix('^').unwrap_or(text);
    let source = body.split('.').next().unwrap_or_default();
    trace!("checking reference source {source:?}");
    let finding = if let Some(index) = source.strip_prefix(PREV_SOURCE_PREFIX) {
        if !index.is_empty() && index.chars().all(|c| c.is_ascii_digit()) {
            return;
        }
        FindingKind::InvalidPrevIndex(text.to_string())
    } else if KNOWN_REFERENCE_SOURCES.contains(&source) {
        return;
    } else {
        FindingKind::UnusualReferenceSource(text.to_string())
    };
    findings.push(finding.into());
}
