//! the args for running llmclc

use clap::ValueEnum;
use llmcl_cli_common::LoggingArgs;
use llmcl_ir::ids::IdStrategy;
use llmcl_ir::printer::DEFAULT_INDENT_WIDTH;
use llmcl_syntax::Mode;
use std::path::PathBuf;

/// The args struct
#[derive(Debug, clap::Parser)]
#[clap(
    author,
    version,
    about = "Compiles llmcl notation into its normalized form"
)]
pub struct Args {
    #[command(flatten)]
    logging: LoggingArgs,

    /// Source files, or directories searched for `*.llmcl` files. Reads stdin if none are given
    #[clap(value_name = "source file", value_hint = clap::ValueHint::AnyPath)]
    pub files: Vec<PathBuf>,
    /// Fail on unrecognized characters, unbalanced braces and error findings instead of
    /// skipping past them
    #[clap(long)]
    pub strict: bool,
    /// How synthetic concept ids are numbered
    #[clap(long, value_enum, default_value_t = Ids::Random, env = "LLMCLC_IDS")]
    pub ids: Ids,
    /// Spaces per nesting level in generated code
    #[clap(long, default_value_t = DEFAULT_INDENT_WIDTH, env = "LLMCLC_INDENT")]
    pub indent: usize,
    /// What to print for every compiled source
    #[clap(long, value_enum, default_value_t = Emit::Code)]
    pub emit: Emit,
    /// Print a completion script for a shell and exit
    #[clap(long, value_name = "shell")]
    pub completions: Option<clap_complete::Shell>,
}

impl Args {
    pub fn mode(&self) -> Mode {
        if self.strict {
            Mode::Strict
        } else {
            Mode::Lenient
        }
    }

    pub fn logging(&self) -> &LoggingArgs {
        &self.logging
    }
}

/// Synthetic id strategies, as named on the command line
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum Ids {
    Random,
    Hash,
    Sequential,
}

impl From<Ids> for IdStrategy {
    fn from(value: Ids) -> Self {
        match value {
            Ids::Random => IdStrategy::Random,
            Ids::Hash => IdStrategy::ContentHash,
            Ids::Sequential => IdStrategy::Sequential,
        }
    }
}

/// Which artifact of a compilation gets printed
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum Emit {
    /// The generated notation
    Code,
    Tokens,
    /// The parse tree
    Ast,
    Ir,
    Normalized,
}
