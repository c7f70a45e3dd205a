#![doc = include_str!("../README.md")]

use clap::{value_parser, ArgAction, Args};

#[cfg(feature = "tracing")]
pub mod writer;

/// Common way to set logging levels
#[derive(Debug, Default, Clone, Copy, Args)]
pub struct LoggingArgs {
    /// Log more, repeat for even more
    #[clap(short = 'v', value_parser = value_parser!(u8).range(0..=2), action=ArgAction::Count, conflicts_with="quiet")]
    verbose: u8,
    /// Log less, repeat to silence everything
    #[clap(short = 'q', value_parser = value_parser!(u8).range(0..=2), action=ArgAction::Count, conflicts_with="verbose")]
    quiet: u8,
}

impl LoggingArgs {
    /// How far from the default level the flags move logging, `-2` to `2`
    pub fn verbosity(&self) -> i8 {
        (self.verbose.min(2) as i8) - (self.quiet.min(2) as i8)
    }

    /// Gets the logging level based on whether `-v[v]` or `-q[q]` has been used,
    #[cfg(feature = "tracing")]
    pub fn log_level_filter(&self) -> tracing::level_filters::LevelFilter {
        use tracing::level_filters::LevelFilter;
        match self.verbosity() {
            i8::MIN..=-2 => LevelFilter::OFF,
            -1 => LevelFilter::ERROR,
            0 => LevelFilter::INFO,
            1 => LevelFilter::DEBUG,
            2..=i8::MAX => LevelFilter::TRACE,
        }
    }

    /// Installs the global subscriber at the level these flags select
    #[cfg(feature = "tracing")]
    pub fn init_logging(&self) -> Result<(), tracing::subscriber::SetGlobalDefaultError> {
        writer::init_logging(self.log_level_filter())
    }
}
