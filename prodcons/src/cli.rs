use std::path::PathBuf;

use clap::Parser;

/// Bounded-buffer producer/consumer run
#[derive(Debug, Clone, Parser)]
pub struct Args {
    /// Number of consumer threads
    #[arg(short, long, default_value_t = 5)]
    pub consumers: usize,

    /// Number of slots in the shared circular buffer
    #[arg(short = 'b', long, default_value_t = 5)]
    pub capacity: usize,

    /// Delay between two produced values, in milliseconds
    #[arg(short, long, default_value_t = 15)]
    pub pace_ms: u64,

    /// Total run time, in seconds
    #[arg(short, long, default_value_t = 300)]
    pub duration_secs: u64,

    /// Upper bound for a single blocking wait, in milliseconds
    ///
    /// Also the period at which the run deadline is checked.
    #[arg(long, default_value_t = 10)]
    pub poll_ms: u64,

    /// Report file, "-" writes to stdout
    #[arg(short, long, default_value = "output.tsv")]
    pub output: PathBuf,
}
