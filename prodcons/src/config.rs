use std::{path::PathBuf, time::Duration};

use anyhow::ensure;

use crate::cli::Args;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub consumers: usize,
    pub capacity: usize,
    pub pace: Duration,
    pub run_for: Duration,
    pub poll: Duration,
    pub output: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            consumers: 5,
            capacity: 5,
            pace: Duration::from_millis(15),
            run_for: Duration::from_secs(300),
            poll: boundbuf::DEFAULT_POLL_INTERVAL,
            output: PathBuf::from("output.tsv"),
        }
    }
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(self.consumers > 0, "at least one consumer is required");
        ensure!(self.capacity > 0, "buffer capacity must be at least 1");
        ensure!(!self.poll.is_zero(), "poll interval must be non-zero");
        Ok(())
    }
}

impl TryFrom<Args> for Config {
    type Error = anyhow::Error;

    fn try_from(args: Args) -> anyhow::Result<Self> {
        let config = Self {
            consumers: args.consumers,
            capacity: args.capacity,
            pace: Duration::from_millis(args.pace_ms),
            run_for: Duration::from_secs(args.duration_secs),
            poll: Duration::from_millis(args.poll_ms),
            output: args.output,
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use clap::Parser;

    use super::Config;
    use crate::cli::Args;

    fn parse(argv: &[&str]) -> anyhow::Result<Config> {
        let args = Args::try_parse_from(std::iter::once("prodcons").chain(argv.iter().copied()))?;
        Config::try_from(args)
    }

    #[test]
    fn defaults_match_cli() {
        assert_eq!(parse(&[]).unwrap(), Config::default());
    }

    #[test]
    fn flags() {
        let config = parse(&["-c", "3", "-b", "1", "-p", "0", "-d", "2", "--poll-ms", "4"]).unwrap();
        assert_eq!(config.consumers, 3);
        assert_eq!(config.capacity, 1);
        assert_eq!(config.pace, Duration::ZERO);
        assert_eq!(config.run_for, Duration::from_secs(2));
        assert_eq!(config.poll, Duration::from_millis(4));
    }

    #[test]
    fn rejects_empty_pool_and_buffer() {
        assert!(parse(&["-c", "0"]).is_err());
        assert!(parse(&["-b", "0"]).is_err());
        assert!(parse(&["--poll-ms", "0"]).is_err());
    }
}
