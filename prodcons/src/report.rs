use std::{
    fmt,
    fs::File,
    io::{self, BufWriter, Write},
    path::Path,
};

use anyhow::Context;

use crate::consumer::Tally;

pub const HEADER: &str = "Consumer ID\tTimes Consumed";

/// Tab-separated table of final per-consumer counts, ordered by consumer id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    rows: Vec<Tally>,
}

impl Report {
    pub fn new(mut rows: Vec<Tally>) -> Self {
        rows.sort_by_key(|t| t.id);
        Self { rows }
    }

    pub fn total(&self) -> u64 {
        self.rows.iter().map(|t| t.consumed).sum()
    }

    pub fn write_to(&self, mut out: impl Write) -> io::Result<()> {
        write!(out, "{self}")?;
        out.flush()
    }

    /// Writes the table to `path`, or to stdout when `path` is `-`.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if path == Path::new("-") {
            return self.write_to(io::stdout().lock()).context("writing report to stdout");
        }
        let file = File::create(path)
            .with_context(|| format!("creating report file {}", path.display()))?;
        self.write_to(BufWriter::new(file))
            .with_context(|| format!("writing report file {}", path.display()))
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{HEADER}")?;
        for row in &self.rows {
            writeln!(f, "{}\t{}", row.id, row.consumed)?;
        }
        Ok(())
    }
}
