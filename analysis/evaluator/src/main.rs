use std::{env, io::Read};

use anyhow::{bail, ensure, Context};

#[derive(Debug, serde::Deserialize)]
struct Record {
    #[serde(rename = "Consumer ID")]
    id: usize,
    #[serde(rename = "Times Consumed")]
    consumed: u64,
}

#[derive(Debug, PartialEq)]
struct Summary {
    consumers: usize,
    total: u64,
    min: u64,
    max: u64,
}

impl Summary {
    /// Busiest consumer relative to the idlest one.
    fn spread(&self) -> Option<f64> {
        (self.min > 0).then(|| self.max as f64 / self.min as f64)
    }
}

fn main() -> anyhow::Result<()> {
    let paths: Vec<String> = env::args().skip(1).collect();
    if paths.is_empty() {
        bail!("usage: evaluator <report.tsv>...");
    }

    println!("--- Summary ---");
    for path in &paths {
        let records = load_report(path)?;
        let summary = summarize(&records).with_context(|| format!("invalid report {path}"))?;

        println!();
        println!("{path}");
        println!("  consumers: {}", summary.consumers);
        println!("  consumed:  {}", summary.total);
        println!("  per consumer: min {} / max {}", summary.min, summary.max);
        match summary.spread() {
            Some(spread) => println!("  spread: {spread:.02}x"),
            None => println!("  spread: n/a (idle consumer)"),
        }
    }
    Ok(())
}

fn load_report(path: &str) -> anyhow::Result<Vec<Record>> {
    let file = std::fs::File::open(path).with_context(|| format!("opening {path}"))?;
    parse_report(file).with_context(|| format!("parsing {path}"))
}

fn parse_report(input: impl Read) -> anyhow::Result<Vec<Record>> {
    let mut reader = csv::ReaderBuilder::new().delimiter(b'\t').from_reader(input);
    let list: Result<Vec<Record>, _> = reader.deserialize().collect();
    Ok(list?)
}

fn summarize(records: &[Record]) -> anyhow::Result<Summary> {
    ensure!(!records.is_empty(), "report has no consumer rows");
    for (index, record) in records.iter().enumerate() {
        ensure!(
            record.id == index + 1,
            "expected consumer {} on row {}, found {}",
            index + 1,
            index + 1,
            record.id
        );
    }

    let counts = records.iter().map(|r| r.consumed);
    Ok(Summary {
        consumers: records.len(),
        total: counts.clone().sum(),
        min: counts.clone().min().unwrap_or_default(),
        max: counts.max().unwrap_or_default(),
    })
}
