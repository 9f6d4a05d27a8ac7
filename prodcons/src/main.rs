use std::{
    process::exit,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use anyhow::Context;
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

pub mod cli;
pub mod config;
pub mod consumer;
pub mod lifecycle;
pub mod producer;
pub mod report;

use cli::Args;
use config::Config;
use report::Report;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "prodcons=info,boundbuf=info".into()),
        )
        .init();

    let config = Config::try_from(Args::parse())?;

    let (interrupt_tx, interrupt) = crossbeam_channel::bounded(1);
    let exit_signal = Arc::new(AtomicBool::new(false));
    let e = exit_signal.clone();
    ctrlc::set_handler(move || {
        if e.swap(true, Ordering::Relaxed) {
            warn!("Killing");
            exit(1);
        } else {
            warn!("CTRL-C received, stopping (press again to kill)");
            let _ = interrupt_tx.try_send(());
        }
    })
    .context("installing Ctrl-C handler")?;

    info!(
        consumers = config.consumers,
        capacity = config.capacity,
        pace = ?config.pace,
        run_for = ?config.run_for,
        "starting producer and consumers"
    );

    let summary = lifecycle::run(&config, &interrupt).inspect_err(|e| error!("{e:#}"))?;

    let report = Report::new(summary.tallies);
    match report.save(&config.output) {
        Ok(()) => info!(
            path = %config.output.display(),
            consumed = report.total(),
            "report written"
        ),
        Err(e) => {
            error!(path = %config.output.display(), "{e:#}, printing report instead");
            print!("{report}");
        }
    }

    Ok(())
}
