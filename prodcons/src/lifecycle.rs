use std::{
    thread::{self, ScopedJoinHandle},
    time::{Duration, Instant},
};

use anyhow::{anyhow, Context};
use boundbuf::BoundedBuffer;
use crossbeam_channel::{never, select, tick, Receiver};
use tracing::{info, warn};

use crate::{
    config::Config,
    consumer::{self, ConsumerId, Tally},
    producer::{Producer, ProducerSummary},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Deadline,
    Interrupted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub elapsed: Duration,
    pub reason: StopReason,
    pub produced: ProducerSummary,
    /// One entry per consumer, ascending by id.
    pub tallies: Vec<Tally>,
    /// Items still in the buffer after every task was joined.
    pub leftover: usize,
}

impl RunSummary {
    pub fn consumed(&self) -> u64 {
        self.tallies.iter().map(|t| t.consumed).sum()
    }
}

/// Runs one producer and `config.consumers` consumers until `config.run_for`
/// has elapsed or a message arrives on `interrupt`, then stops and joins them.
pub fn run(config: &Config, interrupt: &Receiver<()>) -> anyhow::Result<RunSummary> {
    config.validate()?;
    let buffer = BoundedBuffer::new(config.capacity, config.poll)
        .context("initializing bounded buffer")?;
    let buffer = &buffer;
    let started = Instant::now();

    let (reason, produced, tallies) = thread::scope(|s| {
        let mut consumers = Vec::with_capacity(config.consumers);
        for index in 0..config.consumers {
            let id = ConsumerId::nth(index);
            let handle = thread::Builder::new()
                .name(format!("consumer-{id}"))
                .spawn_scoped(s, move || consumer::consume(id, buffer));
            match handle {
                Ok(handle) => consumers.push((id, handle)),
                Err(e) => {
                    buffer.request_stop();
                    return Err(e).with_context(|| format!("spawning consumer {id}"));
                }
            }
        }

        let producer = Producer::new(config.pace);
        let producer = match thread::Builder::new()
            .name("producer".into())
            .spawn_scoped(s, move || producer.run(buffer))
        {
            Ok(handle) => handle,
            Err(e) => {
                buffer.request_stop();
                return Err(e).context("spawning producer");
            }
        };

        let reason = wait_for_stop(started, config.run_for, config.poll, interrupt);
        info!(?reason, elapsed = ?started.elapsed(), "stopping tasks");
        buffer.request_stop();

        let produced = join("producer", producer);
        let tallies: Vec<_> = consumers
            .into_iter()
            .map(|(id, handle)| join(&format!("consumer {id}"), handle))
            .collect();
        let tallies = tallies.into_iter().collect::<anyhow::Result<Vec<_>>>()?;

        anyhow::Ok((reason, produced?, tallies))
    })?;

    let summary = RunSummary {
        elapsed: started.elapsed(),
        reason,
        produced,
        tallies,
        leftover: buffer.len(),
    };
    if summary.leftover > 0 {
        warn!(leftover = summary.leftover, "items left in buffer after shutdown");
    }
    info!(
        elapsed = ?summary.elapsed,
        produced = summary.produced.published,
        last_value = ?summary.produced.last_value,
        consumed = summary.consumed(),
        "all tasks joined"
    );
    Ok(summary)
}

fn wait_for_stop(
    started: Instant,
    run_for: Duration,
    poll: Duration,
    interrupt: &Receiver<()>,
) -> StopReason {
    let ticker = tick(poll);
    let mut interrupt = interrupt.clone();
    loop {
        if started.elapsed() >= run_for {
            return StopReason::Deadline;
        }
        let interrupted = select! {
            recv(ticker) -> _ => None,
            recv(interrupt) -> msg => Some(msg.is_ok()),
        };
        match interrupted {
            Some(true) => return StopReason::Interrupted,
            // Sender gone, nobody can interrupt anymore.
            Some(false) => interrupt = never(),
            None => {}
        }
    }
}

fn join<T>(task: &str, handle: ScopedJoinHandle<'_, T>) -> anyhow::Result<T> {
    handle.join().map_err(|_| anyhow!("{task} task panicked"))
}

#[cfg(test)]
mod test {
    use std::{
        thread,
        time::{Duration, Instant},
    };

    use crossbeam_channel::{bounded, never};

    use super::{run, StopReason};
    use crate::{config::Config, consumer::ConsumerId, report::Report};

    fn quick(consumers: usize, capacity: usize, run_for: Duration) -> Config {
        Config {
            consumers,
            capacity,
            pace: Duration::ZERO,
            run_for,
            poll: Duration::from_millis(5),
            ..Config::default()
        }
    }

    #[test]
    fn five_consumers_account_for_every_item() {
        let summary = run(&quick(5, 5, Duration::from_millis(300)), &never()).unwrap();

        assert_eq!(summary.reason, StopReason::Deadline);
        assert!(summary.consumed() > 0);
        assert_eq!(summary.consumed(), summary.produced.published);
        assert_eq!(summary.leftover, 0);

        let ids: Vec<_> = summary.tallies.iter().map(|t| t.id).collect();
        assert_eq!(ids, (0..5).map(ConsumerId::nth).collect::<Vec<_>>());

        let report = Report::new(summary.tallies.clone()).to_string();
        let rows: Vec<_> = report
            .lines()
            .skip(1)
            .map(|l| l.split('\t').next().unwrap())
            .collect();
        assert_eq!(rows, vec!["1", "2", "3", "4", "5"]);
    }

    #[test]
    fn paced_producer_with_single_slot() {
        let mut config = quick(2, 1, Duration::from_millis(200));
        config.pace = Duration::from_millis(2);
        let summary = run(&config, &never()).unwrap();

        assert!(summary.produced.published > 0);
        assert_eq!(summary.consumed(), summary.produced.published);
        assert_eq!(summary.produced.last_value, Some(summary.produced.published));
    }

    #[test]
    fn interrupt_stops_early() {
        let (tx, rx) = bounded(1);
        let started = Instant::now();
        let summary = thread::scope(|s| {
            let handle = s.spawn(|| run(&quick(3, 2, Duration::from_secs(60)), &rx));
            thread::sleep(Duration::from_millis(50));
            tx.send(()).unwrap();
            handle.join().unwrap()
        })
        .unwrap();

        assert_eq!(summary.reason, StopReason::Interrupted);
        assert!(started.elapsed() < Duration::from_secs(10));
        assert_eq!(summary.consumed(), summary.produced.published);
    }

    #[test]
    fn dropped_interrupt_sender_is_ignored() {
        let (tx, rx) = bounded::<()>(1);
        drop(tx);
        let summary = run(&quick(1, 1, Duration::from_millis(50)), &rx).unwrap();
        assert_eq!(summary.reason, StopReason::Deadline);
    }

    #[test]
    fn invalid_config_fails_before_start() {
        assert!(run(&quick(0, 5, Duration::from_millis(10)), &never()).is_err());
        assert!(run(&quick(1, 0, Duration::from_millis(10)), &never()).is_err());
    }
}
