use std::{thread, time::Duration};

use boundbuf::{BoundedBuffer, Item};
use tracing::{info, trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProducerSummary {
    pub published: u64,
    pub last_value: Option<Item>,
}

/// Publishes 1, 2, 3, ... into the buffer, sleeping `pace` before each value.
#[derive(Debug, Clone)]
pub struct Producer {
    next: Option<Item>,
    pace: Duration,
}

impl Producer {
    pub fn new(pace: Duration) -> Self {
        Self {
            next: Some(1),
            pace,
        }
    }

    pub fn starting_at(mut self, first: Item) -> Self {
        self.next = Some(first);
        self
    }

    pub fn run(mut self, buffer: &BoundedBuffer) -> ProducerSummary {
        info!("producer started");
        let mut summary = ProducerSummary::default();

        while !buffer.is_stopped() {
            let Some(value) = self.next else {
                warn!(last = ?summary.last_value, "value sequence exhausted, producer stopping");
                break;
            };

            if !self.pace.is_zero() {
                thread::sleep(self.pace);
            }
            if buffer.is_stopped() || buffer.publish(value).is_err() {
                break;
            }

            trace!(value, "produced");
            summary.published += 1;
            summary.last_value = Some(value);
            self.next = value.checked_add(1);
        }

        info!(published = summary.published, "producer stopped");
        summary
    }
}

#[cfg(test)]
mod test {
    use std::{thread, time::Duration};

    use boundbuf::BoundedBuffer;

    use super::{Producer, ProducerSummary};

    fn buffer(capacity: usize) -> BoundedBuffer {
        BoundedBuffer::new(capacity, Duration::from_millis(5)).unwrap()
    }

    #[test]
    fn counts_from_one() {
        let buf = buffer(3);
        let summary = thread::scope(|s| {
            let producer = s.spawn(|| Producer::new(Duration::ZERO).run(&buf));
            let taken: Vec<_> = (0..10).map(|_| buf.withdraw().unwrap()).collect();
            assert_eq!(taken, (1..=10).collect::<Vec<_>>());
            buf.request_stop();
            producer.join().unwrap()
        });

        let mut drained = 0;
        while buf.withdraw().is_ok() {
            drained += 1;
        }
        assert_eq!(summary.published, 10 + drained);
        assert_eq!(summary.last_value, Some(summary.published));
    }

    #[test]
    fn stopped_before_start() {
        let buf = buffer(2);
        buf.request_stop();
        let summary = Producer::new(Duration::from_millis(1)).run(&buf);
        assert_eq!(summary, ProducerSummary::default());
        assert!(buf.is_empty());
    }

    #[test]
    fn stops_at_end_of_sequence() {
        let buf = buffer(4);
        let summary = Producer::new(Duration::ZERO)
            .starting_at(u64::MAX - 1)
            .run(&buf);

        assert_eq!(summary.published, 2);
        assert_eq!(summary.last_value, Some(u64::MAX));
        assert!(!buf.is_stopped());
        assert_eq!(buf.withdraw(), Ok(u64::MAX - 1));
        assert_eq!(buf.withdraw(), Ok(u64::MAX));
    }
}
