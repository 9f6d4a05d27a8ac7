use std::{fmt, num::NonZeroUsize};

use boundbuf::BoundedBuffer;
use tracing::{info, trace};

/// 1-based consumer identity, as shown in the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConsumerId(NonZeroUsize);

impl ConsumerId {
    /// Identity of the consumer at zero-based pool position `index`.
    pub fn nth(index: usize) -> Self {
        Self(NonZeroUsize::MIN.saturating_add(index))
    }
}

impl fmt::Display for ConsumerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tally {
    pub id: ConsumerId,
    pub consumed: u64,
}

/// Withdraws items until the buffer is stopped and drained.
pub fn consume(id: ConsumerId, buffer: &BoundedBuffer) -> Tally {
    info!(consumer = %id, "consumer started");

    let mut consumed = 0u64;
    while let Ok(value) = buffer.withdraw() {
        consumed += 1;
        trace!(consumer = %id, value, "consumed");
    }

    info!(consumer = %id, consumed, "consumer stopped");
    Tally { id, consumed }
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use boundbuf::BoundedBuffer;

    use super::{consume, ConsumerId, Tally};

    #[test]
    fn ids_are_one_based() {
        assert_eq!(ConsumerId::nth(0).to_string(), "1");
        assert_eq!(ConsumerId::nth(4).to_string(), "5");
        assert!(ConsumerId::nth(1) < ConsumerId::nth(2));
    }

    #[test]
    fn counts_everything_published_before_stop() {
        let buf = BoundedBuffer::new(4, Duration::from_millis(5)).unwrap();
        for value in 1..=4 {
            buf.publish(value).unwrap();
        }
        buf.request_stop();

        let id = ConsumerId::nth(2);
        assert_eq!(consume(id, &buf), Tally { id, consumed: 4 });
        assert!(buf.is_empty());
    }
}
