//! Semaphore-guarded circular buffer shared by one producer and many consumers.
//!
//! `empty` counts free slots, `filled` counts items ready to be taken. A task
//! always takes its permit first, then the gate, then releases the gate and
//! posts the other semaphore. The gate is never held across a semaphore wait.
//!
//! Waits are bounded by the poll interval so that a blocked task notices
//! [`BoundedBuffer::request_stop`] without being cancelled from outside.

use std::{
    sync::atomic::{AtomicBool, Ordering},
    time::Duration,
};

use anyhow::{ensure, Context};
use thiserror::Error;
use tracing::{debug, trace};

use crate::{
    ring::{Item, Ring},
    sync::{Mutex, Semaphore},
};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Returned once the buffer has been stopped and the call cannot proceed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("bounded buffer is stopped")]
pub struct Stopped;

#[derive(Debug)]
struct Cursors {
    ring: Ring,
    write: usize,
    read: usize,
    filled: usize,
}

#[derive(Debug)]
pub struct BoundedBuffer {
    empty: Semaphore,
    filled: Semaphore,
    gate: Mutex<Cursors>,
    stopped: AtomicBool,
    poll: Duration,
}

impl BoundedBuffer {
    pub fn new(capacity: usize, poll: Duration) -> anyhow::Result<Self> {
        ensure!(capacity > 0, "buffer capacity must be at least 1");
        ensure!(!poll.is_zero(), "poll interval must be non-zero");

        let permits = u32::try_from(capacity).context("buffer capacity out of semaphore range")?;
        let empty = Semaphore::new(permits).context("initializing empty-slots semaphore")?;
        let filled = Semaphore::new(0).context("initializing filled-slots semaphore")?;
        let gate = Mutex::new(Cursors {
            ring: Ring::new(capacity),
            write: 0,
            read: 0,
            filled: 0,
        })
        .context("initializing buffer gate")?;

        Ok(Self {
            empty,
            filled,
            gate,
            stopped: AtomicBool::new(false),
            poll,
        })
    }

    /// Appends `value`, waiting for a free slot.
    ///
    /// Refused once a stop was requested. The stop flag is checked again under
    /// the gate, so nothing is written after `request_stop` returns.
    pub fn publish(&self, value: Item) -> Result<(), Stopped> {
        loop {
            if self.is_stopped() {
                return Err(Stopped);
            }
            if self.empty.wait_timeout(self.poll) {
                break;
            }
        }

        let mut gate = self.gate.lock();
        if self.is_stopped() {
            drop(gate);
            self.empty.post();
            return Err(Stopped);
        }
        let slot = gate.write;
        gate.ring.write(slot, value);
        gate.write = gate.ring.next(slot);
        gate.filled += 1;
        drop(gate);

        self.filled.post();
        trace!(value, slot, "published");
        Ok(())
    }

    /// Takes the oldest item, waiting for one to arrive.
    ///
    /// After a stop this keeps handing out items until the buffer is empty,
    /// then returns [`Stopped`].
    pub fn withdraw(&self) -> Result<Item, Stopped> {
        while !self.filled.wait_timeout(self.poll) {
            if self.is_stopped() && self.len() == 0 {
                return Err(Stopped);
            }
        }

        let mut gate = self.gate.lock();
        let slot = gate.read;
        let value = gate.ring.read(slot);
        gate.ring.clear(slot);
        gate.read = gate.ring.next(slot);
        gate.filled -= 1;
        drop(gate);

        self.empty.post();
        trace!(value, slot, "withdrawn");
        Ok(value)
    }

    pub fn request_stop(&self) {
        let _gate = self.gate.lock();
        if !self.stopped.swap(true, Ordering::AcqRel) {
            debug!("stop requested");
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    pub fn capacity(&self) -> usize {
        self.gate.lock().ring.capacity()
    }

    /// Items written and not yet taken.
    pub fn len(&self) -> usize {
        self.gate.lock().filled
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn empty_slots(&self) -> usize {
        self.empty.value()
    }

    pub fn filled_slots(&self) -> usize {
        self.filled.value()
    }
}
