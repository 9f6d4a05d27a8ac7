use std::{cell::UnsafeCell, mem::MaybeUninit, time::Duration};

use libc::{
    clock_gettime, sem_destroy, sem_getvalue, sem_init, sem_post, sem_t, sem_timedwait,
    sem_trywait, sem_wait, timespec, CLOCK_REALTIME, EAGAIN, EINTR, ETIMEDOUT,
};

use crate::{last_errno, CheckOk};

const NANOS_PER_SEC: i64 = 1_000_000_000;

/// Counting semaphore over an unnamed, process-private POSIX `sem_t`.
///
/// The `sem_t` sits in its own allocation so it never moves after `sem_init`.
#[derive(Debug)]
pub struct Semaphore {
    inner: Box<UnsafeCell<MaybeUninit<sem_t>>>,
}

impl Semaphore {
    pub fn new(value: u32) -> anyhow::Result<Self> {
        let inner: Box<UnsafeCell<MaybeUninit<sem_t>>> =
            Box::new(UnsafeCell::new(MaybeUninit::uninit()));
        unsafe { sem_init(inner.get().cast(), 0, value) }.r("sem_init")?;
        Ok(Self { inner })
    }

    fn raw(&self) -> *mut sem_t {
        self.inner.get().cast()
    }

    /// Blocks until a permit is available and takes it.
    pub fn wait(&self) {
        while unsafe { sem_wait(self.raw()) } != 0 {
            if last_errno() != Some(EINTR) {
                panic!("failed to wait for semaphore");
            }
        }
    }

    /// Takes a permit, waiting at most `timeout`. Returns `false` on timeout.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = deadline_after(timeout);
        loop {
            if unsafe { sem_timedwait(self.raw(), &deadline) } == 0 {
                return true;
            }
            match last_errno() {
                Some(ETIMEDOUT) => return false,
                Some(EINTR) => continue,
                e => panic!("failed to wait for semaphore: {e:?}"),
            }
        }
    }

    /// Takes a permit only if one is available right now.
    pub fn try_wait(&self) -> bool {
        loop {
            if unsafe { sem_trywait(self.raw()) } == 0 {
                return true;
            }
            match last_errno() {
                Some(EAGAIN) => return false,
                Some(EINTR) => continue,
                e => panic!("failed to try semaphore: {e:?}"),
            }
        }
    }

    pub fn post(&self) {
        if unsafe { sem_post(self.raw()) } != 0 {
            panic!("failed to post semaphore");
        }
    }

    /// Snapshot of the available permits.
    pub fn value(&self) -> usize {
        let mut value: i32 = 0;
        if unsafe { sem_getvalue(self.raw(), &raw mut value) } != 0 {
            panic!("failed to read semaphore value");
        }
        // Linux reports 0 rather than the number of waiters.
        value.max(0) as usize
    }
}

unsafe impl Send for Semaphore {}
unsafe impl Sync for Semaphore {}

impl Drop for Semaphore {
    fn drop(&mut self) {
        let res = unsafe { sem_destroy(self.raw()) };
        debug_assert_eq!(res, 0, "failed to destroy semaphore");
    }
}

/// Absolute `CLOCK_REALTIME` deadline, as `sem_timedwait` expects.
fn deadline_after(timeout: Duration) -> timespec {
    let mut now = MaybeUninit::<timespec>::uninit();
    if unsafe { clock_gettime(CLOCK_REALTIME, now.as_mut_ptr()) } != 0 {
        panic!("failed to read realtime clock");
    }
    let mut ts = unsafe { now.assume_init() };

    let mut sec = (ts.tv_sec as i64).saturating_add(timeout.as_secs() as i64);
    let mut nsec = ts.tv_nsec as i64 + i64::from(timeout.subsec_nanos());
    if nsec >= NANOS_PER_SEC {
        nsec -= NANOS_PER_SEC;
        sec = sec.saturating_add(1);
    }

    ts.tv_sec = sec as _;
    ts.tv_nsec = nsec as _;
    ts
}
