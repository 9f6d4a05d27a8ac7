use std::io;

use anyhow::Context;
use libc::c_int;

pub mod bounded;
pub mod ring;
pub mod sync;

pub use bounded::{BoundedBuffer, Stopped, DEFAULT_POLL_INTERVAL};
pub use ring::{Item, Ring};

/// Turns a POSIX return code into an error naming the failed operation.
///
/// `pthread_*` calls report the error number directly, `sem_*` calls return
/// `-1` and leave it in `errno`. Both shapes are handled.
pub trait CheckOk<R> {
    fn r(self, op: &str) -> Result<R, anyhow::Error>;
}

impl CheckOk<()> for c_int {
    fn r(self, op: &str) -> Result<(), anyhow::Error> {
        let err = match self {
            0 => return Ok(()),
            -1 => io::Error::last_os_error(),
            code => io::Error::from_raw_os_error(code),
        };
        Err(err).with_context(|| format!("Operation {op} failed"))
    }
}

pub(crate) fn last_errno() -> Option<c_int> {
    io::Error::last_os_error().raw_os_error()
}
