mod mutex;
mod semaphore;

pub use mutex::*;
pub use semaphore::*;
