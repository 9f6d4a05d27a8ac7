use std::{
    cell::UnsafeCell,
    mem::MaybeUninit,
    ops::{Deref, DerefMut},
};

use libc::{
    pthread_mutex_destroy, pthread_mutex_init, pthread_mutex_lock, pthread_mutex_t,
    pthread_mutex_unlock, pthread_mutexattr_destroy, pthread_mutexattr_init,
};

use crate::CheckOk;

/// Mutual-exclusion gate over a process-private `pthread_mutex_t`.
#[derive(Debug)]
pub struct Mutex<T> {
    inner: Box<UnsafeCell<MaybeUninit<pthread_mutex_t>>>,
    data: UnsafeCell<T>,
}

impl<T> Mutex<T> {
    pub fn new(data: T) -> anyhow::Result<Self> {
        let inner: Box<UnsafeCell<MaybeUninit<pthread_mutex_t>>> =
            Box::new(UnsafeCell::new(MaybeUninit::uninit()));
        let mut attr = MaybeUninit::uninit();
        unsafe {
            pthread_mutexattr_init(attr.as_mut_ptr()).r("attr_init")?;
            let res = pthread_mutex_init(inner.get().cast(), attr.as_ptr());
            pthread_mutexattr_destroy(attr.as_mut_ptr());
            res.r("mutex_init")?;
        }

        Ok(Self {
            inner,
            data: UnsafeCell::new(data),
        })
    }

    fn raw(&self) -> *mut pthread_mutex_t {
        self.inner.get().cast()
    }

    pub fn lock(&self) -> MutexGuard<'_, T> {
        unsafe {
            if pthread_mutex_lock(self.raw()) != 0 {
                panic!("failed to lock mutex");
            }
            MutexGuard {
                lock: self,
                data: &mut *self.data.get(),
            }
        }
    }
}

pub struct MutexGuard<'a, T: 'a> {
    lock: &'a Mutex<T>,
    data: &'a mut T,
}

impl<T> Deref for MutexGuard<'_, T> {
    type Target = T;
    fn deref(&self) -> &T {
        self.data
    }
}

impl<T> DerefMut for MutexGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        self.data
    }
}

impl<T> Drop for MutexGuard<'_, T> {
    fn drop(&mut self) {
        if unsafe { pthread_mutex_unlock(self.lock.raw()) } != 0 {
            panic!("failed to unlock mutex");
        }
    }
}

unsafe impl<T: Send> Send for Mutex<T> {}
unsafe impl<T: Send> Sync for Mutex<T> {}

impl<T> Drop for Mutex<T> {
    fn drop(&mut self) {
        let res = unsafe { pthread_mutex_destroy(self.raw()) };
        debug_assert_eq!(res, 0, "failed to destroy mutex");
    }
}
