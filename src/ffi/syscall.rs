use std::io::{Error, Result};
use std::mem::MaybeUninit;
use std::ptr::{null, null_mut};
use std::sync::atomic::AtomicU32;

use libc::{c_int, itimerval, sigset_t, timespec};

// All wrappers below are async-signal-safe: they are thin syscalls with
// no allocation and no locking, so the interrupt path may call them.

pub fn clock_gettime(clock: libc::clockid_t) -> Result<timespec> {
    let mut ts = MaybeUninit::<timespec>::uninit();
    let result = unsafe { libc::clock_gettime(clock, ts.as_mut_ptr()) };
    if result != -1 {
        Ok(unsafe { ts.assume_init() })
    } else {
        Err(Error::last_os_error())
    }
}

pub fn sched_yield() {
    // `sched_yield` always succeeds on Linux.
    unsafe { libc::sched_yield() };
}

pub fn futex_wait(word: &AtomicU32, expected: u32) -> Result<()> {
    let result = unsafe {
        libc::syscall(
            libc::SYS_futex,
            word.as_ptr(),
            libc::FUTEX_WAIT | libc::FUTEX_PRIVATE_FLAG,
            expected,
            null::<timespec>(),
        )
    };
    if result != -1 {
        Ok(())
    } else {
        Err(Error::last_os_error())
    }
}

pub fn futex_wake(word: &AtomicU32, waiters: i32) -> Result<i32> {
    let result = unsafe {
        libc::syscall(
            libc::SYS_futex,
            word.as_ptr(),
            libc::FUTEX_WAKE | libc::FUTEX_PRIVATE_FLAG,
            waiters,
        )
    };
    if result != -1 {
        Ok(result as _)
    } else {
        Err(Error::last_os_error())
    }
}

pub fn setitimer(which: c_int, value: &itimerval) -> Result<()> {
    let result = unsafe { libc::setitimer(which, value as _, null_mut()) };
    if result != -1 {
        Ok(())
    } else {
        Err(Error::last_os_error())
    }
}

pub fn pthread_sigmask(how: c_int, set: &sigset_t) -> Result<sigset_t> {
    let mut old = MaybeUninit::<sigset_t>::uninit();
    // Returns the error number directly instead of setting `errno`.
    let result = unsafe { libc::pthread_sigmask(how, set as _, old.as_mut_ptr()) };
    if result == 0 {
        Ok(unsafe { old.assume_init() })
    } else {
        Err(Error::from_raw_os_error(result))
    }
}

pub fn sigset_of(signum: c_int) -> Result<sigset_t> {
    let mut set = MaybeUninit::<sigset_t>::uninit();
    unsafe {
        if libc::sigemptyset(set.as_mut_ptr()) == -1 {
            return Err(Error::last_os_error());
        }
        if libc::sigaddset(set.as_mut_ptr(), signum) == -1 {
            return Err(Error::last_os_error());
        }
        Ok(set.assume_init())
    }
}
