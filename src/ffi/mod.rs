use libc::{c_int, sigset_t};

pub mod syscall;

/// Monotonic clock in nanoseconds.
///
/// Safe to call from a signal handler. Returns 0 if the clock cannot be read,
/// which consumers already treat as "not precisely timed".
#[inline]
pub fn nanotime() -> u64 {
    match syscall::clock_gettime(libc::CLOCK_MONOTONIC) {
        Ok(ts) => ts.tv_sec as u64 * 1_000_000_000 + ts.tv_nsec as u64,
        Err(_) => 0,
    }
}

/// Blocks a signal on the current thread until dropped.
pub struct SigBlock(Option<sigset_t>);

impl SigBlock {
    pub fn new(signum: Option<c_int>) -> Self {
        let Some(signum) = signum else {
            return Self(None);
        };
        // Failing to block is not fatal: the guard simply restores nothing.
        let old = syscall::sigset_of(signum)
            .and_then(|set| syscall::pthread_sigmask(libc::SIG_BLOCK, &set));
        Self(old.ok())
    }
}

impl Drop for SigBlock {
    fn drop(&mut self) {
        if let Some(old) = &self.0 {
            let _ = syscall::pthread_sigmask(libc::SIG_SETMASK, old);
        }
    }
}
