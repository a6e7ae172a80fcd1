use spin::mutex::SpinMutex;
use spin::relax::RelaxStrategy;

use crate::ffi::syscall::sched_yield;

#[cfg(test)]
mod test;

/// Gives the CPU away between lock attempts.
///
/// Unlike parking on an OS primitive, `sched_yield` is async-signal-safe.
pub struct SchedYield;

impl RelaxStrategy for SchedYield {
    #[inline]
    fn relax() {
        sched_yield();
    }
}

/// Lock shared between ordinary code and the interrupt handler.
///
/// It is not reentrant: a thread that holds the lock must not be
/// interrupted by a handler that takes it again, otherwise the handler spins
/// forever. Callers in ordinary context block the sampling signal while they
/// hold it; within handlers the signal is not redelivered until return.
pub type SpinLock<T> = SpinMutex<T, SchedYield>;
