use std::io::{ErrorKind, Result};

use libc::{c_int, itimerval, timeval};

use super::Timer;
use crate::config::Opts;
use crate::ffi::syscall::setitimer;

/// Process CPU-time interval timer (`ITIMER_PROF`), delivering `SIGPROF`.
///
/// A `SIGPROF` handler must be installed before profiling starts, since the
/// default action terminates the process. Only [`CpuEvent::OsTimer`] is
/// supported.
///
/// [`CpuEvent::OsTimer`]: crate::event::CpuEvent::OsTimer
#[derive(Clone, Copy, Debug, Default)]
pub struct ITimer;

impl ITimer {
    fn set(usec: i64) -> Result<()> {
        let tv = timeval {
            tv_sec: (usec / 1_000_000) as _,
            tv_usec: (usec % 1_000_000) as _,
        };
        let val = itimerval {
            it_interval: tv,
            it_value: tv,
        };
        setitimer(libc::ITIMER_PROF, &val)
    }
}

impl Timer for ITimer {
    fn arm(&self, opts: &Opts, hz: u32) -> Result<()> {
        if opts.event.is_pmu() {
            return Err(ErrorKind::Unsupported.into());
        }
        if hz == 0 {
            return self.disarm();
        }
        Self::set(1_000_000 / hz as i64)
    }

    fn disarm(&self) -> Result<()> {
        Self::set(0)
    }

    fn signal(&self) -> Option<c_int> {
        Some(libc::SIGPROF)
    }
}
