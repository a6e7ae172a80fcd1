//! Interrupt sources.
//!
//! A [`Timer`] arms and disarms whatever delivers the sampling interrupts.
//! The interrupt handler itself (which walks the stack and calls
//! [`Profiler::record`][crate::Profiler::record]) belongs to the caller.

use std::io::Result;

use libc::c_int;

use crate::config::Opts;

mod itimer;

pub use itimer::ITimer;

pub trait Timer: Send + Sync {
    /// Starts delivering interrupts at about `hz` per second.
    ///
    /// `hz` is already clamped and non-zero.
    fn arm(&self, opts: &Opts, hz: u32) -> Result<()>;

    /// Stops delivering interrupts.
    ///
    /// Must be safe to call without any profiler lock held, and more than once.
    fn disarm(&self) -> Result<()>;

    /// The signal that carries the interrupts, if any.
    ///
    /// It is blocked on the current thread while ordinary code holds the
    /// lock shared with the interrupt path.
    fn signal(&self) -> Option<c_int> {
        None
    }
}

/// A timer that arms nothing.
///
/// The caller delivers interrupts itself, e.g. from a foreign event source
/// or by calling the record functions directly.
#[derive(Clone, Copy, Debug, Default)]
pub struct Manual;

impl Timer for Manual {
    fn arm(&self, _: &Opts, _: u32) -> Result<()> {
        Ok(())
    }

    fn disarm(&self) -> Result<()> {
        Ok(())
    }
}
