//! Signal-safe CPU sample recording.
//!
//! A periodic interrupt (usually `SIGPROF`) calls into the [`Profiler`] with
//! the stack of the interrupted thread. The profiler appends it to a bounded
//! log without allocating or blocking, and an ordinary thread drains the log
//! and hands the records to a formatter. When the log or the overflow buffer
//! cannot keep up, samples are counted instead, and the counts end up in the
//! profile as lost-samples records.
//!
//! ## Example
//!
//! Record a sample by hand and read the profile back.
//!
//! ```rust
//! use cpuprof::config::Opts;
//! use cpuprof::record::{Parser, Record};
//! use cpuprof::timer::Manual;
//! use cpuprof::{nanotime, Profiler};
//!
//! let profiler = Profiler::new(Manual);
//!
//! let mut opts = Opts::default();
//! opts.hz = 250;
//! profiler.start(&opts).unwrap();
//!
//! // Normally called from the signal handler with the unwound stack.
//! profiler.record(None, nanotime(), &[0x1000, 0x2000]);
//!
//! profiler.stop();
//!
//! let mut parser = Parser::new();
//! loop {
//!     let samples = profiler.read().unwrap();
//!     for raw in samples.records() {
//!         match parser.parse(&raw) {
//!             Record::Rate(hz) => assert_eq!(hz, 250),
//!             Record::Sample(s) => assert_eq!(s.stack.as_slice(), &[0x1000, 0x2000]),
//!             Record::Lost { reason, count } => println!("lost {} ({:?})", count, reason),
//!         }
//!     }
//!     if samples.eof {
//!         break;
//!     }
//! }
//! ```
//!
//! ## Signal handlers
//!
//! The process-wide [`PROFILER`] is armed with [`ITimer`][timer::ITimer],
//! which delivers `SIGPROF`. Its handler must only call the async-signal-safe
//! entry points: [`Profiler::record`], [`Profiler::record_without_context`],
//! [`Profiler::record_busy`] and [`nanotime`].

pub mod config;
pub mod error;
pub mod event;
mod ffi;
pub mod profiler;
pub mod rb;
pub mod record;
pub mod sync;
pub mod timer;

pub use error::{Error, Result};
pub use ffi::nanotime;
pub use profiler::Profiler;
pub use rb::{Samples, Tag};

/// Deepest stack kept per sample.
pub const MAX_STACK: usize = 64;

// Header words per log record: the sample count, or the rate for the first.
pub(crate) const HDR_SIZE: usize = 1;

/// The process-wide profiler, driven by `SIGPROF`.
pub static PROFILER: Profiler<timer::ITimer> = Profiler::new(timer::ITimer);
