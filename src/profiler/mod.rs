use std::mem;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{debug, error, warn};
use recorder::{flush, Extra, Recorder};

use crate::config::Opts;
use crate::error::{Error, Result};
use crate::ffi::{nanotime, SigBlock};
use crate::rb::{self, Mode, Reader, Samples, Tag};
use crate::sync::SpinLock;
use crate::timer::Timer;
use crate::{HDR_SIZE, MAX_STACK};

mod recorder;
mod stream;

pub use stream::SampleStream;

struct Session {
    active: bool,
    // Kept after stopping until the reader has seen end-of-stream.
    reader: Option<Arc<Reader>>,
}

/// CPU profiler.
///
/// The interrupt handler calls [`record`][Self::record] (or one of its
/// siblings) with the stack of the interrupted thread, while an ordinary
/// thread calls [`read`][Self::read] in a loop to collect the profile.
///
/// Only one profile can be recorded at a time: a new one cannot start until
/// the previous one has been read to end-of-stream.
pub struct Profiler<T> {
    session: Mutex<Session>,
    recorder: SpinLock<Recorder>,
    // Updated without the spin lock, so an interrupt that cannot take it
    // can still be counted.
    lost_busy: AtomicU64,
    timer: T,
}

impl<T> Profiler<T> {
    pub const fn new(timer: T) -> Self {
        Self {
            session: Mutex::new(Session {
                active: false,
                reader: None,
            }),
            recorder: SpinLock::new(Recorder::new()),
            lost_busy: AtomicU64::new(0),
            timer,
        }
    }

    pub fn timer(&self) -> &T {
        &self.timer
    }

    pub fn is_active(&self) -> bool {
        self.session().active
    }

    fn session(&self) -> MutexGuard<'_, Session> {
        // Nothing panics while holding the lock with the session half updated.
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn finish(&self, reader: &Arc<Reader>) {
        let mut session = self.session();
        if session
            .reader
            .as_ref()
            .is_some_and(|it| Arc::ptr_eq(it, reader))
        {
            session.reader = None;
            debug!("cpu profile fully read");
        }
    }
}

impl<T: Timer> Profiler<T> {
    /// Starts profiling.
    ///
    /// Allocates the log and the overflow buffer, writes the rate header
    /// and arms the timer.
    pub fn start(&self, opts: &Opts) -> Result<()> {
        let hz = opts.clamped_hz();
        if hz == 0 {
            return Err(Error::InvalidRate(opts.hz));
        }

        let mut session = self.session();
        if session.active || session.reader.is_some() {
            warn!("cannot set cpu profile rate until previous profile has finished");
            return Err(Error::AlreadyActive);
        }

        let buffer = &opts.buffer;
        let (mut writer, reader) = rb::open(HDR_SIZE, buffer.data_words, buffer.tag_slots)?;
        writer.write(None, nanotime(), &[hz as u64], &[]);

        self.lost_busy.store(0, Ordering::Relaxed);
        let extra = Extra::with_capacity(buffer.extra_words);
        let old = self.with_recorder(|rec| {
            rec.writer = Some(writer);
            mem::replace(&mut rec.extra, extra)
        });
        drop(old);

        if let Err(e) = self.timer.arm(opts, hz) {
            let writer = self.with_recorder(|rec| rec.writer.take());
            drop(writer);
            return Err(Error::Timer(e));
        }

        session.active = true;
        session.reader = Some(Arc::new(reader));
        debug!("cpu profiling started at {} Hz", hz);
        Ok(())
    }

    /// Stops profiling.
    ///
    /// The timer is disarmed first, then pending overflow stacks and loss
    /// counts are written and the log is closed. Records already in the log
    /// stay readable until [`read`][Self::read] reports end-of-stream.
    pub fn stop(&self) {
        if !self.session().active {
            debug!("cpu profiling is not active");
            return;
        }

        // Not under the session lock: the timer serializes itself, and an
        // interrupt delivered meanwhile may still complete its record.
        if let Err(e) = self.timer.disarm() {
            error!("failed to disarm profiling timer: {}", e);
        }

        let mut session = self.session();
        if !session.active {
            return;
        }
        session.active = false;

        let (writer, mut extra) =
            self.with_recorder(|rec| (rec.writer.take(), mem::take(&mut rec.extra)));
        if let Some(mut writer) = writer {
            flush(&mut writer, &mut extra, &self.lost_busy);
            writer.close();
        }
        debug!("cpu profiling stopped");
    }

    /// Records a sample from the interrupt handler.
    ///
    /// Async-signal-safe. Stacks deferred by
    /// [`record_without_context`][Self::record_without_context] and pending
    /// loss counts are written first. Stacks longer than [`MAX_STACK`] are
    /// truncated.
    ///
    /// Returns `false` if profiling is off or the log is full.
    pub fn record(&self, tag: Option<Tag>, timestamp: u64, stack: &[usize]) -> bool {
        let mut rec = self.recorder.lock();
        let Recorder { writer, extra } = &mut *rec;
        let Some(writer) = writer else {
            return false;
        };

        if extra.is_pending() || self.lost_busy.load(Ordering::Relaxed) > 0 {
            flush(writer, extra, &self.lost_busy);
        }
        let stack = &stack[..stack.len().min(MAX_STACK)];
        writer.write(tag, timestamp, &[1], stack)
    }

    /// Records a sample from a thread that cannot write to the log.
    ///
    /// Async-signal-safe and uses almost no stack. The stack is kept in the
    /// overflow buffer until the next [`record`][Self::record] or
    /// [`stop`][Self::stop]; if it does not fit, it is counted as lost.
    pub fn record_without_context(&self, stack: &[usize]) -> bool {
        let mut rec = self.recorder.lock();
        if rec.writer.is_none() {
            return false;
        }
        rec.extra.push(&stack[..stack.len().min(MAX_STACK)])
    }

    /// Counts a sample the interrupted thread could not record safely.
    ///
    /// Async-signal-safe and lock-free.
    pub fn record_busy(&self) {
        self.lost_busy.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the next records of the profile, waiting until there are some.
    ///
    /// Once profiling has stopped and everything has been read, returns an
    /// empty [`Samples`] with `eof` set and releases the log, after which a
    /// new profile may start. Fails with [`Error::Inactive`] if there is
    /// nothing to read.
    pub fn read(&self) -> Result<Samples> {
        let reader = self.session().reader.clone().ok_or(Error::Inactive)?;
        let samples = reader.read(Mode::Blocking)?.into_owned();
        if samples.is_empty() && samples.eof {
            self.finish(&reader);
        }
        Ok(samples)
    }

    /// Asynchronous version of [`read`][Self::read].
    pub fn samples(&self) -> Result<SampleStream<'_, T>> {
        let reader = self.session().reader.clone().ok_or(Error::Inactive)?;
        Ok(SampleStream::new(self, reader))
    }

    // Runs `f` under the spin lock from ordinary context, with the timer's
    // signal blocked so its handler cannot spin on this thread's lock.
    fn with_recorder<R>(&self, f: impl FnOnce(&mut Recorder) -> R) -> R {
        let _mask = SigBlock::new(self.timer.signal());
        let mut rec = self.recorder.lock();
        f(&mut rec)
    }
}
