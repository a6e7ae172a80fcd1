use std::sync::atomic::{AtomicU64, Ordering};

use crate::rb::Writer;
use crate::record::sentinel;

/// State shared with the interrupt path, guarded by the profiler spin lock.
///
/// An installed writer means profiling is on.
pub(super) struct Recorder {
    pub writer: Option<Writer>,
    pub extra: Extra,
}

impl Recorder {
    pub const fn new() -> Self {
        Self {
            writer: None,
            extra: Extra::new(),
        }
    }
}

/// Stacks from threads that cannot write to the log themselves.
///
/// Entries are stored back to back as `[1 + n, pc0, .., pcn-1]` in a buffer
/// allocated when profiling starts. They are moved into the log the next
/// time a thread that can write takes a sample, or when profiling stops.
#[derive(Default)]
pub(super) struct Extra {
    buf: Vec<usize>,
    len: usize,
    // Stacks dropped because `buf` was full.
    lost: u64,
}

impl Extra {
    pub const fn new() -> Self {
        Self {
            buf: Vec::new(),
            len: 0,
            lost: 0,
        }
    }

    pub fn with_capacity(words: usize) -> Self {
        Self {
            buf: vec![0; words],
            len: 0,
            lost: 0,
        }
    }

    /// Appends a stack, or counts it as lost if it does not fit whole.
    pub fn push(&mut self, stk: &[usize]) -> bool {
        let n = stk.len() + 1;
        if self.buf.len() - self.len < n {
            self.lost += 1;
            return false;
        }
        self.buf[self.len] = n;
        self.buf[self.len + 1..self.len + n].copy_from_slice(stk);
        self.len += n;
        true
    }

    pub fn is_pending(&self) -> bool {
        self.len > 0 || self.lost > 0
    }
}

/// Writes deferred stacks, then one record per non-zero loss counter.
///
/// Deferred stacks were not timed, so they carry timestamp 0.
pub(super) fn flush(writer: &mut Writer, extra: &mut Extra, busy: &AtomicU64) {
    let mut i = 0;
    while i < extra.len {
        let n = extra.buf[i];
        writer.write(None, 0, &[1], &extra.buf[i + 1..i + n]);
        i += n;
    }
    extra.len = 0;

    if extra.lost > 0 {
        writer.write(None, 0, &[extra.lost], &sentinel::lost_external());
        extra.lost = 0;
    }

    let busy = busy.swap(0, Ordering::Relaxed);
    if busy > 0 {
        writer.write(None, 0, &[busy], &sentinel::lost_busy());
    }
}
