//! Bounded record log with signal-safe append and a blocking single reader.
//!
//! Records are laid out as `u64` words in a ring:
//!
//! ```text
//! [len, timestamp, header[0..hdr_size], stack...]
//! ```
//!
//! where `len` counts every word of the record. A record never straddles the
//! end of the ring: when it does not fit, the writer stores a `0` length word
//! and continues at the start. Each record also takes exactly one slot in a
//! parallel tag ring.
//!
//! When the ring is full, writes are dropped and counted. The count is
//! reported in a record with a zero header and a one-word stack holding the
//! number of dropped records, emitted before the next successful write or,
//! if none happens, at end-of-stream.

use std::num::NonZeroUsize;
use std::slice;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicUsize, Ordering as MemOrd};
use std::sync::Arc;

pub use chunk::*;

use crate::error::{Error, Result};
use crate::ffi::syscall::{futex_wait, futex_wake};

mod chunk;
#[cfg(test)]
mod test;

/// Opaque attribution tag stored alongside a record.
///
/// The value is chosen by the caller, e.g. the address of a label set that
/// outlives the profile, or an index into a table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct Tag(pub NonZeroUsize);

/// Whether [`Reader::read`] may block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Blocking,
    NonBlocking,
}

struct Inner {
    hdr_size: usize,
    data: Box<[AtomicU64]>,
    tags: Box<[AtomicUsize]>,

    // Positions only grow, the ring index is `pos % len`.
    data_head: AtomicU64,
    data_tail: AtomicU64,
    tag_head: AtomicU64,
    tag_tail: AtomicU64,

    overflow: AtomicU64,
    overflow_time: AtomicU64,
    closed: AtomicBool,

    // Futex word bumped on every publish and on close.
    seq: AtomicU32,
    sleepers: AtomicU32,
    reading: AtomicBool,
}

impl Inner {
    fn notify(&self) {
        self.seq.fetch_add(1, MemOrd::SeqCst);
        if self.sleepers.load(MemOrd::SeqCst) > 0 {
            let _ = futex_wake(&self.seq, i32::MAX);
        }
    }
}

/// Creates a log holding `data_words` words and `tag_slots` tags,
/// with `hdr_size` header words per record.
pub fn open(hdr_size: usize, data_words: usize, tag_slots: usize) -> Result<(Writer, Reader)> {
    // The smallest record is an overflow record: len, time, header, count.
    if data_words < 3 + hdr_size {
        return Err(Error::Capacity("data ring cannot hold a single record"));
    }
    if tag_slots == 0 {
        return Err(Error::Capacity("tag ring is empty"));
    }

    let inner = Arc::new(Inner {
        hdr_size,
        data: (0..data_words).map(|_| AtomicU64::new(0)).collect(),
        tags: (0..tag_slots).map(|_| AtomicUsize::new(0)).collect(),
        data_head: AtomicU64::new(0),
        data_tail: AtomicU64::new(0),
        tag_head: AtomicU64::new(0),
        tag_tail: AtomicU64::new(0),
        overflow: AtomicU64::new(0),
        overflow_time: AtomicU64::new(0),
        closed: AtomicBool::new(false),
        seq: AtomicU32::new(0),
        sleepers: AtomicU32::new(0),
        reading: AtomicBool::new(false),
    });

    Ok((Writer(Arc::clone(&inner)), Reader(inner)))
}

/// Producer side of the log.
///
/// All methods are async-signal-safe: they never allocate and never block.
/// Only one writer exists, and `&mut self` keeps its critical section exclusive;
/// callers sharing it across threads put it behind a [`SpinLock`][crate::sync::SpinLock].
pub struct Writer(Arc<Inner>);

impl Writer {
    /// Appends a record, returns `false` if it was dropped.
    ///
    /// `hdr` is truncated or zero-padded to the header size of the log.
    pub fn write(&mut self, tag: Option<Tag>, timestamp: u64, hdr: &[u64], stk: &[usize]) -> bool {
        let rb = &*self.0;
        if rb.closed.load(MemOrd::Relaxed) {
            return false;
        }

        if !self.put_overflow() {
            self.lose(timestamp);
            return false;
        }
        if self.put(tag, timestamp, hdr, stk.iter().map(|&pc| pc as u64)) {
            true
        } else {
            self.lose(timestamp);
            false
        }
    }

    /// Number of records dropped since the last overflow record.
    pub fn overflow(&self) -> u64 {
        self.0.overflow.load(MemOrd::Relaxed)
    }

    /// Marks the end of the stream and wakes the reader.
    pub fn close(&mut self) {
        let rb = &*self.0;
        if rb.closed.load(MemOrd::Relaxed) {
            return;
        }
        // If there is no room the reader reports the count at end-of-stream.
        self.put_overflow();
        rb.closed.store(true, MemOrd::Release);
        rb.notify();
    }

    fn lose(&self, timestamp: u64) {
        let rb = &*self.0;
        if rb.overflow.fetch_add(1, MemOrd::Relaxed) == 0 {
            rb.overflow_time.store(timestamp, MemOrd::Relaxed);
        }
    }

    // Writes the pending overflow record, if any.
    fn put_overflow(&self) -> bool {
        let rb = &*self.0;
        let count = rb.overflow.load(MemOrd::Relaxed);
        if count == 0 {
            return true;
        }
        let time = rb.overflow_time.load(MemOrd::Relaxed);
        if self.put(None, time, &[], [count].into_iter()) {
            rb.overflow.store(0, MemOrd::Relaxed);
            true
        } else {
            false
        }
    }

    fn put<I>(&self, tag: Option<Tag>, timestamp: u64, hdr: &[u64], stk: I) -> bool
    where
        I: ExactSizeIterator<Item = u64>,
    {
        let rb = &*self.0;
        let len = rb.data.len() as u64;
        let need = (2 + rb.hdr_size + stk.len()) as u64;
        if need > len {
            return false;
        }

        // Thread safe since only this writer moves the heads.
        let head = rb.data_head.load(MemOrd::Relaxed);
        let tail = rb.data_tail.load(MemOrd::Acquire);
        let idx = head % len;
        let skip = if len - idx < need { len - idx } else { 0 };
        if len - (head - tail) < skip + need {
            return false;
        }

        let tag_head = rb.tag_head.load(MemOrd::Relaxed);
        let tag_tail = rb.tag_tail.load(MemOrd::Acquire);
        let tag_len = rb.tags.len() as u64;
        if tag_head - tag_tail >= tag_len {
            return false;
        }

        // Tags are published first, so a reader that observes the data head
        // also observes the tag of every record below it.
        let raw_tag = tag.map_or(0, |Tag(t)| t.get());
        rb.tags[(tag_head % tag_len) as usize].store(raw_tag, MemOrd::Relaxed);
        rb.tag_head.store(tag_head + 1, MemOrd::Release);

        if skip > 0 {
            rb.data[idx as usize].store(0, MemOrd::Relaxed);
        }
        let mut at = ((head + skip) % len) as usize;
        let mut push = |word: u64| {
            rb.data[at].store(word, MemOrd::Relaxed);
            at += 1;
        };
        push(need);
        push(timestamp);
        for i in 0..rb.hdr_size {
            push(hdr.get(i).copied().unwrap_or(0));
        }
        stk.for_each(push);

        rb.data_head.store(head + skip + need, MemOrd::Release);
        rb.notify();
        true
    }
}

impl Drop for Writer {
    fn drop(&mut self) {
        self.close();
    }
}

/// Consumer side of the log.
pub struct Reader(Arc<Inner>);

impl Reader {
    /// Reads the next chunk of whole records.
    ///
    /// In blocking mode this waits until data is available or the log has
    /// been closed and fully drained, in which case the returned chunk is
    /// empty and [`eof`][Chunk::eof] is set. The space of the chunk is given
    /// back to the writer when the chunk is dropped, so it should be dropped
    /// (or [converted][Chunk::into_owned]) as early as possible.
    ///
    /// Only one chunk may be alive at a time; a concurrent call fails with
    /// [`Error::ReaderBusy`].
    pub fn read(&self, mode: Mode) -> Result<Chunk<'_>> {
        let rb = &*self.0;
        if rb.reading.swap(true, MemOrd::Acquire) {
            return Err(Error::ReaderBusy);
        }

        loop {
            let seq = rb.seq.load(MemOrd::SeqCst);
            if let Some(chunk) = self.pop() {
                return Ok(chunk);
            }

            if rb.closed.load(MemOrd::Acquire) {
                // Records written before closing are visible now.
                if let Some(chunk) = self.pop() {
                    return Ok(chunk);
                }
                // The writer is gone, so the counter is ours.
                let lost = rb.overflow.swap(0, MemOrd::Relaxed);
                if lost > 0 {
                    let time = rb.overflow_time.load(MemOrd::Relaxed);
                    return Ok(self.overflow_chunk(time, lost));
                }
                return Ok(self.empty_chunk(true));
            }

            if mode == Mode::NonBlocking {
                return Ok(self.empty_chunk(false));
            }

            rb.sleepers.fetch_add(1, MemOrd::SeqCst);
            // Returns at once if anything was published since `seq` was loaded.
            // Errors can only be `EAGAIN` or `EINTR`, both mean try again.
            let _ = futex_wait(&rb.seq, seq);
            rb.sleepers.fetch_sub(1, MemOrd::SeqCst);
        }
    }

    /// Waits until data is available or the log is closed, without consuming.
    pub fn wait(&self) {
        let rb = &*self.0;
        loop {
            let seq = rb.seq.load(MemOrd::SeqCst);
            let head = rb.data_head.load(MemOrd::Acquire);
            let tail = rb.data_tail.load(MemOrd::Acquire);
            if head != tail || rb.closed.load(MemOrd::Acquire) {
                return;
            }
            rb.sleepers.fetch_add(1, MemOrd::SeqCst);
            let _ = futex_wait(&rb.seq, seq);
            rb.sleepers.fetch_sub(1, MemOrd::SeqCst);
        }
    }

    /// Header words per record.
    pub fn hdr_size(&self) -> usize {
        self.0.hdr_size
    }

    fn pop(&self) -> Option<Chunk<'_>> {
        let rb = &*self.0;
        let len = rb.data.len() as u64;

        // Thread safe since no more threads set the tail.
        let mut tail = rb.data_tail.load(MemOrd::Relaxed);
        let head = rb.data_head.load(MemOrd::Acquire);

        // Skip the padding behind a wrap marker.
        if tail != head && rb.data[(tail % len) as usize].load(MemOrd::Relaxed) == 0 {
            tail += len - tail % len;
            rb.data_tail.store(tail, MemOrd::Release);
        }
        if tail == head {
            return None;
        }

        let idx = (tail % len) as usize;
        let end = idx + (head - tail).min(len - idx as u64) as usize;

        let tag_tail = rb.tag_tail.load(MemOrd::Relaxed);
        let tag_idx = (tag_tail % rb.tags.len() as u64) as usize;
        let tag_room = rb.tags.len() - tag_idx;

        // Take whole records up to the end of the ring, a wrap marker,
        // or the end of the contiguous tag slots.
        let mut at = idx;
        let mut n = 0;
        while at < end && n < tag_room {
            let words = rb.data[at].load(MemOrd::Relaxed) as usize;
            if words == 0 {
                break;
            }
            at += words;
            n += 1;
        }

        // `AtomicU64` has the same in-memory representation as `u64`, and the
        // writer does not touch `[tail, head)` until the tail moves past it.
        let data = unsafe { slice::from_raw_parts(rb.data[idx..].as_ptr() as *const u64, at - idx) };
        // `Option<Tag>` has the same representation as `usize`, 0 being `None`.
        let tags = unsafe {
            slice::from_raw_parts(rb.tags[tag_idx..].as_ptr() as *const Option<Tag>, n)
        };

        Some(Chunk {
            rb: self,
            data: data.into(),
            tags: tags.into(),
            new_tail: tail + (at - idx) as u64,
            new_tag_tail: tag_tail + n as u64,
            eof: false,
        })
    }

    fn empty_chunk(&self, eof: bool) -> Chunk<'_> {
        let rb = &*self.0;
        Chunk {
            rb: self,
            data: Vec::new().into(),
            tags: Vec::new().into(),
            new_tail: rb.data_tail.load(MemOrd::Relaxed),
            new_tag_tail: rb.tag_tail.load(MemOrd::Relaxed),
            eof,
        }
    }

    fn overflow_chunk(&self, time: u64, count: u64) -> Chunk<'_> {
        let hdr_size = self.0.hdr_size;
        let mut data = Vec::with_capacity(3 + hdr_size);
        data.push((3 + hdr_size) as u64);
        data.push(time);
        data.extend((0..hdr_size).map(|_| 0));
        data.push(count);

        let mut chunk = self.empty_chunk(false);
        chunk.data = data.into();
        chunk.tags = vec![None].into();
        chunk
    }
}
