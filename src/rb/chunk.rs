use std::borrow::Cow;
use std::sync::atomic::Ordering;

use super::{Reader, Tag};

/// Copy-on-write chunk of whole records.
///
/// This type holds a reference to the underlying ring data, so it is
/// necessary to drop this type as early as possible to avoid the writer
/// running out of space.
pub struct Chunk<'a> {
    pub(super) rb: &'a Reader,
    pub(super) data: Cow<'a, [u64]>,
    pub(super) tags: Cow<'a, [Option<Tag>]>,
    pub(super) new_tail: u64,
    pub(super) new_tag_tail: u64,
    pub(super) eof: bool,
}

impl Chunk<'_> {
    pub fn data(&self) -> &[u64] {
        &self.data
    }

    /// One tag per record, in record order.
    pub fn tags(&self) -> &[Option<Tag>] {
        &self.tags
    }

    /// The log was closed and everything before this chunk has been read.
    pub fn eof(&self) -> bool {
        self.eof
    }

    pub fn records(&self) -> Records<'_> {
        Records::new(&self.data, &self.tags, self.rb.hdr_size())
    }

    /// Copies the chunk out and gives its space back to the writer.
    pub fn into_owned(self) -> Samples {
        Samples {
            data: self.data.to_vec(),
            tags: self.tags.to_vec(),
            hdr_size: self.rb.hdr_size(),
            eof: self.eof,
        }
    }
}

impl Drop for Chunk<'_> {
    fn drop(&mut self) {
        let rb = &*self.rb.0;
        rb.data_tail.store(self.new_tail, Ordering::Release);
        rb.tag_tail.store(self.new_tag_tail, Ordering::Release);
        rb.reading.store(false, Ordering::Release);
    }
}

/// Owned records read from the log.
#[derive(Clone, Debug, Default)]
pub struct Samples {
    pub data: Vec<u64>,
    pub tags: Vec<Option<Tag>>,
    pub hdr_size: usize,
    pub eof: bool,
}

impl Samples {
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn records(&self) -> Records<'_> {
        Records::new(&self.data, &self.tags, self.hdr_size)
    }
}

/// A record as stored in the log.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RawRecord<'a> {
    pub timestamp: u64,
    pub header: &'a [u64],
    pub stack: &'a [u64],
    pub tag: Option<Tag>,
}

/// Iterator over the records of a chunk.
pub struct Records<'a> {
    data: &'a [u64],
    tags: &'a [Option<Tag>],
    hdr_size: usize,
}

impl<'a> Records<'a> {
    fn new(data: &'a [u64], tags: &'a [Option<Tag>], hdr_size: usize) -> Self {
        Self {
            data,
            tags,
            hdr_size,
        }
    }
}

impl<'a> Iterator for Records<'a> {
    type Item = RawRecord<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let (&len, _) = self.data.split_first()?;
        let len = len as usize;
        // A well-formed record is never shorter than its fixed part.
        if len < 2 + self.hdr_size || len > self.data.len() {
            self.data = &[];
            return None;
        }

        let (record, rest) = self.data.split_at(len);
        let (tag, tags) = match self.tags.split_first() {
            Some((&tag, tags)) => (tag, tags),
            None => (None, self.tags),
        };
        self.data = rest;
        self.tags = tags;

        Some(RawRecord {
            timestamp: record[1],
            header: &record[2..2 + self.hdr_size],
            stack: &record[2 + self.hdr_size..],
            tag,
        })
    }
}
