//! Classification of raw log records for profile formatters.

use arrayvec::ArrayVec;

use crate::rb::{RawRecord, Tag};
use crate::MAX_STACK;

pub mod sentinel;
#[cfg(test)]
mod test;

/// Why samples were counted instead of recorded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LossReason {
    /// The overflow buffer for threads without a runtime context was full.
    ExternalCode,
    /// The interrupted thread could not write safely at that moment.
    WriterBusy,
    /// The log was full because the reader did not keep up.
    LogFull,
}

/// One sampled stack.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Sample {
    /// Monotonic nanoseconds, 0 if the sample was deferred and not timed.
    pub timestamp: u64,
    /// How many times this stack was observed.
    pub count: u64,
    pub tag: Option<Tag>,
    /// Instruction addresses, innermost first.
    pub stack: ArrayVec<u64, MAX_STACK>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Record {
    /// The sampling rate in Hz, always the first record of a profile.
    Rate(u64),
    Sample(Sample),
    Lost { reason: LossReason, count: u64 },
}

/// Stateful record parser, one per profile.
#[derive(Clone, Debug, Default)]
pub struct Parser {
    rate_seen: bool,
}

impl Parser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse(&mut self, raw: &RawRecord<'_>) -> Record {
        let hdr = raw.header.first().copied().unwrap_or(0);

        if !self.rate_seen {
            self.rate_seen = true;
            return Record::Rate(hdr);
        }

        if hdr == 0 && raw.stack.len() == 1 {
            return Record::Lost {
                reason: LossReason::LogFull,
                count: raw.stack[0],
            };
        }
        if let Some(reason) = sentinel::loss_reason(raw.stack) {
            return Record::Lost { reason, count: hdr };
        }

        Record::Sample(Sample {
            timestamp: raw.timestamp,
            count: hdr,
            tag: raw.tag,
            stack: raw.stack.iter().copied().take(MAX_STACK).collect(),
        })
    }
}
