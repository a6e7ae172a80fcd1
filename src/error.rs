use std::io;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned to callers in ordinary context.
///
/// Failures inside the interrupt path are never returned: they are counted
/// and show up as lost-samples records in the profile, see
/// [`LossReason`][crate::record::LossReason].
#[derive(Debug, Error)]
pub enum Error {
    /// The sampling rate is 0 after clamping.
    #[error("invalid sampling rate: {0}")]
    InvalidRate(i64),

    /// The previous profile has not been fully read yet.
    #[error("cannot set cpu profile rate until previous profile has finished")]
    AlreadyActive,

    /// No profile is being recorded or waiting to be read.
    #[error("profiling is not active")]
    Inactive,

    /// Another reader is draining the log.
    #[error("the profile log already has a reader")]
    ReaderBusy,

    /// A buffer size cannot be used.
    #[error("invalid buffer capacity: {0}")]
    Capacity(&'static str),

    /// The interrupt source could not be armed.
    #[error("timer: {0}")]
    Timer(#[from] io::Error),
}
