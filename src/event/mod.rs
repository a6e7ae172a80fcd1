pub mod hw;
pub mod raw;

pub use hw::Hardware;
pub use raw::Raw;

#[cfg(test)]
mod test;

/// What drives the sampling interrupts.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CpuEvent {
    /// Process CPU-time interval timer.
    #[default]
    OsTimer,
    /// Generalized hardware counter.
    Hardware(Hardware),
    /// Implementation-specific counter.
    Raw(Raw),
}

impl CpuEvent {
    /// Whether the event needs a performance monitoring unit.
    pub fn is_pmu(&self) -> bool {
        !matches!(self, Self::OsTimer)
    }

    /// The `(type, config)` pair a `perf_event_open` based source arms with.
    ///
    /// Returns `None` for the OS timer.
    pub fn perf_config(&self) -> Option<EventConfig> {
        match self {
            Self::OsTimer => None,
            Self::Hardware(hw) => Some(EventConfig {
                ty: PERF_TYPE_HARDWARE,
                config: hw.as_config(),
            }),
            Self::Raw(raw) => Some(EventConfig {
                ty: PERF_TYPE_RAW,
                config: raw.config,
            }),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EventConfig {
    pub ty: u32,
    pub config: u64,
}

// https://github.com/torvalds/linux/blob/v6.13/include/uapi/linux/perf_event.h#L32
const PERF_TYPE_HARDWARE: u32 = 0;
const PERF_TYPE_RAW: u32 = 4;

macro_rules! from {
    ($ty:ident) => {
        impl From<$ty> for crate::event::CpuEvent {
            fn from(value: $ty) -> Self {
                Self::$ty(value)
            }
        }
    };
}
use from;
