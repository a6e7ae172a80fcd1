use crate::event::CpuEvent;

#[cfg(test)]
mod test;

/// Highest accepted sampling rate, in samples per second.
pub const MAX_HZ: i64 = 1_000_000;

/// Sampling options.
///
/// Only [`hz`][Self::hz] and [`buffer`][Self::buffer] are used by the
/// profiler itself, the remaining fields are passed through to the
/// [timer][crate::timer::Timer] that arms the interrupt source.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Opts {
    /// Samples per second, clamped to `[0, MAX_HZ]`.
    ///
    /// Defaults to 100.
    pub hz: i64,

    /// Sample on every N event counts instead of a rate.
    ///
    /// Only meaningful for PMU events, `0` means use [`hz`][Self::hz].
    pub period: u64,

    pub event: CpuEvent,
    pub skid: SampleSkid,
    pub include: Include,
    pub sample_format: SampleFormat,
    pub buffer: BufferOpts,
}

impl Default for Opts {
    fn default() -> Self {
        Self {
            hz: 100,
            period: 0,
            event: CpuEvent::default(),
            skid: SampleSkid::default(),
            include: Include::default(),
            sample_format: SampleFormat::default(),
            buffer: BufferOpts::default(),
        }
    }
}

impl Opts {
    /// The effective rate after clamping.
    pub fn clamped_hz(&self) -> u32 {
        self.hz.clamp(0, MAX_HZ) as u32
    }
}

/// Controls the amount of sample skid.
///
/// Skid is how many instructions execute between an event of interest
/// happening and the interrupt being delivered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SampleSkid {
    /// Can have arbitrary skid.
    #[default]
    Arbitrary,
    /// Must have constant skid.
    Const,
    /// Requested to have 0 skid.
    ReqZero,
    /// Must have 0 skid.
    Zero,
}

impl SampleSkid {
    pub fn as_precise_ip(&self) -> u8 {
        match self {
            Self::Arbitrary => 0,
            Self::Const => 1,
            Self::ReqZero => 2,
            Self::Zero => 3,
        }
    }
}

/// Execution modes counted by PMU events.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Include {
    /// Kernel mode.
    pub kernel: bool,

    /// Hypervisor mode.
    pub hv: bool,

    /// Idle task.
    pub idle: bool,
}

/// What a PMU sample carries.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SampleFormat {
    /// Instruction pointer that caused the sample.
    pub ip: bool,
    /// Thread ID.
    pub tid: bool,
    /// Memory address accessed at sample time.
    pub addr: bool,
    /// Entire call chain.
    pub call_chain: bool,
    /// Kernel part of the call chain.
    pub call_chain_kernel: bool,
    /// User part of the call chain.
    pub call_chain_user: bool,
}

/// Sizes of the buffers allocated when profiling starts.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BufferOpts {
    /// Words in the record log.
    pub data_words: usize,

    /// Tags in the record log, one per record.
    pub tag_slots: usize,

    /// Words holding stacks from threads that cannot write to the log.
    ///
    /// Each stack takes its length plus one word.
    pub extra_words: usize,
}

impl Default for BufferOpts {
    fn default() -> Self {
        Self {
            data_words: 1 << 17,
            tag_slots: 1 << 14,
            // Non-runtime threads rarely get more than a two-frame stack, so
            // 100 Hz fills about 300 words per second.
            extra_words: 1000,
        }
    }
}
