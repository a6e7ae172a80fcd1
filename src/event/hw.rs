/// Generalized hardware events.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Hardware {
    CpuCycle,
    Instr,
    CacheAccess,
    CacheMiss,
    BranchInstr,
    BranchMiss,
}

impl Hardware {
    // https://github.com/torvalds/linux/blob/v6.13/include/uapi/linux/perf_event.h#L54
    pub(super) fn as_config(&self) -> u64 {
        match self {
            Self::CpuCycle => 0,
            Self::Instr => 1,
            Self::CacheAccess => 2,
            Self::CacheMiss => 3,
            Self::BranchInstr => 4,
            Self::BranchMiss => 5,
        }
    }
}

super::from!(Hardware);
