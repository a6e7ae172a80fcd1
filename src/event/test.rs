use super::{CpuEvent, EventConfig, Hardware, Raw};

#[test]
fn test_os_timer_has_no_perf_config() {
    let event = CpuEvent::default();
    assert!(!event.is_pmu());
    assert_eq!(event.perf_config(), None);
}

#[test]
fn test_from_hardware() {
    let event = CpuEvent::from(Hardware::BranchMiss);
    assert!(event.is_pmu());
    assert_eq!(event.perf_config(), Some(EventConfig { ty: 0, config: 5 }));
}

#[test]
fn test_from_raw() {
    let event: CpuEvent = Raw { config: 0x1c2 }.into();
    assert_eq!(event.perf_config(), Some(EventConfig { ty: 4, config: 0x1c2 }));
}
