use super::{Opts, SampleSkid, MAX_HZ};

#[test]
fn test_clamp_hz() {
    let mut opts = Opts::default();
    assert_eq!(opts.clamped_hz(), 100);

    opts.hz = -5;
    assert_eq!(opts.clamped_hz(), 0);

    opts.hz = MAX_HZ + 1;
    assert_eq!(opts.clamped_hz(), 1_000_000);

    opts.hz = i64::MAX;
    assert_eq!(opts.clamped_hz(), 1_000_000);
}

#[test]
fn test_precise_ip() {
    assert_eq!(SampleSkid::default().as_precise_ip(), 0);
    assert_eq!(SampleSkid::Zero.as_precise_ip(), 3);
}
