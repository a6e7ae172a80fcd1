use super::sentinel::{loss_reason, lost_busy, lost_external};
use super::{LossReason, Parser, Record};
use crate::rb::RawRecord;

fn raw<'a>(timestamp: u64, header: &'a [u64], stack: &'a [u64]) -> RawRecord<'a> {
    RawRecord {
        timestamp,
        header,
        stack,
        tag: None,
    }
}

#[test]
fn test_sentinels_are_distinct() {
    let [a, b] = lost_external();
    let [c, d] = lost_busy();
    let mut all = vec![a, b, c, d];
    all.sort();
    all.dedup();
    assert_eq!(all.len(), 4);
}

#[test]
fn test_loss_reason() {
    let ext = lost_external().map(|pc| pc as u64);
    let busy = lost_busy().map(|pc| pc as u64);
    assert_eq!(loss_reason(&ext), Some(LossReason::ExternalCode));
    assert_eq!(loss_reason(&busy), Some(LossReason::WriterBusy));
    assert_eq!(loss_reason(&ext[..1]), None);
    assert_eq!(loss_reason(&[1, 2]), None);
}

#[test]
fn test_parse_stream() {
    let ext = lost_external().map(|pc| pc as u64);
    let mut parser = Parser::new();

    assert_eq!(parser.parse(&raw(9, &[250], &[])), Record::Rate(250));

    let Record::Sample(s) = parser.parse(&raw(10, &[1], &[3, 2, 1])) else {
        panic!("not a sample");
    };
    assert_eq!(s.timestamp, 10);
    assert_eq!(s.count, 1);
    assert_eq!(s.stack.as_slice(), &[3, 2, 1]);

    assert_eq!(
        parser.parse(&raw(0, &[4], &ext)),
        Record::Lost {
            reason: LossReason::ExternalCode,
            count: 4
        }
    );
    assert_eq!(
        parser.parse(&raw(11, &[0], &[17])),
        Record::Lost {
            reason: LossReason::LogFull,
            count: 17
        }
    );
}

#[test]
fn test_parse_truncates_stack() {
    let mut parser = Parser::new();
    parser.parse(&raw(0, &[100], &[]));
    let stack: Vec<u64> = (0..100).collect();
    let Record::Sample(s) = parser.parse(&raw(1, &[1], &stack)) else {
        panic!("not a sample");
    };
    assert_eq!(s.stack.len(), crate::MAX_STACK);
}
