use std::num::NonZeroUsize;
use std::thread;
use std::time::Duration;

use super::{open, Mode, RawRecord, Tag};
use crate::error::Error;

fn tag(n: usize) -> Option<Tag> {
    NonZeroUsize::new(n).map(Tag)
}

#[test]
fn test_open_too_small() {
    assert!(matches!(open(1, 3, 8), Err(Error::Capacity(_))));
    assert!(matches!(open(1, 64, 0), Err(Error::Capacity(_))));
}

#[test]
fn test_write_read_in_order() {
    let (mut w, r) = open(1, 64, 8).unwrap();
    assert!(w.write(tag(7), 100, &[1], &[0xa, 0xb, 0xc]));
    assert!(w.write(None, 200, &[1], &[0xd]));

    let chunk = r.read(Mode::NonBlocking).unwrap();
    assert!(!chunk.eof());
    assert_eq!(chunk.tags(), &[tag(7), None]);
    let records: Vec<_> = chunk.records().collect();
    assert_eq!(
        records,
        vec![
            RawRecord {
                timestamp: 100,
                header: &[1],
                stack: &[0xa, 0xb, 0xc],
                tag: tag(7),
            },
            RawRecord {
                timestamp: 200,
                header: &[1],
                stack: &[0xd],
                tag: None,
            },
        ]
    );
    drop(chunk);

    let chunk = r.read(Mode::NonBlocking).unwrap();
    assert!(chunk.data().is_empty());
    assert!(!chunk.eof());
}

#[test]
fn test_header_is_padded() {
    let (mut w, r) = open(2, 64, 8).unwrap();
    assert!(w.write(None, 1, &[5], &[]));
    let samples = r.read(Mode::NonBlocking).unwrap().into_owned();
    let record = samples.records().next().unwrap();
    assert_eq!(record.header, &[5, 0]);
    assert!(record.stack.is_empty());
}

#[test]
fn test_overflow_record_before_next_write() {
    // Two 3-frame records fill the ring exactly.
    let (mut w, r) = open(1, 12, 8).unwrap();
    assert!(w.write(None, 1, &[1], &[1, 2, 3]));
    assert!(w.write(None, 2, &[1], &[1, 2, 3]));
    assert!(!w.write(None, 3, &[1], &[1, 2, 3]));
    assert!(!w.write(None, 4, &[1], &[1, 2, 3]));
    assert_eq!(w.overflow(), 2);

    assert_eq!(r.read(Mode::NonBlocking).unwrap().records().count(), 2);

    assert!(w.write(None, 5, &[1], &[4, 5, 6]));
    assert_eq!(w.overflow(), 0);

    let samples = r.read(Mode::NonBlocking).unwrap().into_owned();
    let records: Vec<_> = samples.records().collect();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].timestamp, 3);
    assert_eq!(records[0].header, &[0]);
    assert_eq!(records[0].stack, &[2]);
    assert_eq!(records[1].timestamp, 5);
    assert_eq!(records[1].stack, &[4, 5, 6]);
}

#[test]
fn test_overflow_reported_at_eof() {
    let (mut w, r) = open(1, 12, 8).unwrap();
    assert!(w.write(None, 1, &[1], &[1, 2, 3]));
    assert!(w.write(None, 2, &[1], &[1, 2, 3]));
    assert!(!w.write(None, 3, &[1], &[1, 2, 3]));
    w.close();
    assert!(!w.write(None, 4, &[1], &[1]));

    let chunk = r.read(Mode::Blocking).unwrap();
    assert_eq!(chunk.records().count(), 2);
    assert!(!chunk.eof());
    drop(chunk);

    let samples = r.read(Mode::Blocking).unwrap().into_owned();
    let lost: Vec<_> = samples.records().collect();
    assert_eq!(lost.len(), 1);
    assert_eq!(lost[0].header, &[0]);
    assert_eq!(lost[0].stack, &[1]);
    assert!(!samples.eof);

    let samples = r.read(Mode::Blocking).unwrap().into_owned();
    assert!(samples.is_empty());
    assert!(samples.eof);
}

#[test]
fn test_tag_ring_full() {
    let (mut w, r) = open(1, 256, 2).unwrap();
    assert!(w.write(tag(1), 1, &[1], &[1]));
    assert!(w.write(tag(2), 2, &[1], &[1]));
    assert!(!w.write(tag(3), 3, &[1], &[1]));
    assert_eq!(w.overflow(), 1);

    let samples = r.read(Mode::NonBlocking).unwrap().into_owned();
    assert_eq!(samples.tags, vec![tag(1), tag(2)]);
}

#[test]
fn test_wrap_around() {
    // 4-word records in a 10-word ring wrap every few writes.
    let (mut w, r) = open(1, 10, 3).unwrap();
    for i in 0..100_u64 {
        assert!(w.write(tag(i as usize + 1), i, &[1], &[i as usize]));
        assert!(w.write(None, i, &[1], &[i as usize + 1]));

        let mut seen = vec![];
        loop {
            let chunk = r.read(Mode::NonBlocking).unwrap();
            if chunk.data().is_empty() {
                break;
            }
            seen.extend(chunk.records().map(|it| (it.stack[0], it.tag)));
        }
        assert_eq!(seen, vec![(i, tag(i as usize + 1)), (i + 1, None)]);
    }
}

#[test]
fn test_record_larger_than_ring() {
    let (mut w, _r) = open(1, 8, 8).unwrap();
    assert!(!w.write(None, 1, &[1], &[0; 6]));
    assert_eq!(w.overflow(), 1);
}

#[test]
fn test_blocking_read_wakes_on_write() {
    let (mut w, r) = open(1, 64, 8).unwrap();
    let handle = thread::spawn(move || {
        thread::sleep(Duration::from_millis(20));
        assert!(w.write(None, 1, &[1], &[42]));
        thread::sleep(Duration::from_millis(20));
        w.close();
    });

    let samples = r.read(Mode::Blocking).unwrap().into_owned();
    assert_eq!(samples.records().next().unwrap().stack, &[42]);

    let samples = r.read(Mode::Blocking).unwrap().into_owned();
    assert!(samples.is_empty());
    assert!(samples.eof);
    handle.join().unwrap();
}

#[test]
fn test_dropped_writer_closes() {
    let (w, r) = open(1, 64, 8).unwrap();
    drop(w);
    assert!(r.read(Mode::Blocking).unwrap().eof());
}

#[test]
fn test_single_reader() {
    let (mut w, r) = open(1, 64, 8).unwrap();
    assert!(w.write(None, 1, &[1], &[1]));
    let chunk = r.read(Mode::NonBlocking).unwrap();
    assert!(matches!(r.read(Mode::NonBlocking), Err(Error::ReaderBusy)));
    drop(chunk);
    assert!(r.read(Mode::NonBlocking).is_ok());
}
