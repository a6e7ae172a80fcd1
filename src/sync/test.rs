use std::sync::mpsc::channel;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use super::SpinLock;

#[test]
fn test_waits_for_holder() {
    let lock = Arc::new(SpinLock::new(0));
    let mut guard = lock.lock();

    let (tx, rx) = channel();
    let handle = {
        let lock = Arc::clone(&lock);
        thread::spawn(move || {
            let value = *lock.lock();
            tx.send(value).unwrap();
        })
    };

    // Still spinning while the guard is alive.
    assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());
    *guard = 7;
    drop(guard);

    assert_eq!(rx.recv().unwrap(), 7);
    handle.join().unwrap();
}

#[test]
fn test_serializes_writers() {
    let lock = Arc::new(SpinLock::new(0_u64));
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let lock = Arc::clone(&lock);
            thread::spawn(move || {
                for _ in 0..10_000 {
                    *lock.lock() += 1;
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    assert_eq!(*lock.lock(), 40_000);
}
