// Tests for the intrusive tail swap MPSC queue
//
// cargo test --test tail_swap -- --nocapture

use mtq_events::tail_swap;
use std::sync::{Arc, Barrier};
use std::thread;
use serial_test::serial;

#[test]
fn test_empty_queue() {
    let (_tx, mut rx) = tail_swap::<String>();
    assert!(rx.dequeue().is_none());
    assert!(rx.dequeue().is_none());
}

#[test]
#[serial]
fn test_producers_exactly_once_in_producer_order() {
    const PRODUCERS: usize = 6;
    const PER_PRODUCER: u32 = 20_000;

    let (tx, mut rx) = tail_swap::<(usize, u32)>();
    let barrier = Arc::new(Barrier::new(PRODUCERS));

    let handles: Vec<_> = (0..PRODUCERS)
        .map(|p| {
            let tx = tx.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for seq in 0..PER_PRODUCER {
                    tx.enqueue((p, seq));
                    if fastrand::u8(..64) == 0 {
                        thread::yield_now();
                    }
                }
            })
        })
        .collect();
    drop(tx);

    let mut next = vec![0u32; PRODUCERS];
    let mut received = 0usize;
    while received < PRODUCERS * PER_PRODUCER as usize {
        match rx.dequeue() {
            Some((p, seq)) => {
                assert_eq!(seq, next[p], "producer {} out of order", p);
                next[p] += 1;
                received += 1;
            }
            None => thread::yield_now(),
        }
    }

    for handle in handles {
        handle.join().unwrap();
    }
    assert!(rx.dequeue().is_none());
    assert!(next.iter().all(|&n| n == PER_PRODUCER));
}
