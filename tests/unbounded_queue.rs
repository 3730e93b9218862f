// Tests for the chunked unbounded MPSC queue
//
// cargo test --test unbounded_queue -- --nocapture

use mtq_events::{unbounded, unbounded_with_source, FixedBufferPool, QueueConfig};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use serial_test::serial;

mod common;

#[test]
fn test_single_thread_order_across_chunks() {
    let (tx, mut rx) = unbounded::<char>(QueueConfig::new().with_slots_per_chunk(4)).unwrap();
    for c in ['A', 'B', 'C', 'D', 'E'] {
        tx.send(c);
    }
    // Five items in four-slot chunks need a second chunk.
    assert_eq!(rx.live_chunks(), 2);

    let got: Vec<char> = std::iter::from_fn(|| rx.dequeue().map(|c| *c)).collect();
    assert_eq!(got, vec!['A', 'B', 'C', 'D', 'E']);
    assert!(rx.dequeue().is_none());
}

#[test]
fn test_dequeue_on_empty_has_no_side_effects() {
    let (tx, mut rx) = unbounded::<u32>(QueueConfig::default()).unwrap();
    println!("Empty queue: {:?}", rx);
    for _ in 0..3 {
        assert!(rx.dequeue().is_none());
    }
    assert_eq!(rx.enqueued(), 0);
    assert_eq!(rx.live_chunks(), 1);

    tx.send(1);
    assert_eq!(rx.dequeue().map(|v| *v), Some(1));
    assert!(rx.dequeue().is_none());
    assert_eq!(rx.enqueued(), 1);
}

#[test]
fn test_drain_refill_keeps_live_chunks_bounded() {
    let (tx, mut rx) = unbounded::<u64>(QueueConfig::new().with_slots_per_chunk(4)).unwrap();
    let mut next = 0u64;
    let mut expected = 0u64;
    let mut peak = 0;

    for cycle in 0..200 {
        for _ in 0..100 {
            tx.send(next);
            next += 1;
        }
        peak = peak.max(rx.live_chunks());
        while let Some(value) = rx.dequeue() {
            assert_eq!(*value, expected);
            expected += 1;
        }
        assert_eq!(expected, next);
        assert!(
            rx.live_chunks() <= 3,
            "cycle {}: {} chunks still live after drain",
            cycle,
            rx.live_chunks()
        );
    }
    println!("Peak live chunks: {}", peak);
    assert!(peak <= 100 / 4 + 3);
}

#[test]
fn test_undelivered_items_are_dropped_with_the_queue() {
    let marker = Arc::new(());
    let (tx, rx) = unbounded::<Arc<()>>(QueueConfig::new().with_slots_per_chunk(2)).unwrap();
    for _ in 0..9 {
        tx.send(Arc::clone(&marker));
    }
    assert_eq!(Arc::strong_count(&marker), 10);
    drop(rx);
    assert_eq!(Arc::strong_count(&marker), 10);
    drop(tx);
    assert_eq!(Arc::strong_count(&marker), 1);
}

#[test]
fn test_pool_backed_chunks_return_to_the_pool() {
    let pool = Arc::new(FixedBufferPool::new(4, 512).unwrap());
    {
        let (tx, mut rx) = unbounded_with_source::<u32, _>(Arc::clone(&pool)).unwrap();
        let slots = rx.slots_per_chunk();
        assert!(slots > 1);

        for round in 0..20u32 {
            for i in 0..(slots as u32 * 2) {
                tx.send(round * 1000 + i);
            }
            let mut count = 0;
            while rx.dequeue().is_some() {
                count += 1;
            }
            assert_eq!(count, slots * 2);
        }
        println!("Queue: {:?}", rx);
    }
    println!("Pool after queue drop: {:?}", pool);
    assert_eq!(pool.cached_blocks(), 4);
    // Warm pool, short chain: nothing should have needed the heap.
    assert_eq!(pool.heap_fallbacks(), 0);
}

fn run_producers(producers: usize, per_producer: u64, slots_per_chunk: usize) {
    let (tx, mut rx) = unbounded::<(usize, u64)>(QueueConfig::new().with_slots_per_chunk(slots_per_chunk)).unwrap();
    let barrier = Arc::new(Barrier::new(producers + 1));
    let finished = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..producers)
        .map(|p| {
            let tx = tx.clone();
            let barrier = Arc::clone(&barrier);
            let finished = Arc::clone(&finished);
            thread::spawn(move || {
                barrier.wait();
                for seq in 0..per_producer {
                    tx.send((p, seq));
                    if fastrand::u8(..32) == 0 {
                        thread::yield_now();
                    }
                }
                finished.fetch_add(1, Ordering::Release);
            })
        })
        .collect();
    drop(tx);

    barrier.wait();
    let total = producers as u64 * per_producer;
    let mut last_seen: Vec<Option<u64>> = vec![None; producers];
    let mut seen = HashSet::with_capacity(total as usize);
    let mut received = 0u64;
    let mut max_chunks = 0;

    while received < total {
        match rx.dequeue() {
            Some(item) => {
                let (p, seq) = *item;
                assert!(seen.insert((p, seq)), "duplicate item {:?}", (p, seq));
                if let Some(prev) = last_seen[p] {
                    assert!(seq > prev, "producer {} went from {} to {}", p, prev, seq);
                }
                last_seen[p] = Some(seq);
                received += 1;
            }
            None => {
                max_chunks = max_chunks.max(rx.live_chunks());
                thread::yield_now();
            }
        }
    }

    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(finished.load(Ordering::Acquire), producers);
    assert!(rx.dequeue().is_none());
    assert_eq!(rx.enqueued(), total);
    println!(
        "{} producers x {} items, {} slots per chunk: max live chunks while idle {}, live at end {}",
        producers,
        per_producer,
        slots_per_chunk,
        max_chunks,
        rx.live_chunks()
    );
}

#[test]
#[serial]
fn test_four_producers_exactly_once_in_producer_order() {
    run_producers(4, 25_000, 16);
}

#[test]
#[serial]
fn test_many_producers_tiny_chunks() {
    // Two-slot chunks force constant chain extension races.
    run_producers(8, 5_000, 2);
}

#[test]
#[serial]
fn test_producers_and_consumer_on_pool_chunks() {
    const PRODUCERS: usize = 4;
    const PER_PRODUCER: usize = 10_000;

    let pool = Arc::new(FixedBufferPool::new(8, 4080).unwrap());
    let (tx, mut rx) = unbounded_with_source::<usize, _>(Arc::clone(&pool)).unwrap();

    let handles: Vec<_> = (0..PRODUCERS)
        .map(|p| {
            let tx = tx.clone();
            thread::spawn(move || {
                for i in 0..PER_PRODUCER {
                    tx.send(p * PER_PRODUCER + i);
                }
            })
        })
        .collect();

    let mut seen = vec![false; PRODUCERS * PER_PRODUCER];
    let mut received = 0;
    while received < seen.len() {
        if let Some(value) = rx.dequeue() {
            assert!(!seen[*value]);
            seen[*value] = true;
            received += 1;
        }
    }
    for handle in handles {
        handle.join().unwrap();
    }
    assert!(seen.iter().all(|&s| s));
}

#[test]
#[serial]
fn test_slow_producers_on_small_pool_blocks() {
    const PRODUCERS: usize = 6;
    const PER_PRODUCER: u64 = 3_000;

    // 96 byte blocks: a handful of slots per chunk and of skipped slots per
    // skip block, so both chains turn over constantly.
    let pool = Arc::new(FixedBufferPool::new(8, 96).unwrap());
    let (tx, mut rx) = unbounded_with_source::<(usize, u64), _>(Arc::clone(&pool)).unwrap();
    let barrier = Arc::new(Barrier::new(PRODUCERS + 1));

    let handles: Vec<_> = (0..PRODUCERS)
        .map(|p| {
            let tx = tx.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for seq in 0..PER_PRODUCER {
                    let reserved = tx.reserve();
                    if fastrand::u8(..8) == 0 {
                        thread::yield_now();
                    }
                    reserved.publish(Box::new((p, seq)));
                }
            })
        })
        .collect();
    drop(tx);

    barrier.wait();
    let total = PRODUCERS as u64 * PER_PRODUCER;
    let mut last_seen: Vec<Option<u64>> = vec![None; PRODUCERS];
    let mut received = 0u64;
    let mut max_pending = 0;

    while received < total {
        match rx.dequeue() {
            Some(item) => {
                let (p, seq) = *item;
                let expected = last_seen[p].map_or(0, |prev| prev + 1);
                assert_eq!(seq, expected, "producer {} out of order", p);
                last_seen[p] = Some(seq);
                received += 1;
            }
            None => {
                max_pending = max_pending.max(rx.pending_slots());
                thread::yield_now();
            }
        }
    }

    for handle in handles {
        handle.join().unwrap();
    }
    assert!(rx.dequeue().is_none());
    assert_eq!(rx.pending_slots(), 0);
    println!(
        "Most slots pending at once: {}, pool: {:?}",
        max_pending, pool
    );
}

#[test]
fn test_unpublished_reservation_aborts() {
    if common::in_abort_child() {
        let (tx, _rx) = unbounded::<u32>(QueueConfig::default()).unwrap();
        drop(tx.reserve());
        return;
    }
    assert!(!common::child_exits_cleanly("test_unpublished_reservation_aborts"));
}
