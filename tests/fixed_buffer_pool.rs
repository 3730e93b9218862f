// Tests for the best-effort fixed buffer pool
//
// cargo test --test fixed_buffer_pool -- --nocapture

use mtq_events::{Block, ConfigError, FixedBufferPool};
use std::sync::{Arc, Barrier};
use std::thread;

mod common;

#[test]
fn test_two_block_pool_hands_out_distinct_blocks() {
    let pool = FixedBufferPool::new(2, 64).unwrap();
    println!("Pool: {:?}", pool);
    assert_eq!(pool.cached_blocks(), 2);

    let first = pool.alloc();
    let second = pool.alloc();
    assert_ne!(first.as_ptr(), second.as_ptr());
    assert_eq!(first.size(), 64);
    assert_eq!(second.size(), 64);
    assert_eq!(pool.cached_blocks(), 0);
    assert_eq!(pool.heap_fallbacks(), 0);

    let first_ptr = first.as_ptr();
    pool.free(first);
    assert_eq!(pool.cached_blocks(), 1);

    let third = pool.alloc();
    assert_eq!(third.as_ptr(), first_ptr);
    assert_ne!(third.as_ptr(), second.as_ptr());

    pool.free(second);
    pool.free(third);
    assert_eq!(pool.cached_blocks(), 2);
}

#[test]
fn test_empty_pool_falls_back_to_heap() {
    let pool = FixedBufferPool::new(1, 128).unwrap();
    let cached = pool.alloc();
    let from_heap = pool.alloc();
    assert_eq!(from_heap.size(), 128);
    assert_eq!(pool.heap_fallbacks(), 1);

    pool.free(cached);
    // The pool is full again, so this one goes back to the heap.
    pool.free(from_heap);
    assert_eq!(pool.heap_fallbacks(), 2);
    assert_eq!(pool.cached_blocks(), 1);
}

#[test]
fn test_zero_sized_pool_always_uses_heap() {
    let pool = FixedBufferPool::new(0, 32).unwrap();
    assert_eq!(pool.capacity(), 0);
    let block = pool.alloc();
    pool.free(block);
    assert_eq!(pool.heap_fallbacks(), 2);
}

#[test]
fn test_invalid_block_size_is_rejected() {
    assert_eq!(FixedBufferPool::new(4, 0).err(), Some(ConfigError::ZeroBlockSize));
}

#[test]
fn test_recycled_block_keeps_alignment() {
    let pool = FixedBufferPool::new(1, 100).unwrap();
    let mut block = pool.alloc();
    block.as_bytes_mut().fill(0x5A);
    pool.free(block);

    let block = pool.alloc();
    assert_eq!(block.as_ptr() as usize % mtq_events::Core::BLOCK_ALIGN, 0);
    assert!(block.as_bytes().iter().all(|&b| b == 0x5A));
}

#[test]
fn test_concurrent_alloc_free_never_shares_a_block() {
    const THREADS: usize = 8;
    const ROUNDS: usize = 5_000;

    let pool = Arc::new(FixedBufferPool::new(4, 256).unwrap());
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let pool = Arc::clone(&pool);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let tag = t as u8 + 1;
                for _ in 0..ROUNDS {
                    let mut held: Vec<Block> = Vec::with_capacity(2);
                    for _ in 0..(1 + fastrand::usize(..2)) {
                        let mut block = pool.alloc();
                        block.as_bytes_mut().fill(tag);
                        held.push(block);
                    }
                    if fastrand::u8(..8) == 0 {
                        thread::yield_now();
                    }
                    for block in held {
                        // Anyone else writing into our block would show here.
                        assert!(block.as_bytes().iter().all(|&b| b == tag));
                        pool.free(block);
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    println!("Pool after stress: {:?}", pool);
    assert!(pool.cached_blocks() <= pool.capacity());
}

#[test]
fn test_freeing_a_foreign_block_aborts() {
    if common::in_abort_child() {
        let pool = FixedBufferPool::new(1, 64).unwrap();
        pool.free(Block::alloc(128));
        return;
    }
    assert!(!common::child_exits_cleanly("test_freeing_a_foreign_block_aborts"));
}
